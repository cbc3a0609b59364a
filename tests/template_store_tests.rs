use anyhow::Result;
use notification_service::{
    models::template::{CreateTemplate, UpdateTemplate},
    store::{StoreError, TemplateStore, memory::MemoryTemplateStore},
};

fn welcome_template() -> CreateTemplate {
    CreateTemplate {
        event_type: "user.register".to_string(),
        subject: "Welcome {{name}}".to_string(),
        email_body: "Code: {{otp}}".to_string(),
        inapp_body: "Welcome aboard, {{name}}".to_string(),
    }
}

/// Test: creating a duplicate live event type fails with Conflict
#[tokio::test]
async fn test_create_duplicate_live_event_type_conflicts() -> Result<()> {
    let store = MemoryTemplateStore::new();

    store.create(welcome_template()).await?;
    let result = store.create(welcome_template()).await;

    assert!(matches!(result, Err(StoreError::Conflict(_))));

    Ok(())
}

/// Test: the same event type can be re-created after a soft delete
#[tokio::test]
async fn test_recreate_after_soft_delete_succeeds() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let first = store.create(welcome_template()).await?;
    store.soft_delete(first.id).await?;

    let second = store.create(welcome_template()).await?;
    assert_ne!(first.id, second.id);

    let resolved = store.resolve_by_event_type("user.register").await?;
    assert_eq!(resolved.id, second.id);

    Ok(())
}

/// Test: resolve only sees live templates
#[tokio::test]
async fn test_resolve_excludes_soft_deleted() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let template = store.create(welcome_template()).await?;
    store.soft_delete(template.id).await?;

    let result = store.resolve_by_event_type("user.register").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    Ok(())
}

/// Test: soft delete is not idempotent, the second call is NotFound
#[tokio::test]
async fn test_double_soft_delete_is_not_found() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let template = store.create(welcome_template()).await?;
    store.soft_delete(template.id).await?;

    let result = store.soft_delete(template.id).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    Ok(())
}

/// Test: update is partial and renaming onto a live event type conflicts
#[tokio::test]
async fn test_update_partial_and_rename_conflict() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let welcome = store.create(welcome_template()).await?;
    let reset = store
        .create(CreateTemplate {
            event_type: "user.password_reset".to_string(),
            subject: "Reset your password".to_string(),
            email_body: "Use code {{otp}}".to_string(),
            inapp_body: "Password reset requested".to_string(),
        })
        .await?;

    let updated = store
        .update(
            welcome.id,
            UpdateTemplate {
                subject: Some("Hello {{name}}".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.subject, "Hello {{name}}");
    assert_eq!(updated.email_body, "Code: {{otp}}");

    let rename = store
        .update(
            reset.id,
            UpdateTemplate {
                event_type: Some("user.register".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(rename, Err(StoreError::Conflict(_))));

    Ok(())
}

/// Test: mutating a soft-deleted or unknown template is NotFound
#[tokio::test]
async fn test_update_deleted_template_is_not_found() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let template = store.create(welcome_template()).await?;
    store.soft_delete(template.id).await?;

    let result = store
        .update(
            template.id,
            UpdateTemplate {
                subject: Some("changed".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    Ok(())
}

/// Test: listing only returns live templates
#[tokio::test]
async fn test_list_excludes_soft_deleted() -> Result<()> {
    let store = MemoryTemplateStore::new();

    let welcome = store.create(welcome_template()).await?;
    store
        .create(CreateTemplate {
            event_type: "employer.invite".to_string(),
            subject: "You are invited".to_string(),
            email_body: "Join via {{email}}".to_string(),
            inapp_body: "New invitation".to_string(),
        })
        .await?;

    store.soft_delete(welcome.id).await?;

    let listed = store.list().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].event_type, "employer.invite");

    Ok(())
}
