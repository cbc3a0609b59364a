use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use notification_service::{
    clients::{
        mailer::MailTransport,
        users::{UserDirectory, UserRecord},
    },
    models::{
        delivery::DeliveryStatus,
        template::{CreateTemplate, UpdateTemplate},
    },
    pipeline::{Pipeline, ProcessError},
    store::{
        EmailDeliveryStore, InAppDeliveryStore, NotificationStore, StoreError, TemplateStore,
        memory::{
            MemoryEmailDeliveryStore, MemoryInAppDeliveryStore, MemoryNotificationStore,
            MemoryTemplateStore,
        },
    },
};
use uuid::Uuid;

/// Mail transport stub recording every send; outcome is programmable.
struct StubMailer {
    fail: AtomicBool,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl StubMailer {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for StubMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));

        if self.fail.load(Ordering::SeqCst) {
            Err(anyhow!("smtp relay unavailable"))
        } else {
            Ok(())
        }
    }
}

/// User directory stub: a single known user, optionally erroring.
struct StubUsers {
    user: Option<UserRecord>,
    fail: AtomicBool,
}

impl StubUsers {
    fn with_user(user_id: Uuid, email: &str) -> Self {
        Self {
            user: Some(UserRecord {
                user_id,
                email: email.to_string(),
                full_name: "Test User".to_string(),
            }),
            fail: AtomicBool::new(false),
        }
    }

    fn empty() -> Self {
        Self {
            user: None,
            fail: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for StubUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("user service timeout"));
        }

        Ok(self
            .user
            .as_ref()
            .filter(|u| u.email == email)
            .cloned())
    }
}

struct Harness {
    pipeline: Pipeline,
    templates: Arc<MemoryTemplateStore>,
    notifications: Arc<MemoryNotificationStore>,
    email_deliveries: Arc<MemoryEmailDeliveryStore>,
    in_app_deliveries: Arc<MemoryInAppDeliveryStore>,
    mailer: Arc<StubMailer>,
    users: Arc<StubUsers>,
}

fn harness(users: StubUsers) -> Harness {
    let templates = Arc::new(MemoryTemplateStore::new());
    let notifications = Arc::new(MemoryNotificationStore::new());
    let email_deliveries = Arc::new(MemoryEmailDeliveryStore::new());
    let in_app_deliveries = Arc::new(MemoryInAppDeliveryStore::new());
    let mailer = Arc::new(StubMailer::new());
    let users = Arc::new(users);

    let pipeline = Pipeline::new(
        templates.clone(),
        notifications.clone(),
        email_deliveries.clone(),
        in_app_deliveries.clone(),
        mailer.clone(),
        users.clone(),
    );

    Harness {
        pipeline,
        templates,
        notifications,
        email_deliveries,
        in_app_deliveries,
        mailer,
        users,
    }
}

async fn seed_welcome_template(templates: &MemoryTemplateStore) -> Result<Uuid> {
    let template = templates
        .create(CreateTemplate {
            event_type: "user.register".to_string(),
            subject: "Welcome {{name}}".to_string(),
            email_body: "Code: {{otp}}".to_string(),
            inapp_body: "Welcome aboard, {{name}}".to_string(),
        })
        .await?;

    Ok(template.id)
}

fn register_event() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "email": "a@x.com",
        "event_type": "user.register",
        "name": "A",
        "otp": "123456"
    }))
    .unwrap()
}

/// Test: end-to-end fan-out for a well-formed event with a known user
#[tokio::test]
async fn test_end_to_end_success_flow() -> Result<()> {
    let user_id = Uuid::new_v4();
    let h = harness(StubUsers::with_user(user_id, "a@x.com"));
    let template_id = seed_welcome_template(&h.templates).await?;

    let outcome = h.pipeline.process(&register_event()).await?;

    let notification = h.notifications.get(outcome.notification_id).await?;
    assert_eq!(notification.user_id, Some(user_id));
    assert_eq!(notification.template_id, template_id);
    assert_eq!(notification.event_type, "user.register");
    assert_eq!(notification.payload["otp"], "123456");

    let email = h
        .email_deliveries
        .get(outcome.email_delivery_id.unwrap())
        .await?;
    assert_eq!(email.recipient, "a@x.com");
    assert_eq!(email.subject, "Welcome A");
    assert!(email.body.contains("Code: 123456"));
    assert_eq!(email.status, DeliveryStatus::Success);
    assert_eq!(outcome.email_status, Some(DeliveryStatus::Success));

    let inbox = h.in_app_deliveries.list_for_user(user_id).await?;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].content, "Welcome aboard, A");
    assert!(!inbox[0].is_read);

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@x.com");

    Ok(())
}

/// Test: an unknown event type is dropped without creating any rows
#[tokio::test]
async fn test_unknown_event_type_creates_nothing() -> Result<()> {
    let h = harness(StubUsers::with_user(Uuid::new_v4(), "a@x.com"));

    let result = h.pipeline.process(&register_event()).await;

    assert!(matches!(result, Err(ProcessError::UnknownEventType(_))));
    assert_eq!(h.notifications.count(), 0);
    assert!(h.email_deliveries.list().await?.is_empty());
    assert!(h.mailer.sent().is_empty());

    Ok(())
}

/// Test: a malformed payload is dropped without creating any rows
#[tokio::test]
async fn test_malformed_payload_creates_nothing() -> Result<()> {
    let h = harness(StubUsers::empty());
    seed_welcome_template(&h.templates).await?;

    let result = h.pipeline.process(b"not json at all").await;
    assert!(matches!(result, Err(ProcessError::Malformed(_))));

    let result = h
        .pipeline
        .process(br#"{"event_type": "user.register"}"#)
        .await;
    assert!(matches!(result, Err(ProcessError::Malformed(_))));

    assert_eq!(h.notifications.count(), 0);

    Ok(())
}

/// Test: a mail transport failure is recorded as `fail` and does not block
/// the in-app channel
#[tokio::test]
async fn test_send_failure_recorded_and_in_app_unaffected() -> Result<()> {
    let user_id = Uuid::new_v4();
    let h = harness(StubUsers::with_user(user_id, "a@x.com"));
    seed_welcome_template(&h.templates).await?;
    h.mailer.set_failing(true);

    let outcome = h.pipeline.process(&register_event()).await?;

    let email = h
        .email_deliveries
        .get(outcome.email_delivery_id.unwrap())
        .await?;
    assert_eq!(email.status, DeliveryStatus::Fail);

    let inbox = h.in_app_deliveries.list_for_user(user_id).await?;
    assert_eq!(inbox.len(), 1);

    Ok(())
}

/// Test: a user-lookup failure is tolerated; the email is still attempted
/// and the notification carries no user reference
#[tokio::test]
async fn test_user_lookup_failure_tolerated() -> Result<()> {
    let h = harness(StubUsers::with_user(Uuid::new_v4(), "a@x.com"));
    seed_welcome_template(&h.templates).await?;
    h.users.set_failing(true);

    let outcome = h.pipeline.process(&register_event()).await?;

    let notification = h.notifications.get(outcome.notification_id).await?;
    assert_eq!(notification.user_id, None);

    assert_eq!(outcome.email_status, Some(DeliveryStatus::Success));
    assert!(outcome.in_app_delivery_id.is_none());
    assert_eq!(h.mailer.sent().len(), 1);

    Ok(())
}

/// Test: retry re-sends the recorded content, not a re-render of the
/// (possibly changed) template
#[tokio::test]
async fn test_retry_uses_recorded_content() -> Result<()> {
    let user_id = Uuid::new_v4();
    let h = harness(StubUsers::with_user(user_id, "a@x.com"));
    let template_id = seed_welcome_template(&h.templates).await?;

    h.mailer.set_failing(true);
    let outcome = h.pipeline.process(&register_event()).await?;
    let delivery_id = outcome.email_delivery_id.unwrap();
    assert_eq!(outcome.email_status, Some(DeliveryStatus::Fail));

    // Change the template after the fact; the retry must not pick it up.
    h.templates
        .update(
            template_id,
            UpdateTemplate {
                subject: Some("CHANGED {{name}}".to_string()),
                ..Default::default()
            },
        )
        .await?;

    h.mailer.set_failing(false);
    let retried = h.pipeline.retry_send(delivery_id).await?;

    assert_eq!(retried.status, DeliveryStatus::Success);
    assert_eq!(retried.subject, "Welcome A");

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].1, "Welcome A");

    Ok(())
}

/// Test: retry keeps the original sent_at stamp
#[tokio::test]
async fn test_retry_does_not_restamp_sent_at() -> Result<()> {
    let h = harness(StubUsers::empty());
    seed_welcome_template(&h.templates).await?;

    h.mailer.set_failing(true);
    let outcome = h.pipeline.process(&register_event()).await?;
    let delivery_id = outcome.email_delivery_id.unwrap();

    let before = h.email_deliveries.get(delivery_id).await?;

    h.mailer.set_failing(false);
    let retried = h.pipeline.retry_send(delivery_id).await?;

    assert_eq!(retried.sent_at, before.sent_at);

    Ok(())
}

/// Test: retrying an unknown delivery id is NotFound and mutates nothing
#[tokio::test]
async fn test_retry_unknown_id_is_not_found() -> Result<()> {
    let h = harness(StubUsers::empty());

    let result = h.pipeline.retry_send(Uuid::new_v4()).await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert!(h.mailer.sent().is_empty());

    Ok(())
}

/// Test: an event for an unknown user still produces the email but no inbox
/// row
#[tokio::test]
async fn test_unknown_user_skips_in_app_channel() -> Result<()> {
    let h = harness(StubUsers::empty());
    seed_welcome_template(&h.templates).await?;

    let outcome = h.pipeline.process(&register_event()).await?;

    assert_eq!(outcome.email_status, Some(DeliveryStatus::Success));
    assert!(outcome.in_app_delivery_id.is_none());

    let notification = h.notifications.get(outcome.notification_id).await?;
    assert_eq!(notification.user_id, None);

    Ok(())
}
