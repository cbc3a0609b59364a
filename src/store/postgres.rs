use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    delivery::{DeliveryStatus, EmailDelivery, InAppDelivery, NewEmailDelivery, NewInAppDelivery},
    notification::{NewNotification, Notification},
    template::{CreateTemplate, Template, UpdateTemplate},
};

use super::{EmailDeliveryStore, InAppDeliveryStore, NotificationStore, StoreError, TemplateStore};

pub async fn connect(database_url: &str) -> Result<PgPool, Error> {
    info!("Connecting to PostgreSQL database");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    info!("PostgreSQL connection established");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;

    Ok(())
}

pub async fn ping(pool: &PgPool) -> Result<(), Error> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| anyhow!("Database health check failed: {}", e))?;

    Ok(())
}

pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn create(&self, req: CreateTemplate) -> Result<Template, StoreError> {
        let template = Template::new(req);

        // A partial unique index on live event types backs this up; the
        // insert itself surfaces the duplicate as a unique violation.
        sqlx::query(
            r#"
            INSERT INTO templates (id, event_type, subject, email_body, inapp_body, is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(template.id)
        .bind(&template.event_type)
        .bind(&template.subject)
        .bind(&template.email_body)
        .bind(&template.inapp_body)
        .bind(template.is_deleted)
        .bind(template.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict(format!(
                "live template already exists for event type '{}'",
                template.event_type
            )),
            other => other,
        })?;

        debug!(template_id = %template.id, event_type = %template.event_type, "Template created");

        Ok(template)
    }

    async fn resolve_by_event_type(&self, event_type: &str) -> Result<Template, StoreError> {
        let template = sqlx::query_as::<_, Template>(
            "SELECT * FROM templates WHERE event_type = $1 AND NOT is_deleted",
        )
        .bind(event_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            StoreError::NotFound(format!("no template for event type '{}'", event_type))
        })?;

        Ok(template)
    }

    async fn get(&self, id: Uuid) -> Result<Template, StoreError> {
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("template {} not found", id)))
    }

    async fn list(&self) -> Result<Vec<Template>, StoreError> {
        let templates = sqlx::query_as::<_, Template>(
            "SELECT * FROM templates WHERE NOT is_deleted ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    async fn update(&self, id: Uuid, req: UpdateTemplate) -> Result<Template, StoreError> {
        // Mutations only see live templates; the existence check doubles as
        // the NotFound path for soft-deleted ids.
        let current = self.get(id).await?;

        let event_type = req.event_type.unwrap_or(current.event_type);
        let subject = req.subject.unwrap_or(current.subject);
        let email_body = req.email_body.unwrap_or(current.email_body);
        let inapp_body = req.inapp_body.unwrap_or(current.inapp_body);

        let updated = sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET event_type = $2, subject = $3, email_body = $4, inapp_body = $5
            WHERE id = $1 AND NOT is_deleted
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&event_type)
        .bind(&subject)
        .bind(&email_body)
        .bind(&inapp_body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict(format!(
                "live template already exists for event type '{}'",
                event_type
            )),
            other => other,
        })?
        .ok_or_else(|| StoreError::NotFound(format!("template {} not found", id)))?;

        Ok(updated)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE templates SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("template {} not found", id)));
        }

        Ok(())
    }
}

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let notification = Notification::new(new);

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, template_id, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.template_id)
        .bind(&notification.event_type)
        .bind(&notification.payload)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            notification_id = %notification.id,
            event_type = %notification.event_type,
            "Notification persisted"
        );

        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Notification, StoreError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("notification {} not found", id)))
    }
}

pub struct PgEmailDeliveryStore {
    pool: PgPool,
}

impl PgEmailDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailDeliveryStore for PgEmailDeliveryStore {
    async fn insert(&self, new: NewEmailDelivery) -> Result<EmailDelivery, StoreError> {
        let delivery = EmailDelivery::new(new);

        sqlx::query(
            r#"
            INSERT INTO email_deliveries (id, notification_id, recipient, subject, body, status, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.notification_id)
        .bind(&delivery.recipient)
        .bind(&delivery.subject)
        .bind(&delivery.body)
        .bind(delivery.status)
        .bind(delivery.sent_at)
        .execute(&self.pool)
        .await?;

        debug!(delivery_id = %delivery.id, recipient = %delivery.recipient, "Email delivery persisted");

        Ok(delivery)
    }

    async fn get(&self, id: Uuid) -> Result<EmailDelivery, StoreError> {
        sqlx::query_as::<_, EmailDelivery>("SELECT * FROM email_deliveries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("email delivery {} not found", id)))
    }

    async fn list(&self) -> Result<Vec<EmailDelivery>, StoreError> {
        let deliveries = sqlx::query_as::<_, EmailDelivery>(
            "SELECT * FROM email_deliveries ORDER BY sent_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn set_status(&self, id: Uuid, status: DeliveryStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE email_deliveries SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "email delivery {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM email_deliveries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "email delivery {} not found",
                id
            )));
        }

        Ok(())
    }
}

pub struct PgInAppDeliveryStore {
    pool: PgPool,
}

impl PgInAppDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InAppDeliveryStore for PgInAppDeliveryStore {
    async fn insert(&self, new: NewInAppDelivery) -> Result<InAppDelivery, StoreError> {
        let delivery = InAppDelivery::new(new);

        sqlx::query(
            r#"
            INSERT INTO in_app_deliveries (id, notification_id, user_id, content, is_read, is_deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.notification_id)
        .bind(delivery.user_id)
        .bind(&delivery.content)
        .bind(delivery.is_read)
        .bind(delivery.is_deleted)
        .bind(delivery.created_at)
        .execute(&self.pool)
        .await?;

        debug!(delivery_id = %delivery.id, user_id = %delivery.user_id, "In-app delivery persisted");

        Ok(delivery)
    }

    async fn get(&self, id: Uuid) -> Result<InAppDelivery, StoreError> {
        sqlx::query_as::<_, InAppDelivery>("SELECT * FROM in_app_deliveries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("in-app delivery {} not found", id)))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<InAppDelivery>, StoreError> {
        let deliveries = sqlx::query_as::<_, InAppDelivery>(
            r#"
            SELECT * FROM in_app_deliveries
            WHERE user_id = $1 AND NOT is_deleted
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn mark_read(&self, id: Uuid) -> Result<InAppDelivery, StoreError> {
        sqlx::query_as::<_, InAppDelivery>(
            "UPDATE in_app_deliveries SET is_read = TRUE WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("in-app delivery {} not found", id)))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        // Single statement, so the batch is atomic. The source system saved
        // row by row; see DESIGN.md for the documented deviation.
        let result = sqlx::query(
            "UPDATE in_app_deliveries SET is_read = TRUE WHERE user_id = $1 AND NOT is_deleted AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE in_app_deliveries SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "in-app delivery {} not found",
                id
            )));
        }

        Ok(())
    }
}
