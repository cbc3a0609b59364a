pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    delivery::{DeliveryStatus, EmailDelivery, InAppDelivery, NewEmailDelivery, NewInAppDelivery},
    notification::{NewNotification, Notification},
    template::{CreateTemplate, Template, UpdateTemplate},
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Reusable message templates keyed by a unique live `event_type`.
/// Soft-delete only: deleted templates stay referencable by notifications
/// but are invisible to every operation here except the audit trail.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fails with `Conflict` if a live template already owns the event type.
    async fn create(&self, req: CreateTemplate) -> Result<Template, StoreError>;

    /// Lookup used by the event pipeline. Live templates only.
    async fn resolve_by_event_type(&self, event_type: &str) -> Result<Template, StoreError>;

    /// Live templates only; a soft-deleted id is `NotFound`.
    async fn get(&self, id: Uuid) -> Result<Template, StoreError>;

    async fn list(&self) -> Result<Vec<Template>, StoreError>;

    /// Fails with `Conflict` when renaming onto another live event type.
    async fn update(&self, id: Uuid, req: UpdateTemplate) -> Result<Template, StoreError>;

    /// Not idempotent: deleting an already-deleted template is `NotFound`.
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, new: NewNotification) -> Result<Notification, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Notification, StoreError>;
}

#[async_trait]
pub trait EmailDeliveryStore: Send + Sync {
    /// Persists with status `pending` and stamps `sent_at`.
    async fn insert(&self, new: NewEmailDelivery) -> Result<EmailDelivery, StoreError>;

    async fn get(&self, id: Uuid) -> Result<EmailDelivery, StoreError>;

    async fn list(&self) -> Result<Vec<EmailDelivery>, StoreError>;

    async fn set_status(&self, id: Uuid, status: DeliveryStatus) -> Result<(), StoreError>;

    /// Hard delete; this entity has no soft-delete flag, unlike InAppDelivery.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InAppDeliveryStore: Send + Sync {
    async fn insert(&self, new: NewInAppDelivery) -> Result<InAppDelivery, StoreError>;

    /// Direct id lookup; soft-deleted rows are still retrievable here.
    async fn get(&self, id: Uuid) -> Result<InAppDelivery, StoreError>;

    /// The user's inbox: non-deleted rows, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<InAppDelivery>, StoreError>;

    async fn mark_read(&self, id: Uuid) -> Result<InAppDelivery, StoreError>;

    /// Returns the number of rows flipped to read.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Soft delete; a second call on the same id is `NotFound`.
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;
}
