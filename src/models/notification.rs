use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One durable record of "this event occurred and is being delivered".
/// Immutable after creation; child delivery rows carry the per-channel state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    /// Target user, when the directory lookup succeeded.
    pub user_id: Option<Uuid>,
    pub template_id: Uuid,
    /// Denormalized copy; the template may be renamed or soft-deleted later.
    pub event_type: String,
    /// Raw inbound event document, kept for audit.
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Option<Uuid>,
    pub template_id: Uuid,
    pub event_type: String,
    pub payload: JsonValue,
}

impl Notification {
    pub fn new(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            template_id: new.template_id,
            event_type: new.event_type,
            payload: new.payload,
            created_at: Utc::now(),
        }
    }
}
