use std::fmt::{Display, Formatter, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-record send outcome. `Pending` is the initial state at persistence
/// time; a send attempt (initial or manual retry) moves it to `Success` or
/// `Fail`. `Fail` is not terminal: another retry can overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "delivery_status", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Fail,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Success => write!(f, "success"),
            DeliveryStatus::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailDelivery {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: DeliveryStatus,
    /// Stamped when the record is first persisted; a retry overwrites the
    /// status but never re-stamps this.
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmailDelivery {
    pub notification_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EmailDelivery {
    pub fn new(new: NewEmailDelivery) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_id: new.notification_id,
            recipient: new.recipient,
            subject: new.subject,
            body: new.body,
            status: DeliveryStatus::Pending,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InAppDelivery {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInAppDelivery {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

impl InAppDelivery {
    pub fn new(new: NewInAppDelivery) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_id: new.notification_id,
            user_id: new.user_id,
            content: new.content,
            is_read: false,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }
}
