use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: Uuid,
    pub event_type: String,
    pub subject: String,
    pub email_body: String,
    pub inapp_body: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn new(req: CreateTemplate) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: req.event_type,
            subject: req.subject,
            email_body: req.email_body,
            inapp_body: req.inapp_body,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub event_type: String,
    pub subject: String,
    pub email_body: String,
    pub inapp_body: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplate {
    pub event_type: Option<String>,
    pub subject: Option<String>,
    pub email_body: Option<String>,
    pub inapp_body: Option<String>,
}
