//! In-memory store implementations behind the same traits as the Postgres
//! backends. State lives in mutex-guarded maps and is lost on drop; the test
//! suite runs the pipeline against these.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    delivery::{DeliveryStatus, EmailDelivery, InAppDelivery, NewEmailDelivery, NewInAppDelivery},
    notification::{NewNotification, Notification},
    template::{CreateTemplate, Template, UpdateTemplate},
};

use super::{EmailDeliveryStore, InAppDeliveryStore, NotificationStore, StoreError, TemplateStore};

#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: Mutex<HashMap<Uuid, Template>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn create(&self, req: CreateTemplate) -> Result<Template, StoreError> {
        let mut templates = self.templates.lock().unwrap();

        let duplicate = templates
            .values()
            .any(|t| !t.is_deleted && t.event_type == req.event_type);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "live template already exists for event type '{}'",
                req.event_type
            )));
        }

        let template = Template::new(req);
        templates.insert(template.id, template.clone());

        Ok(template)
    }

    async fn resolve_by_event_type(&self, event_type: &str) -> Result<Template, StoreError> {
        let templates = self.templates.lock().unwrap();

        templates
            .values()
            .find(|t| !t.is_deleted && t.event_type == event_type)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("no template for event type '{}'", event_type))
            })
    }

    async fn get(&self, id: Uuid) -> Result<Template, StoreError> {
        let templates = self.templates.lock().unwrap();

        templates
            .get(&id)
            .filter(|t| !t.is_deleted)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("template {} not found", id)))
    }

    async fn list(&self) -> Result<Vec<Template>, StoreError> {
        let templates = self.templates.lock().unwrap();

        let mut live: Vec<Template> = templates.values().filter(|t| !t.is_deleted).cloned().collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(live)
    }

    async fn update(&self, id: Uuid, req: UpdateTemplate) -> Result<Template, StoreError> {
        let mut templates = self.templates.lock().unwrap();

        let current = templates
            .get(&id)
            .filter(|t| !t.is_deleted)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("template {} not found", id)))?;

        let event_type = req.event_type.unwrap_or(current.event_type);

        let conflict = templates
            .values()
            .any(|t| t.id != id && !t.is_deleted && t.event_type == event_type);
        if conflict {
            return Err(StoreError::Conflict(format!(
                "live template already exists for event type '{}'",
                event_type
            )));
        }

        let entry = templates.get_mut(&id).unwrap();
        entry.event_type = event_type;
        if let Some(subject) = req.subject {
            entry.subject = subject;
        }
        if let Some(email_body) = req.email_body {
            entry.email_body = email_body;
        }
        if let Some(inapp_body) = req.inapp_body {
            entry.inapp_body = inapp_body;
        }

        Ok(entry.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut templates = self.templates.lock().unwrap();

        match templates.get_mut(&id) {
            Some(t) if !t.is_deleted => {
                t.is_deleted = true;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("template {} not found", id))),
        }
    }
}

#[derive(Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<HashMap<Uuid, Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let notification = Notification::new(new);

        self.notifications
            .lock()
            .unwrap()
            .insert(notification.id, notification.clone());

        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Notification, StoreError> {
        self.notifications
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("notification {} not found", id)))
    }
}

#[derive(Default)]
pub struct MemoryEmailDeliveryStore {
    deliveries: Mutex<HashMap<Uuid, EmailDelivery>>,
}

impl MemoryEmailDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailDeliveryStore for MemoryEmailDeliveryStore {
    async fn insert(&self, new: NewEmailDelivery) -> Result<EmailDelivery, StoreError> {
        let delivery = EmailDelivery::new(new);

        self.deliveries
            .lock()
            .unwrap()
            .insert(delivery.id, delivery.clone());

        Ok(delivery)
    }

    async fn get(&self, id: Uuid) -> Result<EmailDelivery, StoreError> {
        self.deliveries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("email delivery {} not found", id)))
    }

    async fn list(&self) -> Result<Vec<EmailDelivery>, StoreError> {
        let deliveries = self.deliveries.lock().unwrap();

        let mut all: Vec<EmailDelivery> = deliveries.values().cloned().collect();
        all.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));

        Ok(all)
    }

    async fn set_status(&self, id: Uuid, status: DeliveryStatus) -> Result<(), StoreError> {
        let mut deliveries = self.deliveries.lock().unwrap();

        let delivery = deliveries
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("email delivery {} not found", id)))?;
        delivery.status = status;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.deliveries
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("email delivery {} not found", id)))
    }
}

#[derive(Default)]
pub struct MemoryInAppDeliveryStore {
    deliveries: Mutex<HashMap<Uuid, InAppDelivery>>,
}

impl MemoryInAppDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InAppDeliveryStore for MemoryInAppDeliveryStore {
    async fn insert(&self, new: NewInAppDelivery) -> Result<InAppDelivery, StoreError> {
        let delivery = InAppDelivery::new(new);

        self.deliveries
            .lock()
            .unwrap()
            .insert(delivery.id, delivery.clone());

        Ok(delivery)
    }

    async fn get(&self, id: Uuid) -> Result<InAppDelivery, StoreError> {
        self.deliveries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("in-app delivery {} not found", id)))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<InAppDelivery>, StoreError> {
        let deliveries = self.deliveries.lock().unwrap();

        let mut inbox: Vec<InAppDelivery> = deliveries
            .values()
            .filter(|d| d.user_id == user_id && !d.is_deleted)
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(inbox)
    }

    async fn mark_read(&self, id: Uuid) -> Result<InAppDelivery, StoreError> {
        let mut deliveries = self.deliveries.lock().unwrap();

        match deliveries.get_mut(&id) {
            Some(d) if !d.is_deleted => {
                d.is_read = true;
                Ok(d.clone())
            }
            _ => Err(StoreError::NotFound(format!(
                "in-app delivery {} not found",
                id
            ))),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut deliveries = self.deliveries.lock().unwrap();

        let mut updated = 0;
        for delivery in deliveries.values_mut() {
            if delivery.user_id == user_id && !delivery.is_deleted && !delivery.is_read {
                delivery.is_read = true;
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut deliveries = self.deliveries.lock().unwrap();

        match deliveries.get_mut(&id) {
            Some(d) if !d.is_deleted => {
                d.is_deleted = true;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!(
                "in-app delivery {} not found",
                id
            ))),
        }
    }
}
