use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clients::{mailer::MailTransport, users::UserDirectory},
    models::{
        delivery::{DeliveryStatus, EmailDelivery, NewEmailDelivery, NewInAppDelivery},
        event::EventMessage,
        notification::NewNotification,
    },
    render::render,
    store::{EmailDeliveryStore, InAppDeliveryStore, NotificationStore, StoreError, TemplateStore},
};

/// Why an event could not be processed. All variants are absorbed by the
/// consumer: the message is logged and acked, never redelivered.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Undecodable payload; permanent, the message is dropped.
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// No live template configured for the event type; permanent.
    #[error("no template configured for event type '{0}'")]
    UnknownEventType(String),

    /// The notification row could not be written; nothing to deliver.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

/// Summary of one event's fan-out, mainly for logging and tests.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub notification_id: Uuid,
    pub email_delivery_id: Option<Uuid>,
    pub email_status: Option<DeliveryStatus>,
    pub in_app_delivery_id: Option<Uuid>,
}

pub struct Pipeline {
    templates: Arc<dyn TemplateStore>,
    notifications: Arc<dyn NotificationStore>,
    email_deliveries: Arc<dyn EmailDeliveryStore>,
    in_app_deliveries: Arc<dyn InAppDeliveryStore>,
    mailer: Arc<dyn MailTransport>,
    users: Arc<dyn UserDirectory>,
}

impl Pipeline {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        notifications: Arc<dyn NotificationStore>,
        email_deliveries: Arc<dyn EmailDeliveryStore>,
        in_app_deliveries: Arc<dyn InAppDeliveryStore>,
        mailer: Arc<dyn MailTransport>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            templates,
            notifications,
            email_deliveries,
            in_app_deliveries,
            mailer,
            users,
        }
    }

    /// Processes one inbound event end to end: decode, resolve template,
    /// render, persist the notification and its channel deliveries as
    /// independent commits, then attempt the email send and record its
    /// outcome. A failure in one channel never rolls back the other.
    pub async fn process(&self, payload: &[u8]) -> Result<ProcessOutcome, ProcessError> {
        let raw: JsonValue = serde_json::from_slice(payload)?;
        let event: EventMessage = serde_json::from_value(raw.clone())?;

        info!(
            event_type = %event.event_type,
            email = %event.email,
            "Processing notification event"
        );

        let template = match self.templates.resolve_by_event_type(&event.event_type).await {
            Ok(template) => template,
            Err(StoreError::NotFound(_)) => {
                return Err(ProcessError::UnknownEventType(event.event_type));
            }
            Err(e) => return Err(ProcessError::Store(e)),
        };

        let vars = event.variables();
        let subject = render(&template.subject, &vars);
        let email_body = render(&template.email_body, &vars);
        let inapp_content = render(&template.inapp_body, &vars);

        debug!(template_id = %template.id, "Template resolved and rendered");

        // A directory miss or outage is tolerated; the email must still be
        // attempted, so processing continues without a user reference.
        let user_id = match self.users.find_by_email(&event.email).await {
            Ok(Some(user)) => Some(user.user_id),
            Ok(None) => {
                warn!(email = %event.email, "No user found for event recipient");
                None
            }
            Err(e) => {
                warn!(email = %event.email, error = %e, "User lookup failed, continuing without user");
                None
            }
        };

        let notification = self
            .notifications
            .insert(NewNotification {
                user_id,
                template_id: template.id,
                event_type: event.event_type.clone(),
                payload: raw,
            })
            .await?;

        let email_delivery = match self
            .email_deliveries
            .insert(NewEmailDelivery {
                notification_id: notification.id,
                recipient: event.email.clone(),
                subject,
                body: email_body,
            })
            .await
        {
            Ok(delivery) => Some(delivery),
            Err(e) => {
                warn!(
                    notification_id = %notification.id,
                    error = %e,
                    "Failed to persist email delivery, skipping email channel"
                );
                None
            }
        };

        // The inbox row needs an owner; without a resolved user there is no
        // one to list it for.
        let in_app_delivery_id = match user_id {
            Some(user_id) => {
                match self
                    .in_app_deliveries
                    .insert(NewInAppDelivery {
                        notification_id: notification.id,
                        user_id,
                        content: inapp_content,
                    })
                    .await
                {
                    Ok(delivery) => Some(delivery.id),
                    Err(e) => {
                        warn!(
                            notification_id = %notification.id,
                            error = %e,
                            "Failed to persist in-app delivery"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let (email_delivery_id, email_status) = match email_delivery {
            Some(delivery) => {
                let status = self.attempt_send(&delivery).await;

                // A failed status write leaves the record pending; accepted
                // crash-window behavior, the operator can still retry manually.
                if let Err(e) = self.email_deliveries.set_status(delivery.id, status).await {
                    warn!(
                        delivery_id = %delivery.id,
                        error = %e,
                        "Failed to persist delivery status, record stays pending"
                    );
                }

                (Some(delivery.id), Some(status))
            }
            None => (None, None),
        };

        info!(
            notification_id = %notification.id,
            email_status = ?email_status,
            in_app_delivered = in_app_delivery_id.is_some(),
            "Event processed"
        );

        Ok(ProcessOutcome {
            notification_id: notification.id,
            email_delivery_id,
            email_status,
            in_app_delivery_id,
        })
    }

    /// Manually triggered re-attempt of an existing email delivery. Re-sends
    /// the already-rendered subject and body; the template is never
    /// consulted again. No retry limit, no locking: concurrent retries race
    /// and the last status write wins.
    pub async fn retry_send(&self, id: Uuid) -> Result<EmailDelivery, StoreError> {
        let delivery = self.email_deliveries.get(id).await?;

        info!(
            delivery_id = %delivery.id,
            recipient = %delivery.recipient,
            previous_status = %delivery.status,
            "Retrying email delivery"
        );

        let status = self.attempt_send(&delivery).await;
        self.email_deliveries.set_status(id, status).await?;

        self.email_deliveries.get(id).await
    }

    async fn attempt_send(&self, delivery: &EmailDelivery) -> DeliveryStatus {
        match self
            .mailer
            .send(&delivery.recipient, &delivery.subject, &delivery.body)
            .await
        {
            Ok(_) => DeliveryStatus::Success,
            Err(e) => {
                warn!(
                    delivery_id = %delivery.id,
                    recipient = %delivery.recipient,
                    error = %e,
                    "Email send failed"
                );
                DeliveryStatus::Fail
            }
        }
    }
}
