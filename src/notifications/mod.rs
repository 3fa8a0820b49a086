//! Customer notifications.
//!
//! Services hand a [`Notification`] to the [`NotificationDispatcher`], which
//! renders and sends it on a spawned task. The caller never waits for the
//! send and never sees its outcome; failures are logged and dropped.

mod mailer;
mod templates;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::{Date, PrimitiveDateTime, Time};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::ServiceType;

pub use mailer::{ChannelMailer, LogMailer, Mailer};
pub use templates::{format_date, format_slot, format_time};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Failed to render notification: {0}")]
    Render(#[from] time::error::Format),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Unavailability,
    Restored,
    Approved,
    Rejected,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Unavailability => "unavailability",
            NotificationKind::Restored => "restored",
            NotificationKind::Approved => "approved",
            NotificationKind::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Sent when a new block cancels an appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct UnavailabilityNotice {
    pub block_id: Uuid,
    pub appointment_id: Uuid,
    pub recipient: Recipient,
    pub date: Date,
    pub time: Time,
    pub alternatives: Vec<PrimitiveDateTime>,
}

/// Sent when removing a block reinstates an appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredNotice {
    pub block_id: Uuid,
    pub appointment_id: Uuid,
    pub recipient: Recipient,
    pub date: Date,
    pub time: Time,
    pub service: ServiceType,
}

/// Sent when an admin approves or rejects a pending booking.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionNotice {
    pub appointment_id: Uuid,
    pub recipient: Recipient,
    pub date: Date,
    pub time: Time,
    pub service: ServiceType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Unavailability(UnavailabilityNotice),
    Restored(RestoredNotice),
    Approved(DecisionNotice),
    Rejected(DecisionNotice),
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Unavailability(_) => NotificationKind::Unavailability,
            Notification::Restored(_) => NotificationKind::Restored,
            Notification::Approved(_) => NotificationKind::Approved,
            Notification::Rejected(_) => NotificationKind::Rejected,
        }
    }

    pub fn recipient(&self) -> &Recipient {
        match self {
            Notification::Unavailability(n) => &n.recipient,
            Notification::Restored(n) => &n.recipient,
            Notification::Approved(n) | Notification::Rejected(n) => &n.recipient,
        }
    }

    /// Stable per-event key so a relay can drop duplicate deliveries.
    pub fn idempotency_key(&self) -> String {
        let kind = self.kind().as_str();
        match self {
            Notification::Unavailability(n) => {
                format!("{}:{}:{}", kind, n.block_id, n.appointment_id)
            }
            Notification::Restored(n) => format!("{}:{}:{}", kind, n.block_id, n.appointment_id),
            Notification::Approved(n) | Notification::Rejected(n) => {
                format!("{}:{}", kind, n.appointment_id)
            }
        }
    }

    pub fn render(&self, from: &str) -> Result<OutgoingEmail, NotificationError> {
        let (subject, body) = templates::render(self)?;
        let recipient = self.recipient();
        Ok(OutgoingEmail {
            from: from.to_string(),
            to: recipient.email.clone(),
            recipient_name: recipient.name.clone(),
            subject,
            body,
            kind: self.kind(),
            idempotency_key: self.idempotency_key(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub kind: NotificationKind,
    pub idempotency_key: String,
}

/// Fire-and-forget front of a [`Mailer`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    /// Queues `notification` for delivery and returns immediately.
    pub fn dispatch(&self, notification: Notification) {
        let mailer = Arc::clone(&self.mailer);
        let from = self.from.clone();

        tokio::spawn(async move {
            let key = notification.idempotency_key();
            let email = match notification.render(&from) {
                Ok(email) => email,
                Err(e) => {
                    error!(idempotency_key = %key, error = %e, "Failed to render notification");
                    return;
                }
            };

            match mailer.send(&email).await {
                Ok(()) => info!(
                    to = %email.to,
                    kind = email.kind.as_str(),
                    idempotency_key = %key,
                    "Notification sent"
                ),
                Err(e) => error!(
                    to = %email.to,
                    kind = email.kind.as_str(),
                    idempotency_key = %key,
                    error = %e,
                    "Failed to send notification"
                ),
            }
        });
    }
}
