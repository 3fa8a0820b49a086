use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use super::{NotificationError, OutgoingEmail};

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

/// Writes every email to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            idempotency_key = %email.idempotency_key,
            "Email queued (log transport)"
        );
        tracing::debug!(body = %email.body, "Email body");
        Ok(())
    }
}

/// Forwards every email into a channel, for relays running in-process.
#[derive(Debug, Clone)]
pub struct ChannelMailer {
    tx: mpsc::UnboundedSender<OutgoingEmail>,
}

impl ChannelMailer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutgoingEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Mailer for ChannelMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        self.tx
            .send(email.clone())
            .map_err(|_| NotificationError::Transport("outbox channel closed".to_string()))
    }
}
