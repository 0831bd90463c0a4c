//! Delivering messages to humans.

mod discord;
pub use discord::DiscordWebhookNotifier;

mod log;
pub use log::LogNotifier;

/// A message for humans watching the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub content: String,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A game server is asking for players.
    #[display("seed request")]
    SeedRequest,
}

#[derive(Debug, Display, Error, From)]
pub enum SendNotificationError {
    #[display("failed to deliver notification: {_0}")]
    #[from]
    Http(reqwest::Error),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), SendNotificationError>;
}

impl Notification {
    pub fn seed_request(content: impl Into<String>) -> Self {
        Self { kind: NotificationKind::SeedRequest, content: content.into() }
    }
}
