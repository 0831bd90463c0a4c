use super::{Notification, Notifier, SendNotificationError};

/// Writes notifications to the log instead of delivering them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), SendNotificationError> {
        info!(kind = %notification.kind, content = %notification.content, "notification");
        Ok(())
    }
}
