use url::Url;

use super::{Notification, Notifier, SendNotificationError};

/// Posts notifications to a Discord channel through an incoming webhook.
#[derive(Debug, Clone)]
pub struct DiscordWebhookNotifier {
    http_client: reqwest::Client,

    #[debug("<redacted>")]
    webhook_url: Url,
}

#[derive(serde::Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

impl DiscordWebhookNotifier {
    pub fn new(http_client: reqwest::Client, webhook_url: Url) -> Self {
        Self { http_client, webhook_url }
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordWebhookNotifier {
    #[tracing::instrument(skip_all, fields(kind = %notification.kind), err(level = "debug"))]
    async fn send(&self, notification: Notification) -> Result<(), SendNotificationError> {
        self.http_client
            .post(self.webhook_url.clone())
            .json(&WebhookMessage { content: &notification.content })
            .send()
            .await?
            .error_for_status()?;

        debug!("delivered notification");

        Ok(())
    }
}
