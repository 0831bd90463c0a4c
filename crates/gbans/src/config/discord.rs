use url::Url;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DiscordConfig {
    /// Webhook of the channel seed requests are posted to.
    ///
    /// If this is not set, notifications are only logged.
    #[debug("{}", if seed_webhook_url.is_some() { "Some(<redacted>)" } else { "None" })]
    pub seed_webhook_url: Option<Url>,
}
