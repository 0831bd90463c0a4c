#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SteamConfig {
    /// Key for Steam's Web API, used to resolve custom profile URLs.
    ///
    /// Without it, admins can still be identified by SteamID or `/profiles/` URL.
    #[debug("{}", if web_api_key.is_some() { "Some(<redacted>)" } else { "None" })]
    pub web_api_key: Option<String>,
}
