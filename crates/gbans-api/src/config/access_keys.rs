use gbans::servers::ServerId;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AccessKeys {
    /// Bearer token required by the moderation endpoints.
    ///
    /// If this is not set, the moderation endpoints reject every request.
    #[debug("{}", if admin.is_some() { "Some(<redacted>)" } else { "None" })]
    pub admin: Option<String>,

    /// Bearer tokens of the game servers allowed to call the plugin endpoints.
    pub servers: Vec<ServerAccessKey>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerAccessKey {
    pub server_id: ServerId,

    #[debug("<redacted>")]
    pub key: String,
}
