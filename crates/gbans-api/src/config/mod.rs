mod server;
pub use server::ServerConfig;

pub mod tracing;
pub use tracing::TracingConfig;

mod runtime;
pub use runtime::RuntimeConfig;

mod access_keys;
pub use access_keys::{AccessKeys, ServerAccessKey};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Configuration for the HTTP server.
    pub server: ServerConfig,

    /// Configuration for [`tracing-subscriber`].
    pub tracing: TracingConfig,

    /// Configuration for Tokio.
    pub runtime: RuntimeConfig,

    /// Keys moderators and game servers authenticate with.
    pub access_keys: AccessKeys,

    #[serde(flatten)]
    pub gbans: gbans::Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = toml::from_str::<Config>(
            r#"
            [server]
            ip-addr = "127.0.0.1"
            port = 6006

            [access-keys]
            admin = "hunter2"

            [[access-keys.servers]]
            server-id = 1
            key = "s3cr3t"

            [sourcemod]
            seed-cooldown = 60

            [[servers]]
            id = 1
            short-name = "us-1"
            address = "10.0.0.1:27015"
            seed-role-ids = ["123"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 6006);
        assert_eq!(config.access_keys.admin.as_deref(), Some("hunter2"));
        assert_eq!(config.access_keys.servers[0].server_id.get(), 1);
        assert_eq!(config.gbans.sourcemod.seed_cooldown.as_secs(), 60);
        assert_eq!(config.gbans.servers[0].short_name, "us-1");
    }
}
