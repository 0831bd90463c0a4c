mod database;
pub use database::DatabaseConfig;

mod sourcemod;
pub use sourcemod::SourcemodConfig;

mod discord;
pub use discord::DiscordConfig;

mod steam;
pub use steam::SteamConfig;

use crate::servers::Server;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Tunables for the admin catalogs and the seed queue.
    pub sourcemod: SourcemodConfig,

    /// Where notifications (e.g. seed requests) are delivered.
    pub discord: DiscordConfig,

    pub steam: SteamConfig,

    /// Game servers allowed to talk to the plugin endpoints.
    pub servers: Vec<Server>,
}
