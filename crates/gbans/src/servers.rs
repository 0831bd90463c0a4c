//! The game servers registered with the platform.

use std::fmt;

define_id_type! {
    /// A unique identifier for game servers.
    pub struct ServerId(u32);
}

/// A game server, as configured in `[[servers]]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Server {
    pub id: ServerId,

    /// The name shown to players and in notifications, e.g. `us-1`.
    pub short_name: String,

    /// `host:port` players connect to.
    pub address: String,

    /// Discord roles that want to be pinged when the server needs players.
    #[serde(default)]
    pub seed_role_ids: Vec<String>,
}

impl fmt::Display for Server {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} (#{})", self.short_name, self.id)
    }
}
