use std::time::Duration;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SourcemodConfig {
    /// Minimum time between two seed requests for the same server or player, in seconds.
    #[serde(deserialize_with = "deserialize_seconds")]
    pub seed_cooldown: Duration,

    /// How long admin/group search snapshots may be served before they are refreshed, in
    /// seconds.
    #[serde(deserialize_with = "deserialize_seconds")]
    pub cache_ttl: Duration,
}

impl Default for SourcemodConfig {
    fn default() -> Self {
        Self {
            seed_cooldown: Duration::from_secs(300),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_seconds() {
        let config = serde_json::from_str::<SourcemodConfig>(r#"{ "seed-cooldown": 10 }"#).unwrap();

        assert_eq!(config.seed_cooldown, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }
}
