//! Detecting banned players coming back on another account.

use std::net::IpAddr;
use std::sync::Arc;

use crate::bans::{BanStateLookup, BanType};
use crate::SteamId;

#[derive(Debug, Display, Error)]
#[display("failed to check evasion status: {_0}")]
pub struct CheckEvasionError(Box<dyn std::error::Error + Send + Sync>);

impl CheckEvasionError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

#[async_trait::async_trait]
pub trait EvadeChecker: Send + Sync {
    /// Returns whether `steam_id`, connecting from `ip`, is evading a ban on another account.
    async fn check_evade_status(&self, steam_id: SteamId, ip: IpAddr)
    -> Result<bool, CheckEvasionError>;
}

/// Treats a player as evading if their address is covered by an active ban that was issued
/// against a different account.
///
/// Mutes are not evaded by switching accounts, and bans flagged `evade_ok` explicitly allow it.
#[derive(Clone)]
pub struct IpBanEvadeChecker {
    bans: Arc<dyn BanStateLookup>,
}

impl std::fmt::Debug for IpBanEvadeChecker {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("IpBanEvadeChecker").finish_non_exhaustive()
    }
}

impl IpBanEvadeChecker {
    pub fn new(bans: Arc<dyn BanStateLookup>) -> Self {
        Self { bans }
    }
}

#[async_trait::async_trait]
impl EvadeChecker for IpBanEvadeChecker {
    #[tracing::instrument(skip(self), ret(level = "debug"), err(level = "debug"))]
    async fn check_evade_status(
        &self,
        steam_id: SteamId,
        ip: IpAddr,
    ) -> Result<bool, CheckEvasionError> {
        let Some(ban) = self
            .bans
            .query_ban_state(steam_id, ip)
            .await
            .map_err(CheckEvasionError::new)?
        else {
            return Ok(false);
        };

        Ok(ban.ban_id > 0
            && ban.steam_id.is_some_and(|banned| banned != steam_id)
            && !ban.evade_ok
            && ban.ban_type >= BanType::Banned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bans::BanSource;
    use crate::testing::{self, FakeBanStateLookup};

    fn checker() -> (IpBanEvadeChecker, Arc<FakeBanStateLookup>) {
        let bans = Arc::new(FakeBanStateLookup::default());
        (IpBanEvadeChecker::new(Arc::clone(&bans) as Arc<dyn BanStateLookup>), bans)
    }

    #[tokio::test]
    async fn alts_of_banned_players_are_evading() {
        let (checker, bans) = checker();
        let ip = testing::ip("10.0.0.1");

        assert!(!checker.check_evade_status(testing::steam_id(2), ip).await.unwrap());

        bans.insert(testing::ban(testing::steam_id(1), BanSource::Steam, BanType::Banned));

        assert!(checker.check_evade_status(testing::steam_id(2), ip).await.unwrap());
        assert!(!checker.check_evade_status(testing::steam_id(1), ip).await.unwrap());
    }

    #[tokio::test]
    async fn mutes_and_evade_ok_bans_are_not_evaded() {
        let (checker, bans) = checker();
        let ip = testing::ip("10.0.0.1");

        bans.insert(testing::ban(testing::steam_id(1), BanSource::Steam, BanType::NoComm));
        assert!(!checker.check_evade_status(testing::steam_id(2), ip).await.unwrap());

        let mut ban = testing::ban(testing::steam_id(1), BanSource::Steam, BanType::Banned);
        ban.evade_ok = true;
        bans.insert(ban);
        assert!(!checker.check_evade_status(testing::steam_id(2), ip).await.unwrap());
    }

    #[tokio::test]
    async fn lookup_failures_are_errors() {
        let (checker, bans) = checker();
        bans.fail_next();

        assert!(checker
            .check_evade_status(testing::steam_id(2), testing::ip("10.0.0.1"))
            .await
            .is_err());
    }
}
