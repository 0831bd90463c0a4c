use std::net::IpAddr;

use crate::bans::{BanType, GetBanStateError, get_ban_state};
use crate::evasion::CheckEvasionError;
use crate::persons::GetOrCreatePersonError;
use crate::{Context, SteamId};

/// What a game server should do with a connecting player.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ban_type: BanType,
    pub message: Option<String>,
}

#[derive(Debug, Display, Error, From)]
pub enum CheckPlayerError {
    #[display("{_0}")]
    #[from]
    BanState(GetBanStateError),

    #[display("{_0}")]
    #[from]
    Person(GetOrCreatePersonError),

    #[display("{_0}")]
    #[from]
    Evasion(CheckEvasionError),
}

impl Verdict {
    pub const OK: Self = Self { ban_type: BanType::Ok, message: None };

    fn evasion() -> Self {
        Self { ban_type: BanType::Banned, message: Some(String::from("Evasion ban")) }
    }
}

/// Decides whether `steam_id`, connecting from `ip`, may play.
///
/// If the matching ban was issued against a different account, the player is treated as an alt:
/// bans that allow alts let them through, all others trigger an evasion check. Failing that check
/// results in a ban regardless of what the original ban was.
///
/// Callers are expected to fail open, i.e. let the player in if this returns an error.
#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn check_player(
    cx: &Context,
    steam_id: SteamId,
    ip: IpAddr,
) -> Result<Verdict, CheckPlayerError> {
    let Some(ban) = get_ban_state(cx, steam_id, ip).await? else {
        return Ok(Verdict::OK);
    };

    cx.persons().get_or_create_person(steam_id).await?;

    if ban.state.steam_id != Some(steam_id) {
        if ban.state.evade_ok {
            return Ok(Verdict::OK);
        }

        if cx.evasion().check_evade_status(steam_id, ip).await? {
            info!(%steam_id, %ip, ban_id = ban.state.ban_id, "detected ban evasion");
            return Ok(Verdict::evasion());
        }
    }

    Ok(Verdict { ban_type: ban.state.ban_type, message: ban.message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bans::BanSource;
    use crate::testing;

    #[tokio::test]
    async fn players_without_bans_are_ok() {
        let cx = testing::context();

        let verdict = check_player(&cx, testing::steam_id(1), testing::ip("10.0.0.1"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::OK);
    }

    #[tokio::test]
    async fn banned_players_are_banned() {
        let (cx, fakes) = testing::context_with_fakes();
        let banned = testing::steam_id(1);
        fakes.bans.insert(testing::ban(banned, BanSource::Steam, BanType::Banned));

        let verdict = check_player(&cx, banned, testing::ip("10.0.0.1")).await.unwrap();

        assert_eq!(verdict.ban_type, BanType::Banned);
        assert!(verdict.message.is_some());
        assert!(fakes.persons.contains(banned));
    }

    #[tokio::test]
    async fn evading_alts_are_banned() {
        let (cx, fakes) = testing::context_with_fakes();
        let main = testing::steam_id(1);
        let alt = testing::steam_id(2);

        fakes.bans.insert(testing::ban(main, BanSource::Steam, BanType::NoComm));
        fakes.evasion.flag(alt);

        let verdict = check_player(&cx, alt, testing::ip("10.0.0.1")).await.unwrap();

        assert_eq!(verdict.ban_type, BanType::Banned);
        assert_eq!(verdict.message.as_deref(), Some("Evasion ban"));
    }

    #[tokio::test]
    async fn alts_that_are_not_evading_get_the_original_ban() {
        let (cx, fakes) = testing::context_with_fakes();
        let main = testing::steam_id(1);
        let alt = testing::steam_id(2);

        fakes.bans.insert(testing::ban(main, BanSource::Cidr, BanType::Network));

        let verdict = check_player(&cx, alt, testing::ip("10.0.0.1")).await.unwrap();

        assert_eq!(verdict.ban_type, BanType::Network);
        assert_eq!(fakes.evasion.checks(), 1);
    }

    #[tokio::test]
    async fn evade_ok_bans_let_alts_through() {
        let (cx, fakes) = testing::context_with_fakes();
        let main = testing::steam_id(1);
        let alt = testing::steam_id(2);

        let mut ban = testing::ban(main, BanSource::Steam, BanType::Banned);
        ban.evade_ok = true;
        fakes.bans.insert(ban);
        fakes.evasion.flag(alt);

        let verdict = check_player(&cx, alt, testing::ip("10.0.0.1")).await.unwrap();

        assert_eq!(verdict, Verdict::OK);
        assert_eq!(fakes.evasion.checks(), 0);
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let (cx, fakes) = testing::context_with_fakes();
        let main = testing::steam_id(1);
        let alt = testing::steam_id(2);
        let ip = testing::ip("10.0.0.1");

        fakes.bans.insert(testing::ban(main, BanSource::Steam, BanType::Banned));

        fakes.persons.fail_next();
        assert!(matches!(check_player(&cx, alt, ip).await, Err(CheckPlayerError::Person(_))));

        fakes.evasion.fail_next();
        assert!(matches!(check_player(&cx, alt, ip).await, Err(CheckPlayerError::Evasion(_))));

        fakes.bans.fail_next();
        assert!(matches!(check_player(&cx, alt, ip).await, Err(CheckPlayerError::BanState(_))));
    }
}
