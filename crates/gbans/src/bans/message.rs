use crate::bans::{BanSource, BanType, PlayerBanState};
use crate::time::Timestamp;

/// Bans expiring further in the future than this are shown as permanent.
const PERMANENT_AFTER_YEARS: i32 = 5;

/// Renders the message a banned player is kicked (or muted) with.
///
/// Returns `None` if the state does not restrict the player.
pub fn render_message(state: &PlayerBanState, now: Timestamp) -> Option<String> {
    if state.ban_id == 0 || state.ban_type < BanType::NoComm {
        return None;
    }

    let valid_until = if state.valid_until > now.add_years(PERMANENT_AFTER_YEARS) {
        String::from("Permanent")
    } else {
        state.valid_until.to_ansi_c()
    };

    let appeal_url = match state.ban_source {
        BanSource::Steam => format!("/appeal/{}", state.ban_id),
        _ => String::from("n/a"),
    };

    let banned = |label: &str, until: &str| {
        format!("Banned\nReason: {} ({label})\nUntil: {until}\nAppeal: {appeal_url}", state.reason)
    };

    match state.ban_source {
        BanSource::Steam if state.ban_type == BanType::NoComm => Some(format!(
            "You are muted & gagged. Expires: {}. Appeal: {appeal_url}",
            state.valid_until.to_date_time(),
        )),
        BanSource::Steam => Some(banned("Steam", &valid_until)),
        BanSource::Asn => Some(banned("ASN", "Permanent")),
        BanSource::Cidr => {
            Some(String::from("Blocked Network/VPN\nPlease disable your VPN if you are using one."))
        },
        BanSource::SteamFriend => Some(String::from("Friend Network Ban")),
        BanSource::SteamGroup => Some(String::from("Blocked Steam Group")),
        BanSource::SteamNet => Some(banned("Steam Net", "Permanent")),
        BanSource::None => None,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::bans::BanReason;
    use crate::testing;

    fn now() -> Timestamp {
        Timestamp::from(datetime!(2024-06-01 12:00:00 UTC))
    }

    fn state(ban_source: BanSource, ban_type: BanType, valid_until: Timestamp) -> PlayerBanState {
        PlayerBanState {
            steam_id: Some(testing::steam_id(1)),
            ban_source,
            ban_id: 42,
            ban_type,
            reason: BanReason::Cheating,
            evade_ok: false,
            valid_until,
        }
    }

    #[test]
    fn steam_ban() {
        let until = Timestamp::from(datetime!(2024-07-04 08:09:10 UTC));
        let message = render_message(&state(BanSource::Steam, BanType::Banned, until), now());

        assert_eq!(
            message.as_deref(),
            Some("Banned\nReason: Cheating (Steam)\nUntil: Thu Jul  4 08:09:10 2024\nAppeal: /appeal/42"),
        );
    }

    #[test]
    fn far_future_steam_bans_are_permanent() {
        let until = Timestamp::from(datetime!(2034-01-01 00:00:00 UTC));
        let message = render_message(&state(BanSource::Steam, BanType::Banned, until), now());

        assert_eq!(
            message.as_deref(),
            Some("Banned\nReason: Cheating (Steam)\nUntil: Permanent\nAppeal: /appeal/42"),
        );
    }

    #[test]
    fn steam_mute() {
        let until = Timestamp::from(datetime!(2024-06-02 01:02:03 UTC));
        let message = render_message(&state(BanSource::Steam, BanType::NoComm, until), now());

        assert_eq!(
            message.as_deref(),
            Some("You are muted & gagged. Expires: 2024-06-02 01:02:03. Appeal: /appeal/42"),
        );
    }

    #[test]
    fn network_bans() {
        let until = now() + time::Duration::days(1);
        let render = |source| render_message(&state(source, BanType::Network, until), now());

        assert_eq!(
            render(BanSource::Asn).as_deref(),
            Some("Banned\nReason: Cheating (ASN)\nUntil: Permanent\nAppeal: n/a"),
        );
        assert_eq!(
            render(BanSource::SteamNet).as_deref(),
            Some("Banned\nReason: Cheating (Steam Net)\nUntil: Permanent\nAppeal: n/a"),
        );
        assert_eq!(
            render(BanSource::Cidr).as_deref(),
            Some("Blocked Network/VPN\nPlease disable your VPN if you are using one."),
        );
        assert_eq!(render(BanSource::SteamFriend).as_deref(), Some("Friend Network Ban"));
        assert_eq!(render(BanSource::SteamGroup).as_deref(), Some("Blocked Steam Group"));
    }

    #[test]
    fn nothing_to_say() {
        let until = now() + time::Duration::days(1);

        assert_eq!(render_message(&state(BanSource::Steam, BanType::Ok, until), now()), None);
        assert_eq!(render_message(&state(BanSource::None, BanType::Banned, until), now()), None);

        let mut unsaved = state(BanSource::Steam, BanType::Banned, until);
        unsaved.ban_id = 0;
        assert_eq!(render_message(&unsaved, now()), None);
    }
}
