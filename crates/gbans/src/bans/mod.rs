//! Ban-state resolution.
//!
//! Bans themselves are stored and managed elsewhere; this module only asks which ban (if any)
//! currently applies to a connecting player and turns the answer into something the game server
//! can act on.

use std::fmt;
use std::net::IpAddr;

use crate::time::Timestamp;
use crate::{Context, SteamId, database};

mod reason;
pub use reason::BanReason;

mod message;
pub use message::render_message;

mod check;
pub use check::{CheckPlayerError, Verdict, check_player};

mod mysql;

/// How severe a ban is.
///
/// Variants are ordered by severity, and serialized as the integers game server plugins expect.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BanType {
    Unknown = -1,

    #[default]
    Ok = 0,

    /// Muted and gagged.
    NoComm = 1,

    Banned = 2,

    /// Banned because of the network the player is connecting from.
    Network = 3,
}

/// Which kind of ban matched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum BanSource {
    #[default]
    #[serde(rename = "")]
    None,

    #[serde(rename = "ban_steam")]
    Steam,

    /// A friend of the player is banned and the ban extends to their friends.
    #[serde(rename = "ban_steam_friend")]
    SteamFriend,

    /// The player is a member of a banned Steam group.
    #[serde(rename = "steam_group")]
    SteamGroup,

    #[serde(rename = "ban_net")]
    SteamNet,

    /// The player's address lies within a banned CIDR block.
    #[serde(rename = "cidr_block")]
    Cidr,

    /// The player's address belongs to a banned autonomous system.
    #[serde(rename = "ban_asn")]
    Asn,
}

#[derive(Debug, Display, Error)]
#[display("unknown ban source `{source}`")]
pub struct UnknownBanSource {
    #[error(ignore)]
    pub source: String,
}

/// The single most relevant active ban for a `(SteamID, address)` pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PlayerBanState {
    /// The account the ban was issued against.
    ///
    /// This is not necessarily the account that is connecting; address-based bans may match
    /// alts, and some bans (e.g. CIDR blocks) are not tied to an account at all.
    pub steam_id: Option<SteamId>,

    pub ban_source: BanSource,
    pub ban_id: u64,
    pub ban_type: BanType,
    pub reason: BanReason,

    /// Whether other accounts connecting from the same address are exempt from evasion checks.
    pub evade_ok: bool,

    pub valid_until: Timestamp,
}

/// Looks up the ban that currently applies to a player.
#[async_trait::async_trait]
pub trait BanStateLookup: Send + Sync {
    /// Returns the highest-precedence active ban matching either `steam_id` or `ip`.
    async fn query_ban_state(
        &self,
        steam_id: SteamId,
        ip: IpAddr,
    ) -> database::Result<Option<PlayerBanState>>;
}

/// An active ban together with the message shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBan {
    pub state: PlayerBanState,
    pub message: Option<String>,
}

#[derive(Debug, Display, Error, From)]
#[display("failed to query ban state: {_0}")]
#[from(forward)]
pub struct GetBanStateError(database::Error);

impl BanType {
    pub const fn from_repr(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Unknown),
            0 => Some(Self::Ok),
            1 => Some(Self::NoComm),
            2 => Some(Self::Banned),
            3 => Some(Self::Network),
            _ => None,
        }
    }

    pub const fn as_repr(self) -> i8 {
        match self {
            Self::Unknown => -1,
            Self::Ok => 0,
            Self::NoComm => 1,
            Self::Banned => 2,
            Self::Network => 3,
        }
    }
}

impl fmt::Display for BanType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(match self {
            Self::Unknown => "unknown",
            Self::Ok => "ok",
            Self::NoComm => "no_comm",
            Self::Banned => "banned",
            Self::Network => "network",
        })
    }
}

impl serde::Serialize for BanType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i8(self.as_repr())
    }
}

impl<'de> serde::Deserialize<'de> for BanType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;

        Self::from_repr(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ban type {value}")))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::PartialSchema for BanType {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        let object = utoipa::openapi::schema::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::Integer)
            .description(Some("-1 = unknown, 0 = ok, 1 = muted, 2 = banned, 3 = network"))
            .enum_values(Some([-1, 0, 1, 2, 3]))
            .build();

        utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::ToSchema for BanType {}

impl BanSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Steam => "ban_steam",
            Self::SteamFriend => "ban_steam_friend",
            Self::SteamGroup => "steam_group",
            Self::SteamNet => "ban_net",
            Self::Cidr => "cidr_block",
            Self::Asn => "ban_asn",
        }
    }
}

impl std::str::FromStr for BanSource {
    type Err = UnknownBanSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" => Ok(Self::None),
            "ban_steam" => Ok(Self::Steam),
            "ban_steam_friend" => Ok(Self::SteamFriend),
            "steam_group" => Ok(Self::SteamGroup),
            "ban_net" => Ok(Self::SteamNet),
            "cidr_block" => Ok(Self::Cidr),
            "ban_asn" => Ok(Self::Asn),
            _ => Err(UnknownBanSource { source: value.to_owned() }),
        }
    }
}

/// Resolves the ban that applies to `steam_id` connecting from `ip`.
///
/// Returns `None` if the player is not banned.
#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn get_ban_state(
    cx: &Context,
    steam_id: SteamId,
    ip: IpAddr,
) -> Result<Option<ActiveBan>, GetBanStateError> {
    let Some(state) = cx.ban_states().query_ban_state(steam_id, ip).await? else {
        return Ok(None);
    };

    if state.ban_id == 0 {
        return Ok(None);
    }

    let message = render_message(&state, Timestamp::now());

    Ok(Some(ActiveBan { state, message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn ban_types_are_ordered_by_severity() {
        assert!(BanType::Unknown < BanType::Ok);
        assert!(BanType::Ok < BanType::NoComm);
        assert!(BanType::NoComm < BanType::Banned);
        assert!(BanType::Banned < BanType::Network);
    }

    #[test]
    fn ban_types_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&BanType::Unknown).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&BanType::Banned).unwrap(), "2");
        assert_eq!(serde_json::from_str::<BanType>("1").unwrap(), BanType::NoComm);
        assert!(serde_json::from_str::<BanType>("4").is_err());
    }

    #[test]
    fn ban_sources_round_trip_through_their_names() {
        for source in [
            BanSource::None,
            BanSource::Steam,
            BanSource::SteamFriend,
            BanSource::SteamGroup,
            BanSource::SteamNet,
            BanSource::Cidr,
            BanSource::Asn,
        ] {
            assert_eq!(source.as_str().parse::<BanSource>().unwrap(), source);
            assert_eq!(serde_json::to_value(source).unwrap(), source.as_str());
        }

        assert!("ban_everything".parse::<BanSource>().is_err());
    }

    #[tokio::test]
    async fn unbanned_players_have_no_state() {
        let cx = testing::context();

        let state = get_ban_state(&cx, testing::steam_id(1), testing::ip("10.0.0.1"))
            .await
            .unwrap();

        assert_eq!(state, None);
    }

    #[tokio::test]
    async fn banned_players_get_a_message() {
        let (cx, fakes) = testing::context_with_fakes();
        let banned = testing::steam_id(1);
        fakes.bans.insert(testing::ban(banned, BanSource::Steam, BanType::Banned));

        let state = get_ban_state(&cx, banned, testing::ip("10.0.0.1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(state.state.steam_id, Some(banned));
        assert!(state.message.unwrap().starts_with("Banned\nReason: Cheating (Steam)"));
    }

    #[tokio::test]
    async fn lookup_failures_propagate() {
        let (cx, fakes) = testing::context_with_fakes();
        fakes.bans.fail_next();

        assert!(get_ban_state(&cx, testing::steam_id(1), testing::ip("10.0.0.1")).await.is_err());
    }
}
