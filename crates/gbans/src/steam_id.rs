//! A type for working with [Valve's SteamIDs].
//!
//! Only individual accounts in the public universe are representable. That is the only kind of
//! account that can join a game server or be registered as an admin.
//!
//! [Valve's SteamIDs]: https://developer.valvesoftware.com/wiki/SteamID

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// A 64-bit SteamID of an individual account.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SteamId(u64);

#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("invalid SteamID: {reason}")]
pub struct ParseSteamIdError {
    #[error(ignore)]
    reason: &'static str,
}

impl ParseSteamIdError {
    pub(crate) const fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

impl SteamId {
    /// The smallest valid individual account ID (`[U:1:1]`).
    pub const MIN: Self = Self(Self::BASE + 1);

    /// The largest valid individual account ID.
    pub const MAX: Self = Self(Self::BASE + u32::MAX as u64);

    /// `76561197960265728`, i.e. universe 1, individual account type, desktop instance.
    const BASE: u64 = 0x0110_0001_0000_0000;

    pub const fn from_u64(value: u64) -> Result<Self, ParseSteamIdError> {
        if value < Self::MIN.0 || value > Self::MAX.0 {
            return Err(ParseSteamIdError::new("value out of range"));
        }

        Ok(Self(value))
    }

    pub const fn from_account_id(account_id: u32) -> Result<Self, ParseSteamIdError> {
        if account_id == 0 {
            return Err(ParseSteamIdError::new("account ID cannot be 0"));
        }

        Ok(Self(Self::BASE + account_id as u64))
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The 32-bit account ID; the `N` in `[U:1:N]`.
    pub const fn account_id(self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let account_id = (self.0 - Self::BASE) as u32;

        account_id
    }

    /// Formats this SteamID as `STEAM_1:Y:Z`.
    pub fn steam2(self) -> String {
        let account_id = self.account_id();
        format!("STEAM_1:{}:{}", account_id & 1, account_id >> 1)
    }

    /// Formats this SteamID as `[U:1:N]`.
    ///
    /// This is the canonical form admin identities are stored in.
    pub fn steam3(self) -> String {
        format!("[U:1:{}]", self.account_id())
    }

    /// Parses any of the common textual representations.
    ///
    /// Accepted formats are the plain 64-bit integer, `STEAM_X:Y:Z`, and `[U:1:N]` (the brackets
    /// are optional).
    pub fn parse(value: &str) -> Result<Self, ParseSteamIdError> {
        let value = value.trim();

        if value.is_empty() {
            return Err(ParseSteamIdError::new("empty string"));
        }

        if let Some(rest) = value.strip_prefix("STEAM_") {
            return Self::parse_steam2(rest);
        }

        if value.starts_with('[') || value.starts_with("U:") {
            return Self::parse_steam3(value);
        }

        value
            .parse::<u64>()
            .map_err(|_| ParseSteamIdError::new("not a number"))
            .and_then(Self::from_u64)
    }

    fn parse_steam2(rest: &str) -> Result<Self, ParseSteamIdError> {
        let mut segments = rest.splitn(3, ':');

        match segments.next() {
            Some("0" | "1") => {},
            Some(_) => return Err(ParseSteamIdError::new("invalid universe segment")),
            None => return Err(ParseSteamIdError::new("missing universe segment")),
        }

        let y = match segments.next() {
            Some("0") => 0,
            Some("1") => 1,
            Some(_) => return Err(ParseSteamIdError::new("invalid Y segment")),
            None => return Err(ParseSteamIdError::new("missing Y segment")),
        };

        let z = segments
            .next()
            .ok_or(ParseSteamIdError::new("missing account number segment"))?
            .parse::<u32>()
            .map_err(|_| ParseSteamIdError::new("invalid account number segment"))?;

        let account_id = z
            .checked_mul(2)
            .and_then(|z| z.checked_add(y))
            .ok_or(ParseSteamIdError::new("account number out of range"))?;

        Self::from_account_id(account_id)
    }

    fn parse_steam3(value: &str) -> Result<Self, ParseSteamIdError> {
        let inner = match (value.strip_prefix('['), value.ends_with(']')) {
            (Some(rest), true) => rest.strip_suffix(']').unwrap_or(rest),
            (None, false) => value,
            (Some(_), false) | (None, true) => {
                return Err(ParseSteamIdError::new("inconsistent brackets"));
            },
        };

        let account_id = inner
            .strip_prefix("U:1:")
            .ok_or(ParseSteamIdError::new("expected `U:1:` prefix"))?
            .parse::<u32>()
            .map_err(|_| ParseSteamIdError::new("invalid account ID"))?;

        Self::from_account_id(account_id)
    }
}

impl fmt::Debug for SteamId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} ({})", self.0, self.steam3())
    }
}

impl fmt::Display for SteamId {
    /// SteamIDs are displayed as their 64-bit value, which is also how they are serialized.
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}

impl FromStr for SteamId {
    type Err = ParseSteamIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for SteamId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SteamId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = SteamId;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt.write_str("a SteamID")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                SteamId::from_u64(value).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .map_err(|_| E::custom("SteamID cannot be negative"))
                    .and_then(|value| self.visit_u64(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                SteamId::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

impl sqlx::Type<sqlx::MySql> for SteamId {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <u64 as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <u64 as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for SteamId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <u64 as sqlx::Encode<'q, sqlx::MySql>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for SteamId {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        <u64 as sqlx::Decode<'r, sqlx::MySql>>::decode(value)
            .and_then(|value| Self::from_u64(value).map_err(Into::into))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::PartialSchema for SteamId {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        let object = utoipa::openapi::schema::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::String)
            .description(Some("a 64-bit SteamID, `STEAM_X:Y:Z`, or `[U:1:N]`"))
            .examples([serde_json::json!("76561198282622073")])
            .build();

        utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object))
    }
}

#[cfg(feature = "utoipa")]
impl utoipa::ToSchema for SteamId {}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHAKEKS: u64 = 76561198282622073;

    #[test]
    fn parses_all_formats() {
        let expected = SteamId::from_u64(ALPHAKEKS).unwrap();

        assert_eq!(SteamId::parse("76561198282622073").unwrap(), expected);
        assert_eq!(SteamId::parse("STEAM_1:1:161178172").unwrap(), expected);
        assert_eq!(SteamId::parse("STEAM_0:1:161178172").unwrap(), expected);
        assert_eq!(SteamId::parse("[U:1:322356345]").unwrap(), expected);
        assert_eq!(SteamId::parse("U:1:322356345").unwrap(), expected);
    }

    #[test]
    fn formats_steam2_and_steam3() {
        let steam_id = SteamId::from_u64(ALPHAKEKS).unwrap();

        assert_eq!(steam_id.steam2(), "STEAM_1:1:161178172");
        assert_eq!(steam_id.steam3(), "[U:1:322356345]");
        assert_eq!(steam_id.to_string(), "76561198282622073");
    }

    #[test]
    fn rejects_garbage() {
        assert!(SteamId::parse("").is_err());
        assert!(SteamId::parse("hello").is_err());
        assert!(SteamId::parse("[U:1:322356345").is_err());
        assert!(SteamId::parse("STEAM_1:2:1").is_err());
        assert!(SteamId::parse("[U:1:0]").is_err());
        assert!(SteamId::from_u64(0).is_err());
    }

    #[test]
    fn deserializes_from_strings_and_numbers() {
        let from_str = serde_json::from_str::<SteamId>("\"[U:1:322356345]\"").unwrap();
        let from_int = serde_json::from_str::<SteamId>("76561198282622073").unwrap();

        assert_eq!(from_str, from_int);
        assert_eq!(serde_json::to_string(&from_int).unwrap(), "\"76561198282622073\"");
    }
}
