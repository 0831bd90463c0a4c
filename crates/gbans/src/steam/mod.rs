//! Resolving the different ways people refer to Steam accounts.
//!
//! Moderators paste whatever they have at hand: a SteamID in any format, a link to a profile, or
//! just the account's custom URL name. Only the last one needs to ask Steam.

use crate::steam_id::ParseSteamIdError;
use crate::SteamId;

mod web_api;
pub use web_api::{SteamWebApi, WithoutWebApi};

#[derive(Debug, Display, Error)]
#[display("failed to resolve vanity name: {_0}")]
pub struct ResolveVanityError(Box<dyn std::error::Error + Send + Sync>);

impl ResolveVanityError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Turns vanity names (the `N` in `steamcommunity.com/id/N`) into SteamIDs.
#[async_trait::async_trait]
pub trait SteamIdResolver: Send + Sync {
    /// Returns `None` if no account uses `vanity`.
    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<SteamId>, ResolveVanityError>;
}

/// A parsed reference to a Steam account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteamLookup<'a> {
    SteamId(SteamId),
    Vanity(&'a str),
}

#[derive(Debug, Display, Error, From)]
pub enum ResolveSteamIdError {
    #[display("{_0}")]
    #[from]
    Invalid(ParseSteamIdError),

    #[display("no steam account uses the vanity name `{vanity}`")]
    UnknownVanity { vanity: String },

    #[display("{_0}")]
    #[from]
    Resolve(ResolveVanityError),
}

impl<'a> SteamLookup<'a> {
    /// Parses a SteamID (any format [`SteamId::parse()`] accepts), a
    /// `steamcommunity.com/profiles/…` or `steamcommunity.com/id/…` URL, or a bare vanity name.
    pub fn parse(input: &'a str) -> Result<Self, ParseSteamIdError> {
        let input = input.trim();

        let steam_id_error = match SteamId::parse(input) {
            Ok(steam_id) => return Ok(Self::SteamId(steam_id)),
            Err(error) => error,
        };

        if let Some(path) = community_path(input) {
            let path = path.trim_end_matches('/');

            if let Some(steam_id) = path.strip_prefix("profiles/") {
                return SteamId::parse(steam_id).map(Self::SteamId);
            }

            return path
                .strip_prefix("id/")
                .filter(|vanity| is_vanity(vanity))
                .map(Self::Vanity)
                .ok_or(ParseSteamIdError::new("unsupported profile URL"));
        }

        if is_vanity(input) {
            return Ok(Self::Vanity(input));
        }

        Err(steam_id_error)
    }
}

/// Resolves `input` into a SteamID, asking `resolver` for vanity names.
#[tracing::instrument(skip(resolver), err(level = "debug"))]
pub async fn resolve_steam_id(
    resolver: &dyn SteamIdResolver,
    input: &str,
) -> Result<SteamId, ResolveSteamIdError> {
    match SteamLookup::parse(input)? {
        SteamLookup::SteamId(steam_id) => Ok(steam_id),
        SteamLookup::Vanity(vanity) => resolver
            .resolve_vanity(vanity)
            .await?
            .ok_or_else(|| ResolveSteamIdError::UnknownVanity { vanity: vanity.to_owned() }),
    }
}

/// Strips the scheme and host off a Steam community URL.
fn community_path(input: &str) -> Option<&str> {
    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    rest.strip_prefix("www.")
        .unwrap_or(rest)
        .strip_prefix("steamcommunity.com/")
}

/// Custom URLs are 2-32 ASCII letters, digits, `_` or `-`.
fn is_vanity(value: &str) -> bool {
    (2..=32).contains(&value.len())
        && value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSteamIdResolver;

    const ALPHAKEKS: u64 = 76561198282622073;

    fn alphakeks() -> SteamId {
        SteamId::from_u64(ALPHAKEKS).unwrap()
    }

    #[test]
    fn parses_ids_and_urls() {
        let expected = SteamLookup::SteamId(alphakeks());

        assert_eq!(SteamLookup::parse("STEAM_1:1:161178172").unwrap(), expected);
        assert_eq!(
            SteamLookup::parse("https://steamcommunity.com/profiles/76561198282622073/").unwrap(),
            expected,
        );
        assert_eq!(
            SteamLookup::parse("steamcommunity.com/profiles/[U:1:322356345]").unwrap(),
            expected,
        );
        assert_eq!(
            SteamLookup::parse("https://steamcommunity.com/id/alphakeks").unwrap(),
            SteamLookup::Vanity("alphakeks"),
        );
        assert_eq!(SteamLookup::parse("alpha_keks").unwrap(), SteamLookup::Vanity("alpha_keks"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(SteamLookup::parse("").is_err());
        assert!(SteamLookup::parse("not a vanity").is_err());
        assert!(SteamLookup::parse("https://steamcommunity.com/groups/kz").is_err());
        assert!(SteamLookup::parse("https://steamcommunity.com/profiles/alphakeks").is_err());
    }

    #[tokio::test]
    async fn resolves_vanity_names() {
        let resolver = FakeSteamIdResolver::default();
        resolver.insert("alphakeks", alphakeks());

        let resolved = resolve_steam_id(&resolver, "https://steamcommunity.com/id/alphakeks")
            .await
            .unwrap();

        assert_eq!(resolved, alphakeks());

        let unknown = resolve_steam_id(&resolver, "nobody").await.unwrap_err();
        assert!(matches!(unknown, ResolveSteamIdError::UnknownVanity { .. }));

        resolver.fail_next();

        let failed = resolve_steam_id(&resolver, "alphakeks").await.unwrap_err();
        assert!(matches!(failed, ResolveSteamIdError::Resolve(_)));
    }
}
