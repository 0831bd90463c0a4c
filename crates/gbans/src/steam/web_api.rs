use super::{ResolveVanityError, SteamIdResolver};
use crate::SteamId;

/// Steam Web API URL for resolving custom profile URLs.
const RESOLVE_VANITY_URL: &str = "https://api.steampowered.com/ISteamUser/ResolveVanityURL/v0001";

/// `success` value Steam uses for "no account has this name".
const NO_MATCH: u8 = 42;

/// Resolves vanity names through Steam's Web API.
#[derive(Debug, Clone)]
pub struct SteamWebApi {
    http_client: reqwest::Client,

    #[debug("<redacted>")]
    api_key: String,
}

impl SteamWebApi {
    pub fn new(http_client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self { http_client, api_key: api_key.into() }
    }
}

#[async_trait::async_trait]
impl SteamIdResolver for SteamWebApi {
    #[tracing::instrument(skip(self), ret(level = "debug"), err(level = "debug"))]
    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<SteamId>, ResolveVanityError> {
        #[derive(serde::Serialize)]
        struct Query<'a> {
            #[serde(rename = "key")]
            api_key: &'a str,

            #[serde(rename = "vanityurl")]
            vanity: &'a str,
        }

        #[derive(Debug, serde::Deserialize)]
        struct ApiResponse<T> {
            response: T,
        }

        #[derive(Debug, serde::Deserialize)]
        struct ResolveVanityResponse {
            success: u8,
            steamid: Option<SteamId>,
            message: Option<String>,
        }

        let ApiResponse { response } = self
            .http_client
            .get(RESOLVE_VANITY_URL)
            .query(&Query { api_key: &self.api_key, vanity })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(ResolveVanityError::new)?
            .json::<ApiResponse<ResolveVanityResponse>>()
            .await
            .map_err(ResolveVanityError::new)?;

        match response {
            ResolveVanityResponse { success: 1, steamid: Some(steam_id), .. } => Ok(Some(steam_id)),
            ResolveVanityResponse { success: NO_MATCH, .. } => Ok(None),
            ResolveVanityResponse { success, message, .. } => Err(ResolveVanityError::new(format!(
                "steam returned {success}: {}",
                message.as_deref().unwrap_or("no message"),
            ))),
        }
    }
}

/// Used when no Web API key is configured; only SteamIDs and profile URLs can be resolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct WithoutWebApi;

#[async_trait::async_trait]
impl SteamIdResolver for WithoutWebApi {
    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<SteamId>, ResolveVanityError> {
        warn!(vanity, "cannot resolve vanity name without a steam web api key");
        Err(ResolveVanityError::new("no steam web api key configured"))
    }
}
