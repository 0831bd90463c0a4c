//! Bearer-token authentication.
//!
//! Moderation endpoints expect the admin key, plugin endpoints expect the key of a configured
//! game server. Both come from the `[access-keys]` section of the configuration file.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use gbans::Context;
use gbans::servers::{Server, ServerId};
use headers::authorization::{Authorization, Bearer};

use crate::config::ServerAccessKey;
use crate::extract::Header;
use crate::response::ErrorResponse;

/// Middleware guarding the moderation endpoints.
#[tracing::instrument(skip_all, err(Debug, level = "debug"))]
pub async fn admin_key(
    AdminKeyState { expected_key }: AdminKeyState,
    Header(Authorization(bearer)): Header<Authorization<Bearer>>,
    request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let expected_key = expected_key.ok_or(Rejection::NoAdminKey)?;

    if bearer.token() != &*expected_key {
        return Err(Rejection::KeyMismatch);
    }

    Ok(next.run(request).await)
}

/// Middleware guarding the plugin endpoints.
///
/// On success, the calling server is made available to handlers as an
/// [`Extension<AuthenticatedServer>`](axum::Extension).
#[tracing::instrument(skip_all, fields(server.id = tracing::field::Empty), err(Debug, level = "debug"))]
pub async fn server_key(
    ServerKeyState { cx, keys }: ServerKeyState,
    Header(Authorization(bearer)): Header<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let server_id = keys
        .iter()
        .find(|key| key.key == bearer.token())
        .map(|key| key.server_id)
        .ok_or(Rejection::KeyMismatch)?;

    tracing::Span::current().record("server.id", server_id.get());

    let server = cx
        .config()
        .servers
        .iter()
        .find(|server| server.id == server_id)
        .cloned()
        .ok_or(Rejection::UnknownServer(server_id))?;

    request.extensions_mut().insert(AuthenticatedServer(server));

    Ok(next.run(request).await)
}

/// The game server that authenticated the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedServer(pub Server);

#[derive(Clone, FromRequestParts)]
#[from_request(via(axum::extract::State))]
pub struct AdminKeyState {
    expected_key: Option<Arc<str>>,
}

impl AdminKeyState {
    pub fn new(expected_key: Option<&str>) -> Self {
        Self { expected_key: expected_key.map(Arc::from) }
    }
}

#[derive(Clone, FromRequestParts)]
#[from_request(via(axum::extract::State))]
pub struct ServerKeyState {
    cx: Context,
    keys: Arc<[ServerAccessKey]>,
}

impl ServerKeyState {
    pub fn new(cx: Context, keys: &[ServerAccessKey]) -> Self {
        Self { cx, keys: Arc::from(keys) }
    }
}

#[derive(Debug)]
pub enum Rejection {
    NoAdminKey,
    KeyMismatch,
    UnknownServer(ServerId),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::NoAdminKey => warn!("rejecting moderation request; no admin key is configured"),
            Self::UnknownServer(server_id) => {
                warn!(%server_id, "access key belongs to a server that is not configured");
            },
            Self::KeyMismatch => {},
        }

        ErrorResponse::unauthorized().into_response()
    }
}
