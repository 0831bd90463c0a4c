//! Endpoints polled by the game server plugin.
//!
//! Every route in here requires the access key of a configured game server.

use std::net::IpAddr;

use axum::extract::{FromRef, State};
use axum::routing::{self, Router};
use axum::Extension;
use gbans::bans::{BanType, Verdict};
use gbans::sourcemod::snapshots::{self, GroupsSnapshot, OverrideEntry, UsersSnapshot};
use gbans::{Context, SteamId};

use crate::config::AccessKeys;
use crate::extract::Json;
use crate::middleware::auth::{server_key, AuthenticatedServer, ServerKeyState};
use crate::response::ErrorResponse;

pub fn router<S>(cx: Context, access_keys: &AccessKeys) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    let is_server = axum::middleware::from_fn_with_state(
        ServerKeyState::new(cx, &access_keys.servers),
        server_key,
    );

    Router::new()
        .route("/check", routing::post(check_player))
        .route("/groups", routing::get(get_groups))
        .route("/overrides", routing::get(get_overrides))
        .route("/users", routing::get(get_users))
        .route("/seed", routing::post(request_seed))
        .route_layer(is_server)
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CheckRequest {
    /// The connecting player's SteamID, in any format.
    steam_id: String,

    /// The player's slot on the server; echoed back in the response.
    client_id: i32,

    /// The address the player is connecting from.
    ip: String,

    /// The player's name at the time of connecting.
    #[serde(default)]
    name: String,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct CheckResponse {
    client_id: i32,

    /// `-1` unknown, `0` ok, `1` no-comm, `2` banned, `3` network ban.
    ban_type: i8,

    /// The message shown to the player, or an empty string.
    msg: String,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct SeedRequest {
    /// The player asking for more players.
    #[schema(value_type = String)]
    steam_id: SteamId,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct SeedResponse {
    /// `false` if the request was rate-limited or the server has no one to notify.
    requested: bool,
}

/// Decides whether a connecting player may join.
///
/// This endpoint fails open: if anything goes wrong while checking, the player is let in and the
/// error is logged.
#[tracing::instrument(skip(cx, server), fields(server = %server.0))]
#[utoipa::path(
    post,
    path = "/api/sm/check",
    tag = "SourceMod Plugin",
    request_body = CheckRequest,
    responses(
        (status = 200, body = CheckResponse),
        (status = 401,),
        (status = 422, description = "invalid request body"),
    ),
)]
pub async fn check_player(
    State(cx): State<Context>,
    Extension(server): Extension<AuthenticatedServer>,
    Json(CheckRequest { steam_id, client_id, ip, name }): Json<CheckRequest>,
) -> Json<CheckResponse> {
    let verdict = match parse_player(&steam_id, &ip) {
        Ok((steam_id, ip)) => gbans::bans::check_player(&cx, steam_id, ip)
            .await
            .unwrap_or_else(|error| {
                error!(%error, %steam_id, %ip, "failed to check player; letting them in");
                Verdict::OK
            }),
        Err(reason) => {
            error!(%steam_id, %ip, reason, "received invalid player info; letting them in");
            Verdict::OK
        },
    };

    if verdict.ban_type > BanType::Ok {
        info!(%name, ban_type = ?verdict.ban_type, "rejecting player");
    }

    Json(CheckResponse {
        client_id,
        ban_type: verdict.ban_type.as_repr(),
        msg: verdict.message.unwrap_or_default(),
    })
}

fn parse_player(steam_id: &str, ip: &str) -> Result<(SteamId, IpAddr), &'static str> {
    let steam_id = steam_id.parse::<SteamId>().map_err(|_| "invalid SteamID")?;
    let ip = ip.parse::<IpAddr>().map_err(|_| "invalid IP address")?;

    Ok((steam_id, ip))
}

/// Returns every group and group immunity, in the shape the plugin caches them in.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/sm/groups",
    tag = "SourceMod Plugin",
    responses(
        (status = 200, body = GroupsSnapshot),
        (status = 401,),
    ),
)]
pub async fn get_groups(State(cx): State<Context>) -> Result<Json<GroupsSnapshot>, ErrorResponse> {
    snapshots::groups(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/sm/overrides",
    tag = "SourceMod Plugin",
    responses(
        (status = 200, body = Vec<OverrideEntry>),
        (status = 401,),
    ),
)]
pub async fn get_overrides(
    State(cx): State<Context>,
) -> Result<Json<Vec<OverrideEntry>>, ErrorResponse> {
    snapshots::overrides(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Returns every admin and their group memberships.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/sm/users",
    tag = "SourceMod Plugin",
    responses(
        (status = 200, body = UsersSnapshot),
        (status = 401,),
    ),
)]
pub async fn get_users(State(cx): State<Context>) -> Result<Json<UsersSnapshot>, ErrorResponse> {
    snapshots::users(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Asks for players to join the calling server.
///
/// Requests are rate-limited per server and per player.
#[tracing::instrument(skip(cx, server), fields(server = %server.0))]
#[utoipa::path(
    post,
    path = "/api/sm/seed",
    tag = "SourceMod Plugin",
    request_body = SeedRequest,
    responses(
        (status = 200, body = SeedResponse),
        (status = 401,),
        (status = 422, description = "invalid request body"),
    ),
)]
pub async fn request_seed(
    State(cx): State<Context>,
    Extension(server): Extension<AuthenticatedServer>,
    Json(SeedRequest { steam_id }): Json<SeedRequest>,
) -> Json<SeedResponse> {
    let requested = gbans::seed::request_seed(&cx, &server.0, steam_id);

    Json(SeedResponse { requested })
}

#[cfg(test)]
mod tests {
    use gbans::bans::BanSource;
    use gbans::sourcemod::admins;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{self, SERVER_KEY};

    const ALPHAKEKS: &str = "76561198282622073";

    fn check_request(steam_id: &str, ip: &str) -> http::Request<axum::body::Body> {
        testing::post(
            "/api/sm/check",
            SERVER_KEY,
            json!({ "steam_id": steam_id, "client_id": 7, "ip": ip, "name": "alpha" }),
        )
    }

    #[tokio::test]
    async fn unbanned_players_are_ok() {
        let (app, ..) = testing::app();

        let response = app
            .oneshot(check_request(ALPHAKEKS, "10.0.0.2"))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(testing::json::<CheckResponse>(response).await, CheckResponse {
            client_id: 7,
            ban_type: 0,
            msg: String::new(),
        });
    }

    #[tokio::test]
    async fn banned_players_get_a_message() {
        let (app, _, fakes) = testing::app();
        let steam_id = ALPHAKEKS.parse::<SteamId>().unwrap();

        fakes
            .bans
            .insert(gbans::testing::ban(steam_id, BanSource::Steam, BanType::Banned));

        let response = app
            .oneshot(check_request(ALPHAKEKS, "10.0.0.2"))
            .await
            .unwrap();

        let response = testing::json::<CheckResponse>(response).await;

        assert_eq!(response.client_id, 7);
        assert_eq!(response.ban_type, 2);
        assert!(response.msg.starts_with("Banned\n"), "{}", response.msg);
    }

    #[tokio::test]
    async fn check_fails_open() {
        let (app, _, fakes) = testing::app();
        let steam_id = ALPHAKEKS.parse::<SteamId>().unwrap();

        fakes
            .bans
            .insert(gbans::testing::ban(steam_id, BanSource::Steam, BanType::Banned));
        fakes.bans.fail_next();

        let response = app
            .clone()
            .oneshot(check_request(ALPHAKEKS, "10.0.0.2"))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(testing::json::<CheckResponse>(response).await.ban_type, 0);

        for (steam_id, ip) in [("not a steam id", "10.0.0.2"), (ALPHAKEKS, "10.0.0.256")] {
            let response = app.clone().oneshot(check_request(steam_id, ip)).await.unwrap();

            assert_eq!(response.status(), http::StatusCode::OK);
            assert_eq!(testing::json::<CheckResponse>(response).await.ban_type, 0);
        }
    }

    #[tokio::test]
    async fn requires_a_server_key() {
        let (app, ..) = testing::app();

        let missing = http::Request::get("/api/sm/users")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = app.clone().oneshot(missing).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(testing::get("/api/sm/users", "wrong"))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(testing::get("/api/sm/users", testing::ADMIN_KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn snapshots_are_never_null() {
        let (app, ..) = testing::app();

        let groups = app
            .clone()
            .oneshot(testing::get("/api/sm/groups", SERVER_KEY))
            .await
            .unwrap();

        assert_eq!(
            testing::json::<serde_json::Value>(groups).await,
            json!({ "groups": [], "immunities": [] }),
        );

        let overrides = app
            .clone()
            .oneshot(testing::get("/api/sm/overrides", SERVER_KEY))
            .await
            .unwrap();

        assert_eq!(testing::json::<serde_json::Value>(overrides).await, json!([]));

        let users = app
            .oneshot(testing::get("/api/sm/users", SERVER_KEY))
            .await
            .unwrap();

        assert_eq!(
            testing::json::<serde_json::Value>(users).await,
            json!({ "users": [], "user_groups": [] }),
        );
    }

    #[tokio::test]
    async fn users_snapshot_lists_admins() {
        let (app, cx, _) = testing::app();

        admins::create(&cx, gbans::testing::new_admin("alpha"))
            .await
            .unwrap();

        let users = app
            .oneshot(testing::get("/api/sm/users", SERVER_KEY))
            .await
            .unwrap();

        let users = testing::json::<serde_json::Value>(users).await;

        assert_eq!(users["users"][0]["authtype"], "name");
        assert_eq!(users["users"][0]["identity"], "alpha");
        assert_eq!(users["users"][0]["password"], "hunter2");
    }

    #[tokio::test]
    async fn seed_requests_are_rate_limited() {
        let (app, cx, fakes) = testing::app();
        let body = json!({ "steam_id": ALPHAKEKS });

        let first = app
            .clone()
            .oneshot(testing::post("/api/sm/seed", SERVER_KEY, body.clone()))
            .await
            .unwrap();

        assert_eq!(
            testing::json::<SeedResponse>(first).await,
            SeedResponse { requested: true },
        );

        let second = app
            .oneshot(testing::post("/api/sm/seed", SERVER_KEY, body))
            .await
            .unwrap();

        assert_eq!(
            testing::json::<SeedResponse>(second).await,
            SeedResponse { requested: false },
        );

        cx.cleanup().await;

        let sent = fakes.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].content.contains("connect 10.0.0.1:27015"));
    }
}
