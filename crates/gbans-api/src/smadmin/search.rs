//! Autocomplete for moderation UIs.
//!
//! Results come from short-lived snapshots rather than the database, so they may lag behind
//! recent edits by up to the configured cache TTL.

use axum::extract::{FromRef, State};
use axum::routing::{self, Router};
use gbans::Context;
use gbans::sourcemod::search;
use gbans::sourcemod::{Admin, Group};

use crate::extract::{Json, Query};
use crate::response::ErrorResponse;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    Router::new()
        .route("/admins/search", routing::get(search_admins))
        .route("/groups/search", routing::get(search_groups))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for.
    #[serde(default)]
    q: String,
}

/// Searches admins by name and identity.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/admins/search",
    tag = "SourceMod Admins",
    params(SearchQuery),
    responses(
        (status = 200, body = Vec<Admin>),
        (status = 400, description = "invalid query parameters"),
        (status = 401,),
    ),
)]
pub async fn search_admins(
    State(cx): State<Context>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> Result<Json<Vec<Admin>>, ErrorResponse> {
    search::search_admins(&cx, &q)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Searches groups by name.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/groups/search",
    tag = "SourceMod Groups",
    params(SearchQuery),
    responses(
        (status = 200, body = Vec<Group>),
        (status = 400, description = "invalid query parameters"),
        (status = 401,),
    ),
)]
pub async fn search_groups(
    State(cx): State<Context>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> Result<Json<Vec<Group>>, ErrorResponse> {
    search::search_groups(&cx, &q)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}
