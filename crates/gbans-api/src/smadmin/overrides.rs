use axum::extract::{FromRef, State};
use axum::response::NoContent;
use axum::routing::{MethodRouter, Router};
use gbans::Context;
use gbans::sourcemod::overrides::{
    self,
    CreateOverrideError,
    DeleteOverrideError,
    NewOverride,
    OverrideType,
    OverrideUpdate,
    UpdateOverrideError,
};
use gbans::sourcemod::{Override, OverrideId};

use crate::extract::{Json, Path};
use crate::response::ErrorResponse;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    Router::new()
        .route("/overrides", MethodRouter::new().get(get_overrides).post(create_override))
        .route(
            "/overrides/{override_id}",
            MethodRouter::new()
                .post(update_override)
                .delete(delete_override),
        )
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct OverrideRequest {
    /// The command, or command group, this override applies to.
    name: String,

    #[serde(rename = "type")]
    kind: OverrideType,

    /// The flags required to use the command.
    flags: String,
}

/// Returns every global override.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/overrides",
    tag = "SourceMod Overrides",
    responses(
        (status = 200, body = Vec<Override>),
        (status = 401,),
    ),
)]
pub async fn get_overrides(
    State(cx): State<Context>,
) -> Result<Json<Vec<Override>>, ErrorResponse> {
    overrides::get_overrides(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Changes the flags required to use a command.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/overrides",
    tag = "SourceMod Overrides",
    request_body = OverrideRequest,
    responses(
        (status = 200, body = Override),
        (status = 400, description = "invalid flags or empty name"),
        (status = 401,),
        (status = 409, description = "an override for this command already exists"),
    ),
)]
pub async fn create_override(
    State(cx): State<Context>,
    Json(OverrideRequest { name, kind, flags }): Json<OverrideRequest>,
) -> Result<Json<Override>, ErrorResponse> {
    overrides::create_override(&cx, NewOverride { name: &name, kind, flags: &flags })
        .await
        .map(Json)
        .map_err(|err| match err {
            CreateOverrideError::InvalidOverride(error) => ErrorResponse::invalid_override(error),
            CreateOverrideError::AlreadyExists => ErrorResponse::override_already_exists(),
            CreateOverrideError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/overrides/{override_id}",
    tag = "SourceMod Overrides",
    params(("override_id" = u32, Path, description = "the override's ID")),
    request_body = OverrideRequest,
    responses(
        (status = 200, body = Override),
        (status = 400, description = "invalid flags or empty name"),
        (status = 401,),
        (status = 404,),
        (status = 409, description = "an override for this command already exists"),
    ),
)]
pub async fn update_override(
    State(cx): State<Context>,
    Path(override_id): Path<OverrideId>,
    Json(OverrideRequest { name, kind, flags }): Json<OverrideRequest>,
) -> Result<Json<Override>, ErrorResponse> {
    let update = OverrideUpdate { id: override_id, name: &name, kind, flags: &flags };

    overrides::update_override(&cx, update)
        .await
        .map(Json)
        .map_err(|err| match err {
            UpdateOverrideError::InvalidOverride(error) => ErrorResponse::invalid_override(error),
            UpdateOverrideError::NotFound => ErrorResponse::not_found(),
            UpdateOverrideError::AlreadyExists => ErrorResponse::override_already_exists(),
            UpdateOverrideError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/overrides/{override_id}",
    tag = "SourceMod Overrides",
    params(("override_id" = u32, Path, description = "the override's ID")),
    responses(
        (status = 204,),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn delete_override(
    State(cx): State<Context>,
    Path(override_id): Path<OverrideId>,
) -> Result<NoContent, ErrorResponse> {
    overrides::delete_override(&cx, override_id)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            DeleteOverrideError::NotFound => ErrorResponse::not_found(),
            DeleteOverrideError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}
