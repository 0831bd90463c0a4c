use axum::extract::{FromRef, State};
use axum::response::NoContent;
use axum::routing::{MethodRouter, Router};
use gbans::Context;
use gbans::sourcemod::immunities::{self, CreateGroupImmunityError, DeleteGroupImmunityError};
use gbans::sourcemod::{GroupId, GroupImmunity, GroupImmunityId};

use crate::extract::{Json, Path};
use crate::response::ErrorResponse;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    Router::new()
        .route(
            "/group_immunity",
            MethodRouter::new()
                .get(get_group_immunities)
                .post(create_group_immunity),
        )
        .route(
            "/group_immunity/{group_immunity_id}",
            MethodRouter::new().delete(delete_group_immunity),
        )
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct GroupImmunityRequest {
    /// The group that becomes immune.
    #[schema(value_type = u32)]
    group_id: GroupId,

    /// The group whose members can no longer target `group_id`.
    #[schema(value_type = u32)]
    other_id: GroupId,
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/group_immunity",
    tag = "SourceMod Groups",
    responses(
        (status = 200, body = Vec<GroupImmunity>),
        (status = 401,),
    ),
)]
pub async fn get_group_immunities(
    State(cx): State<Context>,
) -> Result<Json<Vec<GroupImmunity>>, ErrorResponse> {
    immunities::get(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Makes one group immune to another.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/group_immunity",
    tag = "SourceMod Groups",
    request_body = GroupImmunityRequest,
    responses(
        (status = 200, body = GroupImmunity),
        (status = 400, description = "a group cannot be immune to itself"),
        (status = 401,),
        (status = 404, description = "one of the groups does not exist"),
        (status = 409, description = "the immunity already exists"),
    ),
)]
pub async fn create_group_immunity(
    State(cx): State<Context>,
    Json(GroupImmunityRequest { group_id, other_id }): Json<GroupImmunityRequest>,
) -> Result<Json<GroupImmunity>, ErrorResponse> {
    immunities::create(&cx, group_id, other_id)
        .await
        .map(Json)
        .map_err(|err| match err {
            CreateGroupImmunityError::SelfImmunity => ErrorResponse::self_immunity(),
            CreateGroupImmunityError::GroupNotFound => ErrorResponse::not_found(),
            CreateGroupImmunityError::AlreadyExists => ErrorResponse::immunity_already_exists(),
            CreateGroupImmunityError::Database(error) => {
                ErrorResponse::internal_server_error(error)
            },
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/group_immunity/{group_immunity_id}",
    tag = "SourceMod Groups",
    params(("group_immunity_id" = u32, Path, description = "the immunity's ID")),
    responses(
        (status = 204,),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn delete_group_immunity(
    State(cx): State<Context>,
    Path(group_immunity_id): Path<GroupImmunityId>,
) -> Result<NoContent, ErrorResponse> {
    immunities::delete(&cx, group_immunity_id)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            DeleteGroupImmunityError::NotFound => ErrorResponse::not_found(),
            DeleteGroupImmunityError::Database(error) => {
                ErrorResponse::internal_server_error(error)
            },
        })
}
