use axum::extract::{FromRef, State};
use axum::response::NoContent;
use axum::routing::{MethodRouter, Router};
use gbans::Context;
use gbans::sourcemod::groups::{
    self,
    CreateGroupError,
    DeleteGroupError,
    GroupUpdate,
    NewGroup,
    UpdateGroupError,
};
use gbans::sourcemod::overrides::{
    self,
    CreateGroupOverrideError,
    DeleteOverrideError,
    GetGroupOverridesError,
    GroupOverrideUpdate,
    NewGroupOverride,
    OverrideAccess,
    OverrideType,
    UpdateGroupOverrideError,
};
use gbans::sourcemod::{Group, GroupId, GroupOverride, GroupOverrideId};

use crate::extract::{Json, Path};
use crate::response::{Created, ErrorResponse};

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    Router::new()
        .route("/groups", MethodRouter::new().get(get_groups).post(create_group))
        .route("/groups/{group_id}", MethodRouter::new().post(update_group).delete(delete_group))
        .route(
            "/groups/{group_id}/overrides",
            MethodRouter::new()
                .get(get_group_overrides)
                .post(create_group_override),
        )
        .route(
            "/groups_overrides/{group_override_id}",
            MethodRouter::new()
                .post(update_group_override)
                .delete(delete_group_override),
        )
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct GroupRequest {
    name: String,

    #[serde(default)]
    flags: String,

    /// `0..=100`
    #[serde(default)]
    immunity: i64,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct GroupOverrideRequest {
    name: String,

    #[serde(rename = "type")]
    kind: OverrideType,

    access: OverrideAccess,
}

/// Returns every group.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/groups",
    tag = "SourceMod Groups",
    responses(
        (status = 200, body = Vec<Group>),
        (status = 401,),
    ),
)]
pub async fn get_groups(State(cx): State<Context>) -> Result<Json<Vec<Group>>, ErrorResponse> {
    groups::get(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Creates a new group.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/groups",
    tag = "SourceMod Groups",
    request_body = GroupRequest,
    responses(
        (status = 201, body = Group),
        (status = 400, description = "invalid flags, immunity, or empty name"),
        (status = 401,),
        (status = 409, description = "the name is already taken"),
        (status = 422, description = "invalid request body"),
    ),
)]
pub async fn create_group(
    State(cx): State<Context>,
    Json(GroupRequest { name, flags, immunity }): Json<GroupRequest>,
) -> Result<Created<Group>, ErrorResponse> {
    let group = NewGroup { name: &name, flags: &flags, immunity_level: immunity };

    groups::create(&cx, group)
        .await
        .map(Created)
        .map_err(|err| match err {
            CreateGroupError::InvalidGroup(error) => ErrorResponse::invalid_group(error),
            CreateGroupError::NameTaken => ErrorResponse::group_name_taken(),
            CreateGroupError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Replaces a group's name, flags and immunity level.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/groups/{group_id}",
    tag = "SourceMod Groups",
    params(("group_id" = u32, Path, description = "the group's ID")),
    request_body = GroupRequest,
    responses(
        (status = 200, body = Group),
        (status = 400, description = "invalid flags, immunity, or empty name"),
        (status = 401,),
        (status = 404,),
        (status = 409, description = "the name is already taken"),
    ),
)]
pub async fn update_group(
    State(cx): State<Context>,
    Path(group_id): Path<GroupId>,
    Json(GroupRequest { name, flags, immunity }): Json<GroupRequest>,
) -> Result<Json<Group>, ErrorResponse> {
    let update = GroupUpdate { id: group_id, name: &name, flags: &flags, immunity_level: immunity };

    groups::update(&cx, update)
        .await
        .map(Json)
        .map_err(|err| match err {
            UpdateGroupError::InvalidGroup(error) => ErrorResponse::invalid_group(error),
            UpdateGroupError::GroupNotFound => ErrorResponse::not_found(),
            UpdateGroupError::NameTaken => ErrorResponse::group_name_taken(),
            UpdateGroupError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Deletes a group.
///
/// Memberships, group overrides and immunities referencing the group are removed as well.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/groups/{group_id}",
    tag = "SourceMod Groups",
    params(("group_id" = u32, Path, description = "the group's ID")),
    responses(
        (status = 204,),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn delete_group(
    State(cx): State<Context>,
    Path(group_id): Path<GroupId>,
) -> Result<NoContent, ErrorResponse> {
    groups::delete(&cx, group_id)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            DeleteGroupError::GroupNotFound => ErrorResponse::not_found(),
            DeleteGroupError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Returns the overrides of a group.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/groups/{group_id}/overrides",
    tag = "SourceMod Groups",
    params(("group_id" = u32, Path, description = "the group's ID")),
    responses(
        (status = 200, body = Vec<GroupOverride>),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn get_group_overrides(
    State(cx): State<Context>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Vec<GroupOverride>>, ErrorResponse> {
    overrides::get_group_overrides(&cx, group_id)
        .await
        .map(Json)
        .map_err(|err| match err {
            GetGroupOverridesError::GroupNotFound => ErrorResponse::not_found(),
            GetGroupOverridesError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Allows or denies a command for the members of a group.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/groups/{group_id}/overrides",
    tag = "SourceMod Groups",
    params(("group_id" = u32, Path, description = "the group's ID")),
    request_body = GroupOverrideRequest,
    responses(
        (status = 200, body = GroupOverride),
        (status = 400, description = "empty name"),
        (status = 401,),
        (status = 404,),
        (status = 409, description = "the group already has an override for this command"),
    ),
)]
pub async fn create_group_override(
    State(cx): State<Context>,
    Path(group_id): Path<GroupId>,
    Json(GroupOverrideRequest { name, kind, access }): Json<GroupOverrideRequest>,
) -> Result<Json<GroupOverride>, ErrorResponse> {
    let group_override = NewGroupOverride { name: &name, kind, access };

    overrides::create_group_override(&cx, group_id, group_override)
        .await
        .map(Json)
        .map_err(|err| match err {
            CreateGroupOverrideError::InvalidOverride(error) => {
                ErrorResponse::invalid_override(error)
            },
            CreateGroupOverrideError::GroupNotFound => ErrorResponse::not_found(),
            CreateGroupOverrideError::AlreadyExists => ErrorResponse::override_already_exists(),
            CreateGroupOverrideError::Database(error) => {
                ErrorResponse::internal_server_error(error)
            },
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/groups_overrides/{group_override_id}",
    tag = "SourceMod Groups",
    params(("group_override_id" = u32, Path, description = "the group override's ID")),
    request_body = GroupOverrideRequest,
    responses(
        (status = 200, body = GroupOverride),
        (status = 400, description = "empty name"),
        (status = 401,),
        (status = 404,),
        (status = 409, description = "the group already has an override for this command"),
    ),
)]
pub async fn update_group_override(
    State(cx): State<Context>,
    Path(group_override_id): Path<GroupOverrideId>,
    Json(GroupOverrideRequest { name, kind, access }): Json<GroupOverrideRequest>,
) -> Result<Json<GroupOverride>, ErrorResponse> {
    let update = GroupOverrideUpdate { id: group_override_id, name: &name, kind, access };

    overrides::update_group_override(&cx, update)
        .await
        .map(Json)
        .map_err(|err| match err {
            UpdateGroupOverrideError::InvalidOverride(error) => {
                ErrorResponse::invalid_override(error)
            },
            UpdateGroupOverrideError::NotFound => ErrorResponse::not_found(),
            UpdateGroupOverrideError::AlreadyExists => ErrorResponse::override_already_exists(),
            UpdateGroupOverrideError::Database(error) => {
                ErrorResponse::internal_server_error(error)
            },
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/groups_overrides/{group_override_id}",
    tag = "SourceMod Groups",
    params(("group_override_id" = u32, Path, description = "the group override's ID")),
    responses(
        (status = 204,),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn delete_group_override(
    State(cx): State<Context>,
    Path(group_override_id): Path<GroupOverrideId>,
) -> Result<NoContent, ErrorResponse> {
    overrides::delete_group_override(&cx, group_override_id)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            DeleteOverrideError::NotFound => ErrorResponse::not_found(),
            DeleteOverrideError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}
