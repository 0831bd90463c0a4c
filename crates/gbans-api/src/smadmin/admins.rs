use axum::extract::{FromRef, State};
use axum::response::NoContent;
use axum::routing::{MethodRouter, Router};
use gbans::Context;
use gbans::sourcemod::admins::{
    self,
    AddAdminGroupError,
    AdminUpdate,
    CreateAdminError,
    DeleteAdminError,
    NewAdmin,
    RemoveAdminGroupError,
    SetAdminGroupsError,
    UpdateAdminError,
};
use gbans::sourcemod::{Admin, AdminId, AuthType, EffectivePermissions, GroupId};

use crate::extract::{Json, Path};
use crate::response::ErrorResponse;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Context: FromRef<S>,
{
    Router::new()
        .route("/admins", MethodRouter::new().get(get_admins).post(create_admin))
        .route("/admins/groups", MethodRouter::new().put(set_admin_groups))
        .route("/admins/{admin_id}", MethodRouter::new().post(update_admin).delete(delete_admin))
        .route("/admins/{admin_id}/groups", MethodRouter::new().post(add_admin_group))
        .route("/admins/{admin_id}/groups/{group_id}", MethodRouter::new().delete(remove_admin_group))
        .route("/admins/{admin_id}/permissions", MethodRouter::new().get(get_admin_permissions))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct AdminRequest {
    auth_type: AuthType,

    /// A SteamID (any format) for `steam`, an IP address for `ip`, or the player name for
    /// `name`.
    identity: String,

    /// Required for `name` admins.
    #[serde(default)]
    #[debug(skip)]
    password: String,

    #[serde(default)]
    flags: String,

    name: String,

    /// `0..=100`
    #[serde(default)]
    immunity: i64,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct AdminGroupRequest {
    #[schema(value_type = u32)]
    group_id: GroupId,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct SetAdminGroupsRequest {
    auth_type: AuthType,
    identity: String,

    /// The new group list, in inheritance order.
    #[schema(value_type = Vec<u32>)]
    group_ids: Vec<GroupId>,
}

/// Returns every admin together with their groups.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/admins",
    tag = "SourceMod Admins",
    responses(
        (status = 200, body = Vec<Admin>),
        (status = 401,),
    ),
)]
pub async fn get_admins(State(cx): State<Context>) -> Result<Json<Vec<Admin>>, ErrorResponse> {
    admins::get(&cx)
        .await
        .map(Json)
        .map_err(|err| ErrorResponse::internal_server_error(err))
}

/// Registers a new admin.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/admins",
    tag = "SourceMod Admins",
    request_body = AdminRequest,
    responses(
        (status = 200, body = Admin),
        (status = 400, description = "invalid identity, flags, or immunity"),
        (status = 401,),
        (status = 409, description = "an admin with this identity already exists"),
        (status = 422, description = "invalid request body"),
    ),
)]
pub async fn create_admin(
    State(cx): State<Context>,
    Json(request): Json<AdminRequest>,
) -> Result<Json<Admin>, ErrorResponse> {
    let admin = NewAdmin {
        name: &request.name,
        auth_type: request.auth_type,
        identity: &request.identity,
        flags: &request.flags,
        immunity: request.immunity,
        password: &request.password,
    };

    admins::create(&cx, admin)
        .await
        .map(Json)
        .map_err(|err| match err {
            CreateAdminError::InvalidAdmin(error) => ErrorResponse::invalid_admin(error),
            CreateAdminError::AdminExists => ErrorResponse::admin_already_exists(),
            CreateAdminError::ResolveSteamId(error) => ErrorResponse::internal_server_error(error),
            CreateAdminError::GetPerson(error) => ErrorResponse::internal_server_error(error),
            CreateAdminError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Replaces an admin's attributes.
///
/// Group memberships are left untouched.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/admins/{admin_id}",
    tag = "SourceMod Admins",
    params(("admin_id" = u32, Path, description = "the admin's ID")),
    request_body = AdminRequest,
    responses(
        (status = 200, body = Admin),
        (status = 400, description = "invalid identity, flags, or immunity"),
        (status = 401,),
        (status = 404,),
        (status = 409, description = "another admin with this identity already exists"),
    ),
)]
pub async fn update_admin(
    State(cx): State<Context>,
    Path(admin_id): Path<AdminId>,
    Json(request): Json<AdminRequest>,
) -> Result<Json<Admin>, ErrorResponse> {
    let update = AdminUpdate {
        id: admin_id,
        name: &request.name,
        auth_type: request.auth_type,
        identity: &request.identity,
        flags: &request.flags,
        immunity: request.immunity,
        password: &request.password,
    };

    admins::update(&cx, update)
        .await
        .map(Json)
        .map_err(|err| match err {
            UpdateAdminError::InvalidAdmin(error) => ErrorResponse::invalid_admin(error),
            UpdateAdminError::AdminNotFound => ErrorResponse::not_found(),
            UpdateAdminError::AdminExists => ErrorResponse::admin_already_exists(),
            UpdateAdminError::ResolveSteamId(error) => ErrorResponse::internal_server_error(error),
            UpdateAdminError::GetPerson(error) => ErrorResponse::internal_server_error(error),
            UpdateAdminError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/admins/{admin_id}",
    tag = "SourceMod Admins",
    params(("admin_id" = u32, Path, description = "the admin's ID")),
    responses(
        (status = 204,),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn delete_admin(
    State(cx): State<Context>,
    Path(admin_id): Path<AdminId>,
) -> Result<NoContent, ErrorResponse> {
    admins::delete(&cx, admin_id)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            DeleteAdminError::AdminNotFound => ErrorResponse::not_found(),
            DeleteAdminError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Adds an admin to a group.
///
/// The group is appended to the end of the admin's inheritance list.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    post,
    path = "/api/smadmin/admins/{admin_id}/groups",
    tag = "SourceMod Admins",
    params(("admin_id" = u32, Path, description = "the admin's ID")),
    request_body = AdminGroupRequest,
    responses(
        (status = 200, body = Admin),
        (status = 401,),
        (status = 404, description = "the admin or group does not exist"),
        (status = 409, description = "the admin is already a member of the group"),
    ),
)]
pub async fn add_admin_group(
    State(cx): State<Context>,
    Path(admin_id): Path<AdminId>,
    Json(AdminGroupRequest { group_id }): Json<AdminGroupRequest>,
) -> Result<Json<Admin>, ErrorResponse> {
    admins::add_group(&cx, admin_id, group_id)
        .await
        .map(Json)
        .map_err(|err| match err {
            AddAdminGroupError::AdminNotFound | AddAdminGroupError::GroupNotFound => {
                ErrorResponse::not_found()
            },
            AddAdminGroupError::AlreadyInGroup => ErrorResponse::already_in_group(),
            AddAdminGroupError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

#[tracing::instrument(skip(cx))]
#[utoipa::path(
    delete,
    path = "/api/smadmin/admins/{admin_id}/groups/{group_id}",
    tag = "SourceMod Admins",
    params(
        ("admin_id" = u32, Path, description = "the admin's ID"),
        ("group_id" = u32, Path, description = "the group's ID"),
    ),
    responses(
        (status = 200, body = Admin),
        (status = 401,),
        (status = 404, description = "the admin or group does not exist"),
        (status = 409, description = "the admin is not a member of the group"),
    ),
)]
pub async fn remove_admin_group(
    State(cx): State<Context>,
    Path((admin_id, group_id)): Path<(AdminId, GroupId)>,
) -> Result<Json<Admin>, ErrorResponse> {
    admins::remove_group(&cx, admin_id, group_id)
        .await
        .map(Json)
        .map_err(|err| match err {
            RemoveAdminGroupError::AdminNotFound | RemoveAdminGroupError::GroupNotFound => {
                ErrorResponse::not_found()
            },
            RemoveAdminGroupError::NotInGroup => ErrorResponse::not_in_group(),
            RemoveAdminGroupError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Replaces the group list of the admin with the given identity.
///
/// An empty list removes the admin from every group.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    put,
    path = "/api/smadmin/admins/groups",
    tag = "SourceMod Admins",
    request_body = SetAdminGroupsRequest,
    responses(
        (status = 204,),
        (status = 401,),
        (status = 400, description = "invalid identity"),
        (status = 404, description = "the admin or one of the groups does not exist"),
    ),
)]
pub async fn set_admin_groups(
    State(cx): State<Context>,
    Json(SetAdminGroupsRequest { auth_type, identity, group_ids }): Json<SetAdminGroupsRequest>,
) -> Result<NoContent, ErrorResponse> {
    admins::set_groups(&cx, auth_type, &identity, &group_ids)
        .await
        .map(|()| NoContent)
        .map_err(|err| match err {
            SetAdminGroupsError::AdminNotFound | SetAdminGroupsError::GroupNotFound(_) => {
                ErrorResponse::not_found()
            },
            SetAdminGroupsError::InvalidIdentity(error) => ErrorResponse::invalid_admin(error),
            SetAdminGroupsError::ResolveSteamId(error) => {
                ErrorResponse::internal_server_error(error)
            },
            SetAdminGroupsError::Database(error) => ErrorResponse::internal_server_error(error),
        })
}

/// Returns the flags and immunity an admin ends up with after group inheritance.
#[tracing::instrument(skip(cx))]
#[utoipa::path(
    get,
    path = "/api/smadmin/admins/{admin_id}/permissions",
    tag = "SourceMod Admins",
    params(("admin_id" = u32, Path, description = "the admin's ID")),
    responses(
        (status = 200, body = EffectivePermissions),
        (status = 401,),
        (status = 404,),
    ),
)]
pub async fn get_admin_permissions(
    State(cx): State<Context>,
    Path(admin_id): Path<AdminId>,
) -> Result<Json<EffectivePermissions>, ErrorResponse> {
    admins::get_by_id(&cx, admin_id)
        .await
        .map_err(|err| ErrorResponse::internal_server_error(err))?
        .map(|admin| Json(admin.effective_permissions()))
        .ok_or_else(ErrorResponse::not_found)
}
