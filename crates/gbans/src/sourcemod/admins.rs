//! Admin identities and their group memberships.

use std::borrow::Cow;
use std::net::IpAddr;
use std::str::FromStr;

use crate::persons::GetOrCreatePersonError;
use crate::sourcemod::flags::{Flags, Immunity, InvalidFlag, InvalidImmunity};
use crate::sourcemod::groups::{Group, GroupId};
use crate::steam::{self, ResolveSteamIdError, ResolveVanityError};
use crate::steam_id::ParseSteamIdError;
use crate::time::Timestamp;
use crate::{Context, SteamId, database};

define_id_type! {
    /// A unique identifier for admins.
    pub struct AdminId(u32);
}

/// How the game server recognizes an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Steam,
    Name,
    Ip,
}

#[derive(Debug, Display, Error)]
#[display("unknown auth type")]
pub struct UnknownAuthType;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Admin {
    #[serde(rename = "admin_id")]
    pub id: AdminId,

    /// Only set for [`AuthType::Steam`] admins.
    pub steam_id: Option<SteamId>,

    pub auth_type: AuthType,

    /// `[U:1:N]` for steam admins, the IP literal for IP admins, and the plain name otherwise.
    pub identity: String,

    #[debug(skip)]
    pub password: String,

    pub flags: Flags,
    pub name: String,
    pub immunity: Immunity,

    /// Groups the admin is a member of, in inheritance order.
    pub groups: Vec<Group>,

    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

/// A validated set of admin attributes, as handed to the repository.
#[derive(Debug, Clone)]
pub struct AdminRecord {
    pub name: String,
    pub auth_type: AuthType,
    pub identity: String,
    pub steam_id: Option<SteamId>,

    #[debug(skip)]
    pub password: String,

    pub flags: Flags,
    pub immunity: Immunity,
}

#[derive(Debug)]
pub struct NewAdmin<'a> {
    pub name: &'a str,
    pub auth_type: AuthType,
    pub identity: &'a str,
    pub flags: &'a str,
    pub immunity: i64,

    #[debug(skip)]
    pub password: &'a str,
}

#[derive(Debug)]
pub struct AdminUpdate<'a> {
    pub id: AdminId,
    pub name: &'a str,
    pub auth_type: AuthType,
    pub identity: &'a str,
    pub flags: &'a str,
    pub immunity: i64,

    #[debug(skip)]
    pub password: &'a str,
}

#[derive(Debug, Display, Error, From)]
pub enum InvalidAdmin {
    #[display("{_0}")]
    #[from]
    InvalidSteamId(ParseSteamIdError),

    #[display("no steam account uses this vanity name")]
    UnknownSteamAccount,

    #[display("invalid ip, could not parse")]
    InvalidIp,

    #[display("invalid auth name")]
    EmptyName,

    #[display("name auth type requires password")]
    MissingPassword,

    #[display("{_0}")]
    #[from]
    Immunity(InvalidImmunity),

    #[display("{_0}")]
    #[from]
    Flag(InvalidFlag),
}

#[derive(Debug, Display, Error, From)]
#[display("failed to get admins")]
#[from(forward)]
pub struct GetAdminsError(database::Error);

#[derive(Debug, Display, Error, From)]
pub enum CreateAdminError {
    #[display("{_0}")]
    #[from]
    InvalidAdmin(InvalidAdmin),

    #[display("admin already exists")]
    AdminExists,

    #[display("{_0}")]
    ResolveSteamId(ResolveVanityError),

    #[display("failed to fetch person result: {_0}")]
    #[from]
    GetPerson(GetOrCreatePersonError),

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum UpdateAdminError {
    #[display("{_0}")]
    #[from]
    InvalidAdmin(InvalidAdmin),

    #[display("admin not found")]
    AdminNotFound,

    #[display("admin already exists")]
    AdminExists,

    #[display("{_0}")]
    ResolveSteamId(ResolveVanityError),

    #[display("failed to fetch person result: {_0}")]
    #[from]
    GetPerson(GetOrCreatePersonError),

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum DeleteAdminError {
    #[display("admin not found")]
    AdminNotFound,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum AddAdminGroupError {
    #[display("admin not found")]
    AdminNotFound,

    #[display("group not found")]
    GroupNotFound,

    #[display("admin is already a member of this group")]
    AlreadyInGroup,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum RemoveAdminGroupError {
    #[display("admin not found")]
    AdminNotFound,

    #[display("group not found")]
    GroupNotFound,

    #[display("admin is not a member of this group")]
    NotInGroup,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum SetAdminGroupsError {
    #[display("{_0}")]
    #[from]
    InvalidIdentity(InvalidAdmin),

    #[display("{_0}")]
    ResolveSteamId(ResolveVanityError),

    #[display("admin not found")]
    AdminNotFound,

    #[display("group #{_0} not found")]
    GroupNotFound(#[error(ignore)] GroupId),

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

/// Separates identities that cannot name a steam account from failures to ask Steam.
fn split_resolve_error(error: ResolveSteamIdError) -> Result<ResolveVanityError, InvalidAdmin> {
    match error {
        ResolveSteamIdError::Invalid(error) => Err(InvalidAdmin::InvalidSteamId(error)),
        ResolveSteamIdError::UnknownVanity { .. } => Err(InvalidAdmin::UnknownSteamAccount),
        ResolveSteamIdError::Resolve(error) => Ok(error),
    }
}

impl From<ResolveSteamIdError> for CreateAdminError {
    fn from(error: ResolveSteamIdError) -> Self {
        split_resolve_error(error).map_or_else(Self::InvalidAdmin, Self::ResolveSteamId)
    }
}

impl From<ResolveSteamIdError> for UpdateAdminError {
    fn from(error: ResolveSteamIdError) -> Self {
        split_resolve_error(error).map_or_else(Self::InvalidAdmin, Self::ResolveSteamId)
    }
}

impl From<ResolveSteamIdError> for SetAdminGroupsError {
    fn from(error: ResolveSteamIdError) -> Self {
        split_resolve_error(error).map_or_else(Self::InvalidIdentity, Self::ResolveSteamId)
    }
}

impl AuthType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::Name => "name",
            Self::Ip => "ip",
        }
    }
}

impl AsRef<str> for AuthType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for AuthType {
    type Err = UnknownAuthType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "steam" => Ok(Self::Steam),
            "name" => Ok(Self::Name),
            "ip" => Ok(Self::Ip),
            _ => Err(UnknownAuthType),
        }
    }
}

impl_sqlx_via_str!(AuthType);

impl AdminRecord {
    /// Validates and canonicalizes an admin's attributes.
    ///
    /// Steam identities may be given in any format [`SteamId::parse()`] accepts and are stored as
    /// `[U:1:N]`.
    pub fn validate(
        name: &str,
        auth_type: AuthType,
        identity: &str,
        password: &str,
        flags: &str,
        immunity: i64,
    ) -> Result<Self, InvalidAdmin> {
        let (identity, steam_id) = Self::canonical_identity(auth_type, identity)?;

        if auth_type == AuthType::Name && password.is_empty() {
            return Err(InvalidAdmin::MissingPassword);
        }

        Ok(Self {
            name: name.to_owned(),
            auth_type,
            identity,
            steam_id,
            password: password.to_owned(),
            flags: Flags::new(flags)?,
            immunity: Immunity::new(immunity)?,
        })
    }

    /// The form an identity is stored in, plus the SteamID for steam identities.
    pub fn canonical_identity(
        auth_type: AuthType,
        identity: &str,
    ) -> Result<(String, Option<SteamId>), InvalidAdmin> {
        match auth_type {
            AuthType::Steam => {
                let steam_id = SteamId::parse(identity)?;
                Ok((steam_id.steam3(), Some(steam_id)))
            },
            AuthType::Ip => {
                let ip = identity.parse::<IpAddr>().map_err(|_| InvalidAdmin::InvalidIp)?;
                Ok((ip.to_string(), None))
            },
            AuthType::Name if identity.is_empty() => Err(InvalidAdmin::EmptyName),
            AuthType::Name => Ok((identity.to_owned(), None)),
        }
    }
}

/// Steam identities may also be profile URLs or vanity names; those are turned into a SteamID
/// here, before validation.
async fn resolve_identity<'a>(
    cx: &Context,
    auth_type: AuthType,
    identity: &'a str,
) -> Result<Cow<'a, str>, ResolveSteamIdError> {
    match auth_type {
        AuthType::Steam => steam::resolve_steam_id(cx.steam_ids(), identity)
            .await
            .map(|steam_id| Cow::Owned(steam_id.steam3())),
        AuthType::Name | AuthType::Ip => Ok(Cow::Borrowed(identity)),
    }
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get(cx: &Context) -> Result<Vec<Admin>, GetAdminsError> {
    cx.sourcemod().admins().await.map_err(GetAdminsError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_by_id(cx: &Context, admin_id: AdminId) -> Result<Option<Admin>, GetAdminsError> {
    cx.sourcemod()
        .admin_by_id(admin_id)
        .await
        .map_err(GetAdminsError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_by_identity(
    cx: &Context,
    auth_type: AuthType,
    identity: &str,
) -> Result<Option<Admin>, GetAdminsError> {
    cx.sourcemod()
        .admin_by_identity(auth_type, identity)
        .await
        .map_err(GetAdminsError::from)
}

/// Returns the groups of an admin, in inheritance order.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn groups(cx: &Context, admin_id: AdminId) -> Result<Vec<Group>, GetAdminsError> {
    cx.sourcemod()
        .admin_groups(admin_id)
        .await
        .map_err(GetAdminsError::from)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn create(cx: &Context, admin: NewAdmin<'_>) -> Result<Admin, CreateAdminError> {
    let identity = resolve_identity(cx, admin.auth_type, admin.identity).await?;
    let record = AdminRecord::validate(
        admin.name,
        admin.auth_type,
        &identity,
        admin.password,
        admin.flags,
        admin.immunity,
    )?;

    if cx
        .sourcemod()
        .admin_by_identity(record.auth_type, &record.identity)
        .await?
        .is_some()
    {
        return Err(CreateAdminError::AdminExists);
    }

    if let Some(steam_id) = record.steam_id {
        cx.persons().get_or_create_person(steam_id).await?;
    }

    let admin = cx.sourcemod().insert_admin(&record).await.map_err(|err| {
        if err.is_unique_violation_of("identity") {
            CreateAdminError::AdminExists
        } else {
            CreateAdminError::Database(err)
        }
    })?;

    cx.admin_snapshots().invalidate().await;
    info!(id = %admin.id, identity = %admin.identity, "created admin");

    Ok(admin)
}

/// Updates an admin's attributes.
///
/// Group memberships are left untouched.
#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn update(cx: &Context, update: AdminUpdate<'_>) -> Result<Admin, UpdateAdminError> {
    let identity = resolve_identity(cx, update.auth_type, update.identity).await?;
    let record = AdminRecord::validate(
        update.name,
        update.auth_type,
        &identity,
        update.password,
        update.flags,
        update.immunity,
    )?;

    if cx.sourcemod().admin_by_id(update.id).await?.is_none() {
        return Err(UpdateAdminError::AdminNotFound);
    }

    if cx
        .sourcemod()
        .admin_by_identity(record.auth_type, &record.identity)
        .await?
        .is_some_and(|other| other.id != update.id)
    {
        return Err(UpdateAdminError::AdminExists);
    }

    if let Some(steam_id) = record.steam_id {
        cx.persons().get_or_create_person(steam_id).await?;
    }

    let updated = cx
        .sourcemod()
        .update_admin(update.id, &record)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("identity") {
                UpdateAdminError::AdminExists
            } else {
                UpdateAdminError::Database(err)
            }
        })?;

    if !updated {
        return Err(UpdateAdminError::AdminNotFound);
    }

    cx.admin_snapshots().invalidate().await;

    cx.sourcemod()
        .admin_by_id(update.id)
        .await?
        .ok_or(UpdateAdminError::AdminNotFound)
}

/// Deletes an admin together with its group memberships.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn delete(cx: &Context, admin_id: AdminId) -> Result<(), DeleteAdminError> {
    if !cx.sourcemod().delete_admin(admin_id).await? {
        return Err(DeleteAdminError::AdminNotFound);
    }

    cx.admin_snapshots().invalidate().await;
    info!(id = %admin_id, "deleted admin");

    Ok(())
}

/// Appends a group to an admin's inheritance list.
#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn add_group(
    cx: &Context,
    admin_id: AdminId,
    group_id: GroupId,
) -> Result<Admin, AddAdminGroupError> {
    let mut admin = cx
        .sourcemod()
        .admin_by_id(admin_id)
        .await?
        .ok_or(AddAdminGroupError::AdminNotFound)?;

    let group = cx
        .sourcemod()
        .group_by_id(group_id)
        .await?
        .ok_or(AddAdminGroupError::GroupNotFound)?;

    let existing = cx.sourcemod().admin_groups(admin_id).await?;

    if existing.iter().any(|existing| existing.id == group_id) {
        return Err(AddAdminGroupError::AlreadyInGroup);
    }

    let inherit_order = u32::try_from(existing.len() + 1).unwrap_or(u32::MAX);

    cx.sourcemod()
        .insert_admin_group(admin_id, group_id, inherit_order)
        .await?;

    cx.admin_snapshots().invalidate().await;
    admin.groups.push(group);

    Ok(admin)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn remove_group(
    cx: &Context,
    admin_id: AdminId,
    group_id: GroupId,
) -> Result<Admin, RemoveAdminGroupError> {
    let mut admin = cx
        .sourcemod()
        .admin_by_id(admin_id)
        .await?
        .ok_or(RemoveAdminGroupError::AdminNotFound)?;

    if cx.sourcemod().group_by_id(group_id).await?.is_none() {
        return Err(RemoveAdminGroupError::GroupNotFound);
    }

    if !cx.sourcemod().delete_admin_group(admin_id, group_id).await? {
        return Err(RemoveAdminGroupError::NotInGroup);
    }

    cx.admin_snapshots().invalidate().await;
    admin.groups.retain(|group| group.id != group_id);

    Ok(admin)
}

/// Replaces the group list of the admin identified by `(auth_type, identity)`.
///
/// `identity` is accepted in any form [`create()`] accepts. The given order becomes the new
/// inheritance order. An empty list removes every membership.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn set_groups(
    cx: &Context,
    auth_type: AuthType,
    identity: &str,
    group_ids: &[GroupId],
) -> Result<(), SetAdminGroupsError> {
    let identity = resolve_identity(cx, auth_type, identity).await?;
    let (identity, _) = AdminRecord::canonical_identity(auth_type, &identity)?;
    let admin = cx
        .sourcemod()
        .admin_by_identity(auth_type, &identity)
        .await?
        .ok_or(SetAdminGroupsError::AdminNotFound)?;

    for &group_id in group_ids {
        if cx.sourcemod().group_by_id(group_id).await?.is_none() {
            return Err(SetAdminGroupsError::GroupNotFound(group_id));
        }
    }

    cx.sourcemod()
        .replace_admin_groups(admin.id, group_ids)
        .await?;

    cx.admin_snapshots().invalidate().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::groups::{self, NewGroup};
    use crate::testing;

    const STEAM3: &str = "[U:1:322356345]";

    fn steam_admin(identity: &str) -> NewAdmin<'_> {
        NewAdmin {
            name: "alpha",
            auth_type: AuthType::Steam,
            identity,
            flags: "abc",
            immunity: 10,
            password: "",
        }
    }

    async fn group(cx: &Context, name: &str) -> Group {
        groups::create(cx, NewGroup { name, flags: "", immunity_level: 0 })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_update_delete() {
        let (cx, fakes) = testing::context_with_fakes();

        assert!(get(&cx).await.unwrap().is_empty());

        let admin = create(&cx, steam_admin("76561198282622073")).await.unwrap();
        assert_eq!(admin.identity, STEAM3);
        assert_eq!(admin.steam_id, Some(SteamId::parse(STEAM3).unwrap()));
        assert!(admin.groups.is_empty());
        assert!(fakes.persons.contains(SteamId::parse(STEAM3).unwrap()));

        let updated = update(&cx, AdminUpdate {
            id: admin.id,
            name: "beta",
            auth_type: AuthType::Steam,
            identity: "STEAM_1:1:161178172",
            flags: "z",
            immunity: 90,
            password: "",
        })
        .await
        .unwrap();

        assert_eq!(updated.id, admin.id);
        assert_eq!(updated.name, "beta");
        assert_eq!(updated.identity, STEAM3);
        assert_eq!(updated.immunity.get(), 90);

        delete(&cx, admin.id).await.unwrap();
        assert!(get(&cx).await.unwrap().is_empty());
        assert!(matches!(delete(&cx, admin.id).await, Err(DeleteAdminError::AdminNotFound)));
    }

    #[tokio::test]
    async fn rejects_duplicates_across_formats() {
        let cx = testing::context();

        create(&cx, steam_admin("[U:1:322356345]")).await.unwrap();

        assert!(matches!(
            create(&cx, steam_admin("STEAM_0:1:161178172")).await,
            Err(CreateAdminError::AdminExists)
        ));
    }

    #[test]
    fn validates_identities() {
        let validate = |auth_type, identity, password| {
            AdminRecord::validate("x", auth_type, identity, password, "", 0)
        };

        assert!(matches!(
            validate(AuthType::Steam, "not a steam id", ""),
            Err(InvalidAdmin::InvalidSteamId(_))
        ));
        assert!(matches!(validate(AuthType::Ip, "300.1.1.1", ""), Err(InvalidAdmin::InvalidIp)));
        assert_eq!(validate(AuthType::Ip, "10.0.0.1", "").unwrap().identity, "10.0.0.1");
        assert_eq!(validate(AuthType::Ip, "::1", "").unwrap().identity, "::1");
        assert!(matches!(validate(AuthType::Name, "", "hunter2"), Err(InvalidAdmin::EmptyName)));
        assert!(matches!(
            validate(AuthType::Name, "alpha", ""),
            Err(InvalidAdmin::MissingPassword)
        ));
        assert!(validate(AuthType::Name, "alpha", "hunter2").is_ok());
    }

    #[test]
    fn validates_flags_and_immunity() {
        let validate = |flags, immunity| {
            AdminRecord::validate("x", AuthType::Name, "x", "pw", flags, immunity)
        };

        assert!(matches!(validate("abcy", 0), Err(InvalidAdmin::Flag(_))));
        assert!(matches!(validate("abc", 101), Err(InvalidAdmin::Immunity(_))));
        assert!(matches!(validate("abc", -1), Err(InvalidAdmin::Immunity(_))));
        assert!(validate("zabcdefghijklmnopqrst", 100).is_ok());
    }

    #[tokio::test]
    async fn person_failures_abort_creation() {
        let (cx, fakes) = testing::context_with_fakes();
        fakes.persons.fail_next();

        assert!(matches!(
            create(&cx, steam_admin(STEAM3)).await,
            Err(CreateAdminError::GetPerson(_))
        ));
        assert!(get(&cx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_membership() {
        let cx = testing::context();
        let admin = create(&cx, steam_admin(STEAM3)).await.unwrap();
        let first = group(&cx, "first").await;
        let second = group(&cx, "second").await;

        let admin = add_group(&cx, admin.id, first.id).await.unwrap();
        assert_eq!(admin.groups, [first.clone()]);

        assert!(matches!(
            add_group(&cx, admin.id, first.id).await,
            Err(AddAdminGroupError::AlreadyInGroup)
        ));

        let admin = add_group(&cx, admin.id, second.id).await.unwrap();
        assert_eq!(admin.groups, [first.clone(), second.clone()]);
        assert_eq!(groups(&cx, admin.id).await.unwrap(), [first.clone(), second.clone()]);

        let admin = remove_group(&cx, admin.id, first.id).await.unwrap();
        assert_eq!(admin.groups, [second.clone()]);

        assert!(matches!(
            remove_group(&cx, admin.id, first.id).await,
            Err(RemoveAdminGroupError::NotInGroup)
        ));

        assert!(matches!(
            add_group(&cx, AdminId::new(999), first.id).await,
            Err(AddAdminGroupError::AdminNotFound)
        ));
        assert!(matches!(
            add_group(&cx, admin.id, GroupId::new(999)).await,
            Err(AddAdminGroupError::GroupNotFound)
        ));
    }

    #[tokio::test]
    async fn set_groups_replaces_memberships() {
        let cx = testing::context();
        let admin = create(&cx, steam_admin(STEAM3)).await.unwrap();
        let first = group(&cx, "first").await;
        let second = group(&cx, "second").await;

        add_group(&cx, admin.id, first.id).await.unwrap();
        set_groups(&cx, AuthType::Steam, STEAM3, &[second.id, first.id])
            .await
            .unwrap();

        assert_eq!(groups(&cx, admin.id).await.unwrap(), [second, first]);

        set_groups(&cx, AuthType::Steam, STEAM3, &[]).await.unwrap();
        assert!(groups(&cx, admin.id).await.unwrap().is_empty());

        assert!(matches!(
            set_groups(&cx, AuthType::Name, "nobody", &[]).await,
            Err(SetAdminGroupsError::AdminNotFound)
        ));
    }

    #[tokio::test]
    async fn set_groups_accepts_any_identity_format() {
        let (cx, fakes) = testing::context_with_fakes();
        let admin = create(&cx, steam_admin(STEAM3)).await.unwrap();
        let ip_admin = create(&cx, NewAdmin {
            auth_type: AuthType::Ip,
            identity: "::1",
            ..steam_admin("")
        })
        .await
        .unwrap();
        let group = group(&cx, "first").await;

        fakes.steam_ids.insert("alphakeks", SteamId::parse(STEAM3).unwrap());

        for identity in [
            "76561198282622073",
            "STEAM_1:1:161178172",
            "https://steamcommunity.com/profiles/76561198282622073",
            "alphakeks",
        ] {
            set_groups(&cx, AuthType::Steam, identity, &[]).await.unwrap();
            set_groups(&cx, AuthType::Steam, identity, &[group.id]).await.unwrap();
            assert_eq!(groups(&cx, admin.id).await.unwrap(), [group.clone()], "{identity}");
        }

        set_groups(&cx, AuthType::Ip, "0:0:0:0:0:0:0:1", &[group.id])
            .await
            .unwrap();
        assert_eq!(groups(&cx, ip_admin.id).await.unwrap(), [group]);

        assert!(matches!(
            set_groups(&cx, AuthType::Steam, "not a steam id", &[]).await,
            Err(SetAdminGroupsError::InvalidIdentity(InvalidAdmin::InvalidSteamId(_)))
        ));
    }

    #[tokio::test]
    async fn resolves_profile_urls_and_vanity_names() {
        let (cx, fakes) = testing::context_with_fakes();

        let profile_url = "https://steamcommunity.com/profiles/76561198282622073/";
        let admin = create(&cx, steam_admin(profile_url)).await.unwrap();

        assert_eq!(admin.identity, STEAM3);
        delete(&cx, admin.id).await.unwrap();

        fakes.steam_ids.insert("alphakeks", SteamId::parse(STEAM3).unwrap());

        let admin = create(&cx, steam_admin("alphakeks")).await.unwrap();
        assert_eq!(admin.identity, STEAM3);
        assert_eq!(admin.steam_id, Some(SteamId::parse(STEAM3).unwrap()));

        assert!(matches!(
            create(&cx, steam_admin("https://steamcommunity.com/id/alphakeks/")).await,
            Err(CreateAdminError::AdminExists)
        ));

        assert!(matches!(
            create(&cx, steam_admin("nobody")).await,
            Err(CreateAdminError::InvalidAdmin(InvalidAdmin::UnknownSteamAccount))
        ));
    }

    #[tokio::test]
    async fn resolver_failures_abort_creation() {
        let (cx, fakes) = testing::context_with_fakes();
        fakes.steam_ids.insert("alphakeks", SteamId::parse(STEAM3).unwrap());
        fakes.steam_ids.fail_next();

        assert!(matches!(
            create(&cx, steam_admin("alphakeks")).await,
            Err(CreateAdminError::ResolveSteamId(_))
        ));
        assert!(get(&cx).await.unwrap().is_empty());
        assert!(!fakes.persons.contains(SteamId::parse(STEAM3).unwrap()));
    }
}
