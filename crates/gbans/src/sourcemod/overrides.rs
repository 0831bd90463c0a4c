//! Command and command-group overrides.
//!
//! Global overrides change the flags required to use a command (or every command in a command
//! group). Group overrides explicitly allow or deny a command for the members of one admin group,
//! regardless of their flags.

use std::str::FromStr;

use crate::sourcemod::flags::{Flags, InvalidFlag};
use crate::sourcemod::groups::GroupId;
use crate::time::Timestamp;
use crate::{Context, database};

define_id_type! {
    /// A unique identifier for global overrides.
    pub struct OverrideId(u32);
}

define_id_type! {
    /// A unique identifier for group overrides.
    pub struct GroupOverrideId(u32);
}

/// What an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OverrideType {
    /// A single command.
    Command,

    /// A command group, i.e. every command registered under that group name.
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OverrideAccess {
    Allow,
    Deny,
}

#[derive(Debug, Display, Error)]
#[display("unknown override type")]
pub struct UnknownOverrideType;

#[derive(Debug, Display, Error)]
#[display("unknown override access")]
pub struct UnknownOverrideAccess;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Override {
    #[serde(rename = "override_id")]
    pub id: OverrideId,

    #[serde(rename = "type")]
    pub kind: OverrideType,

    pub name: String,

    /// Flags an admin needs to pass this override.
    pub flags: Flags,

    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GroupOverride {
    #[serde(rename = "group_override_id")]
    pub id: GroupOverrideId,

    pub group_id: GroupId,

    #[serde(rename = "type")]
    pub kind: OverrideType,

    pub name: String,
    pub access: OverrideAccess,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

#[derive(Debug, Clone)]
pub struct OverrideRecord {
    pub kind: OverrideType,
    pub name: String,
    pub flags: Flags,
}

#[derive(Debug, Clone)]
pub struct GroupOverrideRecord {
    pub kind: OverrideType,
    pub name: String,
    pub access: OverrideAccess,
}

#[derive(Debug)]
pub struct NewOverride<'a> {
    pub name: &'a str,
    pub kind: OverrideType,
    pub flags: &'a str,
}

#[derive(Debug)]
pub struct OverrideUpdate<'a> {
    pub id: OverrideId,
    pub name: &'a str,
    pub kind: OverrideType,
    pub flags: &'a str,
}

#[derive(Debug)]
pub struct NewGroupOverride<'a> {
    pub name: &'a str,
    pub kind: OverrideType,
    pub access: OverrideAccess,
}

#[derive(Debug)]
pub struct GroupOverrideUpdate<'a> {
    pub id: GroupOverrideId,
    pub name: &'a str,
    pub kind: OverrideType,
    pub access: OverrideAccess,
}

#[derive(Debug, Display, Error, From)]
pub enum InvalidOverride {
    #[display("override name cannot be empty")]
    EmptyName,

    #[display("override flags cannot be empty")]
    EmptyFlags,

    #[display("{_0}")]
    #[from]
    Flag(InvalidFlag),
}

#[derive(Debug, Display, Error, From)]
#[display("failed to get overrides")]
#[from(forward)]
pub struct GetOverridesError(database::Error);

#[derive(Debug, Display, Error, From)]
pub enum GetGroupOverridesError {
    #[display("group not found")]
    GroupNotFound,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum CreateOverrideError {
    #[display("{_0}")]
    #[from]
    InvalidOverride(InvalidOverride),

    #[display("an override for this command already exists")]
    AlreadyExists,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum UpdateOverrideError {
    #[display("{_0}")]
    #[from]
    InvalidOverride(InvalidOverride),

    #[display("override not found")]
    NotFound,

    #[display("an override for this command already exists")]
    AlreadyExists,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum CreateGroupOverrideError {
    #[display("{_0}")]
    #[from]
    InvalidOverride(InvalidOverride),

    #[display("group not found")]
    GroupNotFound,

    #[display("this group already has an override for this command")]
    AlreadyExists,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum UpdateGroupOverrideError {
    #[display("{_0}")]
    #[from]
    InvalidOverride(InvalidOverride),

    #[display("group override not found")]
    NotFound,

    #[display("this group already has an override for this command")]
    AlreadyExists,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum DeleteOverrideError {
    #[display("override not found")]
    NotFound,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

impl OverrideType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Group => "group",
        }
    }
}

impl AsRef<str> for OverrideType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for OverrideType {
    type Err = UnknownOverrideType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "command" => Ok(Self::Command),
            "group" => Ok(Self::Group),
            _ => Err(UnknownOverrideType),
        }
    }
}

impl_sqlx_via_str!(OverrideType);

impl OverrideAccess {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl AsRef<str> for OverrideAccess {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for OverrideAccess {
    type Err = UnknownOverrideAccess;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(UnknownOverrideAccess),
        }
    }
}

impl_sqlx_via_str!(OverrideAccess);

impl OverrideRecord {
    pub fn validate(name: &str, kind: OverrideType, flags: &str) -> Result<Self, InvalidOverride> {
        if name.is_empty() {
            return Err(InvalidOverride::EmptyName);
        }

        if flags.is_empty() {
            return Err(InvalidOverride::EmptyFlags);
        }

        Ok(Self { kind, name: name.to_owned(), flags: Flags::new(flags)? })
    }
}

impl GroupOverrideRecord {
    pub fn validate(
        name: &str,
        kind: OverrideType,
        access: OverrideAccess,
    ) -> Result<Self, InvalidOverride> {
        if name.is_empty() {
            return Err(InvalidOverride::EmptyName);
        }

        Ok(Self { kind, name: name.to_owned(), access })
    }
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_overrides(cx: &Context) -> Result<Vec<Override>, GetOverridesError> {
    cx.sourcemod()
        .overrides()
        .await
        .map_err(GetOverridesError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_override_by_id(
    cx: &Context,
    id: OverrideId,
) -> Result<Option<Override>, GetOverridesError> {
    cx.sourcemod()
        .override_by_id(id)
        .await
        .map_err(GetOverridesError::from)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn create_override(
    cx: &Context,
    NewOverride { name, kind, flags }: NewOverride<'_>,
) -> Result<Override, CreateOverrideError> {
    let record = OverrideRecord::validate(name, kind, flags)?;

    if cx
        .sourcemod()
        .overrides()
        .await?
        .iter()
        .any(|existing| existing.kind == record.kind && existing.name == record.name)
    {
        return Err(CreateOverrideError::AlreadyExists);
    }

    cx.sourcemod()
        .insert_override(&record)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("UC_override") {
                CreateOverrideError::AlreadyExists
            } else {
                CreateOverrideError::Database(err)
            }
        })
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn update_override(
    cx: &Context,
    OverrideUpdate { id, name, kind, flags }: OverrideUpdate<'_>,
) -> Result<Override, UpdateOverrideError> {
    let record = OverrideRecord::validate(name, kind, flags)?;

    if cx.sourcemod().overrides().await?.iter().any(|existing| {
        existing.id != id && existing.kind == record.kind && existing.name == record.name
    }) {
        return Err(UpdateOverrideError::AlreadyExists);
    }

    let updated = cx
        .sourcemod()
        .update_override(id, &record)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("UC_override") {
                UpdateOverrideError::AlreadyExists
            } else {
                UpdateOverrideError::Database(err)
            }
        })?;

    if !updated {
        return Err(UpdateOverrideError::NotFound);
    }

    cx.sourcemod()
        .override_by_id(id)
        .await?
        .ok_or(UpdateOverrideError::NotFound)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn delete_override(cx: &Context, id: OverrideId) -> Result<(), DeleteOverrideError> {
    let Some(r#override) = cx.sourcemod().override_by_id(id).await? else {
        return Err(DeleteOverrideError::NotFound);
    };

    if !cx.sourcemod().delete_override(r#override.id).await? {
        return Err(DeleteOverrideError::NotFound);
    }

    info!(%id, name = %r#override.name, "deleted override");

    Ok(())
}

/// Returns the overrides of a group.
///
/// Unlike an empty list, [`GetGroupOverridesError::GroupNotFound`] means the group itself does
/// not exist.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_group_overrides(
    cx: &Context,
    group_id: GroupId,
) -> Result<Vec<GroupOverride>, GetGroupOverridesError> {
    if cx.sourcemod().group_by_id(group_id).await?.is_none() {
        return Err(GetGroupOverridesError::GroupNotFound);
    }

    cx.sourcemod()
        .group_overrides(group_id)
        .await
        .map_err(GetGroupOverridesError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_group_override_by_id(
    cx: &Context,
    id: GroupOverrideId,
) -> Result<Option<GroupOverride>, GetOverridesError> {
    cx.sourcemod()
        .group_override_by_id(id)
        .await
        .map_err(GetOverridesError::from)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn create_group_override(
    cx: &Context,
    group_id: GroupId,
    NewGroupOverride { name, kind, access }: NewGroupOverride<'_>,
) -> Result<GroupOverride, CreateGroupOverrideError> {
    let record = GroupOverrideRecord::validate(name, kind, access)?;

    if cx.sourcemod().group_by_id(group_id).await?.is_none() {
        return Err(CreateGroupOverrideError::GroupNotFound);
    }

    if cx
        .sourcemod()
        .group_overrides(group_id)
        .await?
        .iter()
        .any(|existing| existing.kind == record.kind && existing.name == record.name)
    {
        return Err(CreateGroupOverrideError::AlreadyExists);
    }

    let group_override = cx
        .sourcemod()
        .insert_group_override(group_id, &record)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("UC_group_override") {
                CreateGroupOverrideError::AlreadyExists
            } else if err.is_fk_violation_of("group_id") {
                CreateGroupOverrideError::GroupNotFound
            } else {
                CreateGroupOverrideError::Database(err)
            }
        })?;

    info!(%group_id, name, "added group override");

    Ok(group_override)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn update_group_override(
    cx: &Context,
    GroupOverrideUpdate { id, name, kind, access }: GroupOverrideUpdate<'_>,
) -> Result<GroupOverride, UpdateGroupOverrideError> {
    let record = GroupOverrideRecord::validate(name, kind, access)?;

    let existing = cx
        .sourcemod()
        .group_override_by_id(id)
        .await?
        .ok_or(UpdateGroupOverrideError::NotFound)?;

    if cx
        .sourcemod()
        .group_overrides(existing.group_id)
        .await?
        .iter()
        .any(|other| other.id != id && other.kind == record.kind && other.name == record.name)
    {
        return Err(UpdateGroupOverrideError::AlreadyExists);
    }

    let updated = cx
        .sourcemod()
        .update_group_override(id, &record)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("UC_group_override") {
                UpdateGroupOverrideError::AlreadyExists
            } else {
                UpdateGroupOverrideError::Database(err)
            }
        })?;

    if !updated {
        return Err(UpdateGroupOverrideError::NotFound);
    }

    cx.sourcemod()
        .group_override_by_id(id)
        .await?
        .ok_or(UpdateGroupOverrideError::NotFound)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn delete_group_override(
    cx: &Context,
    id: GroupOverrideId,
) -> Result<(), DeleteOverrideError> {
    let Some(group_override) = cx.sourcemod().group_override_by_id(id).await? else {
        return Err(DeleteOverrideError::NotFound);
    };

    if !cx.sourcemod().delete_group_override(group_override.id).await? {
        return Err(DeleteOverrideError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::groups::{self, NewGroup};
    use crate::testing;

    #[tokio::test]
    async fn global_overrides() {
        let cx = testing::context();

        assert!(get_overrides(&cx).await.unwrap().is_empty());

        let created = create_override(&cx, NewOverride {
            name: "sm_kick",
            kind: OverrideType::Command,
            flags: "c",
        })
        .await
        .unwrap();

        assert_eq!(created.flags.as_str(), "c");

        let updated = update_override(&cx, OverrideUpdate {
            id: created.id,
            name: "sm_kick",
            kind: OverrideType::Command,
            flags: "cd",
        })
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.flags.as_str(), "cd");
        assert_eq!(get_overrides(&cx).await.unwrap(), [updated]);

        delete_override(&cx, created.id).await.unwrap();
        assert!(get_overrides(&cx).await.unwrap().is_empty());
        assert!(matches!(
            delete_override(&cx, created.id).await,
            Err(DeleteOverrideError::NotFound)
        ));
    }

    #[tokio::test]
    async fn global_overrides_require_name_and_flags() {
        let cx = testing::context();

        for (name, flags) in [("", "a"), ("sm_ban", ""), ("sm_ban", "X")] {
            let result =
                create_override(&cx, NewOverride { name, kind: OverrideType::Group, flags }).await;

            let Err(CreateOverrideError::InvalidOverride(error)) = result else {
                panic!("`{name}` / `{flags}` should be rejected");
            };

            match (name, flags) {
                ("", _) => assert!(matches!(error, InvalidOverride::EmptyName)),
                (_, "") => assert!(matches!(error, InvalidOverride::EmptyFlags)),
                _ => assert!(matches!(error, InvalidOverride::Flag(_))),
            }
        }

        assert!(get_overrides(&cx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_overrides() {
        let cx = testing::context();
        let group = groups::create(&cx, NewGroup { name: "mods", flags: "", immunity_level: 0 })
            .await
            .unwrap();

        assert!(get_group_overrides(&cx, group.id).await.unwrap().is_empty());

        let created = create_group_override(&cx, group.id, NewGroupOverride {
            name: "sm_ban",
            kind: OverrideType::Command,
            access: OverrideAccess::Allow,
        })
        .await
        .unwrap();

        assert!(created.id.get() > 0);
        assert_eq!(created.group_id, group.id);

        let updated = update_group_override(&cx, GroupOverrideUpdate {
            id: created.id,
            name: "sm_ban",
            kind: OverrideType::Command,
            access: OverrideAccess::Deny,
        })
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.access, OverrideAccess::Deny);

        delete_group_override(&cx, created.id).await.unwrap();
        assert!(get_group_overrides(&cx, group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_overrides_require_an_existing_group() {
        let cx = testing::context();
        let missing = GroupId::new(42);

        assert!(matches!(
            get_group_overrides(&cx, missing).await,
            Err(GetGroupOverridesError::GroupNotFound)
        ));

        assert!(matches!(
            create_group_override(&cx, missing, NewGroupOverride {
                name: "sm_ban",
                kind: OverrideType::Command,
                access: OverrideAccess::Allow,
            })
            .await,
            Err(CreateGroupOverrideError::GroupNotFound)
        ));
    }
}
