//! Named permission bundles.

use crate::database;
use crate::sourcemod::flags::{Flags, Immunity, InvalidFlag, InvalidImmunity};
use crate::time::Timestamp;
use crate::Context;

define_id_type! {
    /// A unique identifier for admin groups.
    pub struct GroupId(u32);
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Group {
    #[serde(rename = "group_id")]
    pub id: GroupId,
    pub flags: Flags,
    pub name: String,
    pub immunity_level: Immunity,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

/// A validated set of group attributes, as handed to the repository.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub name: String,
    pub flags: Flags,
    pub immunity_level: Immunity,
}

#[derive(Debug)]
pub struct NewGroup<'a> {
    pub name: &'a str,
    pub flags: &'a str,
    pub immunity_level: i64,
}

#[derive(Debug)]
pub struct GroupUpdate<'a> {
    pub id: GroupId,
    pub name: &'a str,
    pub flags: &'a str,
    pub immunity_level: i64,
}

#[derive(Debug, Display, Error, From)]
pub enum InvalidGroup {
    #[display("group name cannot be empty")]
    EmptyName,

    #[display("{_0}")]
    #[from]
    Immunity(InvalidImmunity),

    #[display("{_0}")]
    #[from]
    Flag(InvalidFlag),
}

#[derive(Debug, Display, Error, From)]
#[display("failed to get groups")]
#[from(forward)]
pub struct GetGroupsError(database::Error);

#[derive(Debug, Display, Error, From)]
pub enum CreateGroupError {
    #[display("{_0}")]
    #[from]
    InvalidGroup(InvalidGroup),

    #[display("group name already in use")]
    NameTaken,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum UpdateGroupError {
    #[display("{_0}")]
    #[from]
    InvalidGroup(InvalidGroup),

    #[display("group not found")]
    GroupNotFound,

    #[display("group name already in use")]
    NameTaken,

    #[display("{_0}")]
    #[from]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum DeleteGroupError {
    #[display("group not found")]
    GroupNotFound,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

impl GroupRecord {
    pub fn validate(name: &str, flags: &str, immunity_level: i64) -> Result<Self, InvalidGroup> {
        if name.is_empty() {
            return Err(InvalidGroup::EmptyName);
        }

        let immunity_level = Immunity::new(immunity_level)?;
        let flags = Flags::new(flags)?;

        Ok(Self { name: name.to_owned(), flags, immunity_level })
    }
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get(cx: &Context) -> Result<Vec<Group>, GetGroupsError> {
    cx.sourcemod().groups().await.map_err(GetGroupsError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_by_id(cx: &Context, group_id: GroupId) -> Result<Option<Group>, GetGroupsError> {
    cx.sourcemod()
        .group_by_id(group_id)
        .await
        .map_err(GetGroupsError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_by_name(cx: &Context, name: &str) -> Result<Option<Group>, GetGroupsError> {
    cx.sourcemod()
        .group_by_name(name)
        .await
        .map_err(GetGroupsError::from)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn create(
    cx: &Context,
    NewGroup { name, flags, immunity_level }: NewGroup<'_>,
) -> Result<Group, CreateGroupError> {
    let record = GroupRecord::validate(name, flags, immunity_level)?;

    if cx.sourcemod().group_by_name(&record.name).await?.is_some() {
        return Err(CreateGroupError::NameTaken);
    }

    let group = cx.sourcemod().insert_group(&record).await.map_err(|err| {
        if err.is_unique_violation_of("name") {
            CreateGroupError::NameTaken
        } else {
            CreateGroupError::Database(err)
        }
    })?;

    cx.group_snapshots().invalidate().await;
    info!(id = %group.id, name = %group.name, "created group");

    Ok(group)
}

#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn update(
    cx: &Context,
    GroupUpdate { id, name, flags, immunity_level }: GroupUpdate<'_>,
) -> Result<Group, UpdateGroupError> {
    let record = GroupRecord::validate(name, flags, immunity_level)?;

    if cx
        .sourcemod()
        .group_by_name(&record.name)
        .await?
        .is_some_and(|other| other.id != id)
    {
        return Err(UpdateGroupError::NameTaken);
    }

    let updated = cx.sourcemod().update_group(id, &record).await.map_err(|err| {
        if err.is_unique_violation_of("name") {
            UpdateGroupError::NameTaken
        } else {
            UpdateGroupError::Database(err)
        }
    })?;

    if !updated {
        return Err(UpdateGroupError::GroupNotFound);
    }

    cx.group_snapshots().invalidate().await;
    cx.admin_snapshots().invalidate().await;

    cx.sourcemod()
        .group_by_id(id)
        .await?
        .ok_or(UpdateGroupError::GroupNotFound)
}

/// Deletes a group together with its memberships, overrides and immunities.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn delete(cx: &Context, group_id: GroupId) -> Result<(), DeleteGroupError> {
    if !cx.sourcemod().delete_group(group_id).await? {
        return Err(DeleteGroupError::GroupNotFound);
    }

    cx.group_snapshots().invalidate().await;
    cx.admin_snapshots().invalidate().await;
    info!(id = %group_id, "deleted group");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::{admins, immunities, overrides, search};
    use crate::testing;

    fn new_group(name: &str) -> NewGroup<'_> {
        NewGroup { name, flags: "abc", immunity_level: 10 }
    }

    #[tokio::test]
    async fn create_update_delete() {
        let cx = testing::context();

        assert!(get(&cx).await.unwrap().is_empty());

        let group = create(&cx, new_group("Moderators")).await.unwrap();
        assert!(group.id.get() > 0);
        assert_eq!(group.immunity_level.get(), 10);

        let updated = update(&cx, GroupUpdate {
            id: group.id,
            name: "Mods",
            flags: "z",
            immunity_level: 50,
        })
        .await
        .unwrap();

        assert_eq!(updated.id, group.id);
        assert_eq!(updated.name, "Mods");
        assert_eq!(updated.flags.as_str(), "z");
        assert_eq!(get_by_name(&cx, "Mods").await.unwrap(), Some(updated));

        delete(&cx, group.id).await.unwrap();
        assert!(get(&cx).await.unwrap().is_empty());
        assert!(matches!(delete(&cx, group.id).await, Err(DeleteGroupError::GroupNotFound)));
    }

    #[tokio::test]
    async fn rejects_invalid_groups() {
        let cx = testing::context();

        let empty_name = create(&cx, NewGroup { name: "", flags: "a", immunity_level: 0 }).await;
        assert!(matches!(empty_name, Err(CreateGroupError::InvalidGroup(InvalidGroup::EmptyName))));

        let bad_immunity =
            create(&cx, NewGroup { name: "x", flags: "a", immunity_level: 101 }).await;
        assert!(matches!(
            bad_immunity,
            Err(CreateGroupError::InvalidGroup(InvalidGroup::Immunity(_)))
        ));

        let bad_flag = create(&cx, NewGroup { name: "x", flags: "a!", immunity_level: 1 }).await;
        assert!(matches!(bad_flag, Err(CreateGroupError::InvalidGroup(InvalidGroup::Flag(_)))));

        assert!(get(&cx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_unique() {
        let cx = testing::context();
        let first = create(&cx, new_group("Admins")).await.unwrap();
        let second = create(&cx, new_group("Mods")).await.unwrap();

        assert!(matches!(create(&cx, new_group("Admins")).await, Err(CreateGroupError::NameTaken)));

        let rename = update(&cx, GroupUpdate {
            id: second.id,
            name: "Admins",
            flags: "",
            immunity_level: 0,
        })
        .await;

        assert!(matches!(rename, Err(UpdateGroupError::NameTaken)));

        // saving a group under its own name is fine
        update(&cx, GroupUpdate { id: first.id, name: "Admins", flags: "", immunity_level: 0 })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_cascades() {
        let cx = testing::context();
        let group = create(&cx, new_group("Admins")).await.unwrap();
        let other = create(&cx, new_group("Mods")).await.unwrap();
        let admin = admins::create(&cx, testing::new_admin("alpha")).await.unwrap();

        admins::add_group(&cx, admin.id, group.id).await.unwrap();
        overrides::create_group_override(&cx, group.id, overrides::NewGroupOverride {
            name: "sm_ban",
            kind: overrides::OverrideType::Command,
            access: overrides::OverrideAccess::Allow,
        })
        .await
        .unwrap();
        immunities::create(&cx, group.id, other.id).await.unwrap();
        immunities::create(&cx, other.id, group.id).await.unwrap();

        delete(&cx, group.id).await.unwrap();

        let admin = admins::get_by_id(&cx, admin.id).await.unwrap().unwrap();
        assert!(admin.groups.is_empty());
        assert!(immunities::get(&cx).await.unwrap().is_empty());
        assert!(matches!(
            overrides::get_group_overrides(&cx, group.id).await,
            Err(overrides::GetGroupOverridesError::GroupNotFound)
        ));
    }

    #[tokio::test]
    async fn updates_show_up_in_admin_search() {
        let cx = testing::context();
        let group = create(&cx, new_group("Admins")).await.unwrap();
        let admin = admins::create(&cx, testing::new_admin("alpha")).await.unwrap();
        admins::add_group(&cx, admin.id, group.id).await.unwrap();

        let found = search::search_admins(&cx, "alpha").await.unwrap();
        assert_eq!(found[0].groups[0].name, "Admins");

        update(&cx, GroupUpdate { id: group.id, name: "Ops", flags: "z", immunity_level: 99 })
            .await
            .unwrap();

        let found = search::search_admins(&cx, "alpha").await.unwrap();
        assert_eq!(found[0].groups[0].name, "Ops");
        assert_eq!(found[0].groups[0].immunity_level.get(), 99);
    }
}
