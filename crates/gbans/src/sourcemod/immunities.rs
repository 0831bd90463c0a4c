//! Inter-group immunity.
//!
//! A `(group, other)` pair means members of `group` cannot be targeted by members of `other`.
//! Pairs are directional; `(A, B)` says nothing about `(B, A)`.

use crate::sourcemod::groups::{Group, GroupId};
use crate::time::Timestamp;
use crate::{Context, database};

define_id_type! {
    /// A unique identifier for group immunity pairs.
    pub struct GroupImmunityId(u32);
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GroupImmunity {
    #[serde(rename = "group_immunity_id")]
    pub id: GroupImmunityId,

    /// The protected group.
    pub group: Group,

    /// The group whose members cannot target `group`.
    pub other: Group,

    pub created_on: Timestamp,
}

#[derive(Debug, Display, Error, From)]
#[display("failed to get group immunities")]
#[from(forward)]
pub struct GetGroupImmunitiesError(database::Error);

#[derive(Debug, Display, Error, From)]
pub enum CreateGroupImmunityError {
    #[display("a group cannot be immune to itself")]
    SelfImmunity,

    #[display("group not found")]
    GroupNotFound,

    #[display("group immunity already exists")]
    AlreadyExists,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[derive(Debug, Display, Error, From)]
pub enum DeleteGroupImmunityError {
    #[display("group immunity not found")]
    NotFound,

    #[display("{_0}")]
    #[from(forward)]
    Database(database::Error),
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get(cx: &Context) -> Result<Vec<GroupImmunity>, GetGroupImmunitiesError> {
    cx.sourcemod()
        .group_immunities()
        .await
        .map_err(GetGroupImmunitiesError::from)
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn get_by_id(
    cx: &Context,
    id: GroupImmunityId,
) -> Result<Option<GroupImmunity>, GetGroupImmunitiesError> {
    cx.sourcemod()
        .group_immunity_by_id(id)
        .await
        .map_err(GetGroupImmunitiesError::from)
}

/// Makes `group_id` immune to actions by members of `other_id`.
#[tracing::instrument(skip(cx), ret(level = "debug"), err(level = "debug"))]
pub async fn create(
    cx: &Context,
    group_id: GroupId,
    other_id: GroupId,
) -> Result<GroupImmunity, CreateGroupImmunityError> {
    if group_id == other_id {
        return Err(CreateGroupImmunityError::SelfImmunity);
    }

    let repository = cx.sourcemod();

    let group = repository
        .group_by_id(group_id)
        .await?
        .ok_or(CreateGroupImmunityError::GroupNotFound)?;

    let other = repository
        .group_by_id(other_id)
        .await?
        .ok_or(CreateGroupImmunityError::GroupNotFound)?;

    if repository
        .group_immunities()
        .await?
        .iter()
        .any(|existing| existing.group.id == group_id && existing.other.id == other_id)
    {
        return Err(CreateGroupImmunityError::AlreadyExists);
    }

    let id = repository
        .insert_group_immunity(group_id, other_id)
        .await
        .map_err(|err| {
            if err.is_unique_violation_of("group_id") {
                CreateGroupImmunityError::AlreadyExists
            } else {
                CreateGroupImmunityError::Database(err)
            }
        })?;

    cx.group_snapshots().invalidate().await;

    let created_on = repository
        .group_immunity_by_id(id)
        .await?
        .map_or_else(Timestamp::now, |immunity| immunity.created_on);

    Ok(GroupImmunity { id, group, other, created_on })
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn delete(cx: &Context, id: GroupImmunityId) -> Result<(), DeleteGroupImmunityError> {
    let immunity = cx
        .sourcemod()
        .group_immunity_by_id(id)
        .await?
        .ok_or(DeleteGroupImmunityError::NotFound)?;

    if !cx.sourcemod().delete_group_immunity(immunity.id).await? {
        return Err(DeleteGroupImmunityError::NotFound);
    }

    cx.group_snapshots().invalidate().await;
    info!(%id, group = %immunity.group.name, other = %immunity.other.name, "deleted group immunity");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::groups::{self, NewGroup};
    use crate::testing;

    async fn group(cx: &Context, name: &str) -> Group {
        groups::create(cx, NewGroup { name, flags: "", immunity_level: 0 })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_self_immunity() {
        let cx = testing::context();
        let group = group(&cx, "admins").await;

        assert!(matches!(
            create(&cx, group.id, group.id).await,
            Err(CreateGroupImmunityError::SelfImmunity)
        ));
        assert!(get(&cx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn immunity_is_directional() {
        let cx = testing::context();
        let admins = group(&cx, "admins").await;
        let mods = group(&cx, "mods").await;

        let immunity = create(&cx, admins.id, mods.id).await.unwrap();
        assert_eq!(immunity.group, admins);
        assert_eq!(immunity.other, mods);

        let all = get(&cx).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all.iter().any(|pair| pair.group.id == mods.id && pair.other.id == admins.id));

        // the reverse pair is a separate fact
        create(&cx, mods.id, admins.id).await.unwrap();
        assert_eq!(get(&cx).await.unwrap().len(), 2);

        assert!(matches!(
            create(&cx, admins.id, mods.id).await,
            Err(CreateGroupImmunityError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn create_and_delete() {
        let cx = testing::context();
        let admins = group(&cx, "admins").await;
        let mods = group(&cx, "mods").await;

        assert!(matches!(
            create(&cx, admins.id, GroupId::new(999)).await,
            Err(CreateGroupImmunityError::GroupNotFound)
        ));

        let immunity = create(&cx, admins.id, mods.id).await.unwrap();
        let stored = get_by_id(&cx, immunity.id).await.unwrap().unwrap();
        assert_eq!(stored.group.name, "admins");
        assert_eq!(stored.other.name, "mods");

        delete(&cx, immunity.id).await.unwrap();
        assert!(get(&cx).await.unwrap().is_empty());
        assert!(matches!(
            delete(&cx, immunity.id).await,
            Err(DeleteGroupImmunityError::NotFound)
        ));
    }
}
