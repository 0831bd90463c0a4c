//! The flattened views game server plugins sync from.
//!
//! These mirror the shape of SourceMod's own admin configuration, so every field the plugin does
//! not need (IDs, timestamps) is left out.

use crate::Context;
use crate::sourcemod::admins::{self, AdminId, AuthType, GetAdminsError};
use crate::sourcemod::flags::{Flags, Immunity};
use crate::sourcemod::groups::{self, GetGroupsError};
use crate::sourcemod::immunities::{self, GetGroupImmunitiesError};
use crate::sourcemod::overrides::{self, GetOverridesError, OverrideType};

#[derive(Debug, Default, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GroupsSnapshot {
    pub groups: Vec<GroupEntry>,
    pub immunities: Vec<ImmunityEntry>,
}

#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GroupEntry {
    pub flags: Flags,
    pub name: String,
    pub immunity_level: Immunity,
}

#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ImmunityEntry {
    pub group_name: String,
    pub other_name: String,
}

#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct OverrideEntry {
    #[serde(rename = "type")]
    pub kind: OverrideType,
    pub name: String,
    pub flags: Flags,
}

#[derive(Debug, Default, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UsersSnapshot {
    pub users: Vec<UserEntry>,
    pub user_groups: Vec<UserGroupEntry>,
}

#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UserEntry {
    pub id: AdminId,
    pub authtype: AuthType,
    pub identity: String,

    #[debug(skip)]
    pub password: String,

    pub flags: Flags,
    pub name: String,
    pub immunity: Immunity,
}

#[derive(Debug, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UserGroupEntry {
    pub admin_id: AdminId,
    pub group_name: String,
}

#[derive(Debug, Display, Error, From)]
pub enum GetGroupsSnapshotError {
    #[display("{_0}")]
    #[from]
    Groups(GetGroupsError),

    #[display("{_0}")]
    #[from]
    Immunities(GetGroupImmunitiesError),
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn groups(cx: &Context) -> Result<GroupsSnapshot, GetGroupsSnapshotError> {
    let groups = groups::get(cx)
        .await?
        .into_iter()
        .map(|group| GroupEntry {
            flags: group.flags,
            name: group.name,
            immunity_level: group.immunity_level,
        })
        .collect();

    let immunities = immunities::get(cx)
        .await?
        .into_iter()
        .map(|immunity| ImmunityEntry {
            group_name: immunity.group.name,
            other_name: immunity.other.name,
        })
        .collect();

    Ok(GroupsSnapshot { groups, immunities })
}

#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn overrides(cx: &Context) -> Result<Vec<OverrideEntry>, GetOverridesError> {
    Ok(overrides::get_overrides(cx)
        .await?
        .into_iter()
        .map(|r#override| OverrideEntry {
            kind: r#override.kind,
            name: r#override.name,
            flags: r#override.flags,
        })
        .collect())
}

/// Returns every admin along with their group memberships.
///
/// `user_groups` lists memberships in inheritance order for each admin.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn users(cx: &Context) -> Result<UsersSnapshot, GetAdminsError> {
    let mut snapshot = UsersSnapshot::default();

    for admin in admins::get(cx).await? {
        snapshot
            .user_groups
            .extend(admin.groups.into_iter().map(|group| UserGroupEntry {
                admin_id: admin.id,
                group_name: group.name,
            }));

        snapshot.users.push(UserEntry {
            id: admin.id,
            authtype: admin.auth_type,
            identity: admin.identity,
            password: admin.password,
            flags: admin.flags,
            name: admin.name,
            immunity: admin.immunity,
        });
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::groups::NewGroup;
    use crate::sourcemod::overrides::NewOverride;
    use crate::testing;

    #[tokio::test]
    async fn empty_snapshots_serialize_as_empty_arrays() {
        let cx = testing::context();

        let groups = serde_json::to_value(groups(&cx).await.unwrap()).unwrap();
        let users = serde_json::to_value(users(&cx).await.unwrap()).unwrap();
        let overrides = serde_json::to_value(overrides(&cx).await.unwrap()).unwrap();

        assert_eq!(groups, serde_json::json!({ "groups": [], "immunities": [] }));
        assert_eq!(users, serde_json::json!({ "users": [], "user_groups": [] }));
        assert_eq!(overrides, serde_json::json!([]));
    }

    #[tokio::test]
    async fn flattens_catalogs() {
        let cx = testing::context();
        let admins_group =
            groups::create(&cx, NewGroup { name: "admins", flags: "z", immunity_level: 99 })
                .await
                .unwrap();
        let mods = groups::create(&cx, NewGroup { name: "mods", flags: "bc", immunity_level: 50 })
            .await
            .unwrap();

        immunities::create(&cx, admins_group.id, mods.id).await.unwrap();
        overrides::create_override(&cx, NewOverride {
            name: "sm_map",
            kind: OverrideType::Command,
            flags: "g",
        })
        .await
        .unwrap();

        let admin = admins::create(&cx, testing::new_admin("alpha")).await.unwrap();
        admins::add_group(&cx, admin.id, mods.id).await.unwrap();
        admins::add_group(&cx, admin.id, admins_group.id).await.unwrap();

        let groups = groups(&cx).await.unwrap();
        assert_eq!(groups.groups.len(), 2);
        assert_eq!(groups.immunities[0].group_name, "admins");
        assert_eq!(groups.immunities[0].other_name, "mods");

        let overrides = overrides(&cx).await.unwrap();
        assert_eq!(overrides[0].name, "sm_map");

        let users = users(&cx).await.unwrap();
        assert_eq!(users.users[0].identity, "alpha");
        assert_eq!(
            users
                .user_groups
                .iter()
                .map(|entry| entry.group_name.as_str())
                .collect::<Vec<_>>(),
            ["mods", "admins"],
        );
    }
}
