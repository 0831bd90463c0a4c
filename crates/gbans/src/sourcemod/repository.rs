use crate::database;
use crate::sourcemod::admins::{Admin, AdminId, AdminRecord, AuthType};
use crate::sourcemod::groups::{Group, GroupId, GroupRecord};
use crate::sourcemod::immunities::{GroupImmunity, GroupImmunityId};
use crate::sourcemod::overrides::{
    GroupOverride,
    GroupOverrideId,
    GroupOverrideRecord,
    Override,
    OverrideId,
    OverrideRecord,
};

/// Storage for admins, groups, immunities and overrides.
///
/// Implementations only store and load; validation happens before any of these methods are
/// called. Methods returning `bool` report whether a row was affected.
#[async_trait::async_trait]
pub trait SourcemodRepository: Send + Sync {
    /// Returns every admin, each with their groups in inheritance order.
    async fn admins(&self) -> database::Result<Vec<Admin>>;
    async fn admin_by_id(&self, admin_id: AdminId) -> database::Result<Option<Admin>>;
    async fn admin_by_identity(
        &self,
        auth_type: AuthType,
        identity: &str,
    ) -> database::Result<Option<Admin>>;
    async fn insert_admin(&self, admin: &AdminRecord) -> database::Result<Admin>;
    async fn update_admin(&self, admin_id: AdminId, admin: &AdminRecord) -> database::Result<bool>;

    /// Deletes an admin and their group memberships.
    async fn delete_admin(&self, admin_id: AdminId) -> database::Result<bool>;

    async fn admin_groups(&self, admin_id: AdminId) -> database::Result<Vec<Group>>;
    async fn insert_admin_group(
        &self,
        admin_id: AdminId,
        group_id: GroupId,
        inherit_order: u32,
    ) -> database::Result<()>;
    async fn delete_admin_group(&self, admin_id: AdminId, group_id: GroupId)
    -> database::Result<bool>;

    /// Replaces every membership of an admin with `group_ids`, numbering them from 1.
    async fn replace_admin_groups(
        &self,
        admin_id: AdminId,
        group_ids: &[GroupId],
    ) -> database::Result<()>;

    async fn groups(&self) -> database::Result<Vec<Group>>;
    async fn group_by_id(&self, group_id: GroupId) -> database::Result<Option<Group>>;
    async fn group_by_name(&self, name: &str) -> database::Result<Option<Group>>;
    async fn insert_group(&self, group: &GroupRecord) -> database::Result<Group>;
    async fn update_group(&self, group_id: GroupId, group: &GroupRecord) -> database::Result<bool>;

    /// Deletes a group together with its memberships, overrides and immunities (in both
    /// directions).
    ///
    /// Either everything is deleted or nothing is.
    async fn delete_group(&self, group_id: GroupId) -> database::Result<bool>;

    async fn group_immunities(&self) -> database::Result<Vec<GroupImmunity>>;
    async fn group_immunity_by_id(
        &self,
        id: GroupImmunityId,
    ) -> database::Result<Option<GroupImmunity>>;
    async fn insert_group_immunity(
        &self,
        group_id: GroupId,
        other_id: GroupId,
    ) -> database::Result<GroupImmunityId>;
    async fn delete_group_immunity(&self, id: GroupImmunityId) -> database::Result<bool>;

    async fn overrides(&self) -> database::Result<Vec<Override>>;
    async fn override_by_id(&self, id: OverrideId) -> database::Result<Option<Override>>;
    async fn insert_override(&self, r#override: &OverrideRecord) -> database::Result<Override>;
    async fn update_override(
        &self,
        id: OverrideId,
        r#override: &OverrideRecord,
    ) -> database::Result<bool>;
    async fn delete_override(&self, id: OverrideId) -> database::Result<bool>;

    async fn group_overrides(&self, group_id: GroupId) -> database::Result<Vec<GroupOverride>>;
    async fn group_override_by_id(
        &self,
        id: GroupOverrideId,
    ) -> database::Result<Option<GroupOverride>>;
    async fn insert_group_override(
        &self,
        group_id: GroupId,
        group_override: &GroupOverrideRecord,
    ) -> database::Result<GroupOverride>;
    async fn update_group_override(
        &self,
        id: GroupOverrideId,
        group_override: &GroupOverrideRecord,
    ) -> database::Result<bool>;
    async fn delete_group_override(&self, id: GroupOverrideId) -> database::Result<bool>;
}
