//! [`SourcemodRepository`] backed by the `sm_*` tables.

use std::collections::HashMap;

use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, Row};

use crate::database::{self, Database};
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
use crate::sourcemod::repository::SourcemodRepository;

const SELECT_ADMINS: &str = "
    SELECT id, steam_id, authtype, identity, password, flags, name, immunity, created_on, updated_on
    FROM sm_admins";

const SELECT_GROUPS: &str = "
    SELECT id, flags, name, immunity_level, created_on, updated_on
    FROM sm_groups";

const SELECT_GROUP_IMMUNITIES: &str = "
    SELECT
      gi.id,
      gi.created_on,
      g.id AS group_id,
      g.flags AS group_flags,
      g.name AS group_name,
      g.immunity_level AS group_immunity_level,
      g.created_on AS group_created_on,
      g.updated_on AS group_updated_on,
      o.id AS other_id,
      o.flags AS other_flags,
      o.name AS other_name,
      o.immunity_level AS other_immunity_level,
      o.created_on AS other_created_on,
      o.updated_on AS other_updated_on
    FROM sm_group_immunity AS gi
    JOIN sm_groups AS g ON g.id = gi.group_id
    JOIN sm_groups AS o ON o.id = gi.other_id";

const SELECT_OVERRIDES: &str = "
    SELECT id, type, name, flags, created_on, updated_on
    FROM sm_overrides";

const SELECT_GROUP_OVERRIDES: &str = "
    SELECT id, group_id, type, name, access, created_on, updated_on
    FROM sm_group_overrides";

impl FromRow<'_, MySqlRow> for Admin {
    fn from_row(row: &MySqlRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            steam_id: row.try_get("steam_id")?,
            auth_type: row.try_get("authtype")?,
            identity: row.try_get("identity")?,
            password: row.try_get("password")?,
            flags: row.try_get("flags")?,
            name: row.try_get("name")?,
            immunity: row.try_get("immunity")?,
            groups: Vec::new(),
            created_on: row.try_get("created_on")?,
            updated_on: row.try_get("updated_on")?,
        })
    }
}

impl FromRow<'_, MySqlRow> for Group {
    fn from_row(row: &MySqlRow) -> sqlx::Result<Self> {
        group_from_prefixed_row(row, "")
    }
}

impl FromRow<'_, MySqlRow> for GroupImmunity {
    fn from_row(row: &MySqlRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            group: group_from_prefixed_row(row, "group_")?,
            other: group_from_prefixed_row(row, "other_")?,
            created_on: row.try_get("created_on")?,
        })
    }
}

impl FromRow<'_, MySqlRow> for Override {
    fn from_row(row: &MySqlRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("type")?,
            name: row.try_get("name")?,
            flags: row.try_get("flags")?,
            created_on: row.try_get("created_on")?,
            updated_on: row.try_get("updated_on")?,
        })
    }
}

impl FromRow<'_, MySqlRow> for GroupOverride {
    fn from_row(row: &MySqlRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            group_id: row.try_get("group_id")?,
            kind: row.try_get("type")?,
            name: row.try_get("name")?,
            access: row.try_get("access")?,
            created_on: row.try_get("created_on")?,
            updated_on: row.try_get("updated_on")?,
        })
    }
}

fn group_from_prefixed_row(row: &MySqlRow, prefix: &str) -> sqlx::Result<Group> {
    let column = |name: &str| format!("{prefix}{name}");

    Ok(Group {
        id: row.try_get(column("id").as_str())?,
        flags: row.try_get(column("flags").as_str())?,
        name: row.try_get(column("name").as_str())?,
        immunity_level: row.try_get(column("immunity_level").as_str())?,
        created_on: row.try_get(column("created_on").as_str())?,
        updated_on: row.try_get(column("updated_on").as_str())?,
    })
}

/// Converts an `AUTO_INCREMENT` value into one of our ID types.
fn inserted_id<T: From<u32>>(last_insert_id: u64) -> database::Result<T> {
    u32::try_from(last_insert_id)
        .map(T::from)
        .map_err(|err| database::Error::decode_column("id", err))
}

impl Database {
    /// MySQL reports `UPDATE`s that did not change anything as affecting 0 rows, so a missing
    /// row has to be told apart from a no-op update.
    async fn row_exists(&self, table: &'static str, id: u32) -> database::Result<bool> {
        sqlx::query(&format!("SELECT 1 FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.as_ref())
            .await
            .map(|row| row.is_some())
            .map_err(database::Error::from)
    }

    async fn attach_groups(&self, admins: &mut [Admin]) -> database::Result<()> {
        let rows = sqlx::query(
            "SELECT ag.admin_id, g.id, g.flags, g.name, g.immunity_level, g.created_on, g.updated_on
             FROM sm_admins_groups AS ag
             JOIN sm_groups AS g ON g.id = ag.group_id
             ORDER BY ag.admin_id, ag.inherit_order",
        )
        .fetch_all(self.as_ref())
        .await?;

        let mut memberships = HashMap::<AdminId, Vec<Group>>::new();

        for row in &rows {
            let admin_id = row.try_get::<AdminId, _>("admin_id")?;
            memberships
                .entry(admin_id)
                .or_default()
                .push(Group::from_row(row)?);
        }

        for admin in admins {
            admin.groups = memberships.remove(&admin.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SourcemodRepository for Database {
    async fn admins(&self) -> database::Result<Vec<Admin>> {
        let mut admins = sqlx::query_as::<_, Admin>(SELECT_ADMINS)
            .fetch_all(self.as_ref())
            .await?;

        self.attach_groups(&mut admins).await?;

        Ok(admins)
    }

    async fn admin_by_id(&self, admin_id: AdminId) -> database::Result<Option<Admin>> {
        let Some(mut admin) = sqlx::query_as::<_, Admin>(&format!("{SELECT_ADMINS} WHERE id = ?"))
            .bind(admin_id)
            .fetch_optional(self.as_ref())
            .await?
        else {
            return Ok(None);
        };

        admin.groups = self.admin_groups(admin_id).await?;

        Ok(Some(admin))
    }

    async fn admin_by_identity(
        &self,
        auth_type: AuthType,
        identity: &str,
    ) -> database::Result<Option<Admin>> {
        let Some(mut admin) = sqlx::query_as::<_, Admin>(&format!(
            "{SELECT_ADMINS} WHERE authtype = ? AND identity = ?"
        ))
        .bind(auth_type)
        .bind(identity)
        .fetch_optional(self.as_ref())
        .await?
        else {
            return Ok(None);
        };

        admin.groups = self.admin_groups(admin.id).await?;

        Ok(Some(admin))
    }

    async fn insert_admin(&self, admin: &AdminRecord) -> database::Result<Admin> {
        let admin_id = sqlx::query(
            "INSERT INTO sm_admins (steam_id, authtype, identity, password, flags, name, immunity)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(admin.steam_id)
        .bind(admin.auth_type)
        .bind(&admin.identity)
        .bind(&admin.password)
        .bind(&admin.flags)
        .bind(&admin.name)
        .bind(admin.immunity)
        .execute(self.as_ref())
        .await
        .map_err(database::Error::from)
        .and_then(|result| inserted_id::<AdminId>(result.last_insert_id()))?;

        sqlx::query_as::<_, Admin>(&format!("{SELECT_ADMINS} WHERE id = ?"))
            .bind(admin_id)
            .fetch_one(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn update_admin(&self, admin_id: AdminId, admin: &AdminRecord) -> database::Result<bool> {
        let result = sqlx::query(
            "UPDATE sm_admins
             SET steam_id = ?,
                 authtype = ?,
                 identity = ?,
                 password = ?,
                 flags = ?,
                 name = ?,
                 immunity = ?,
                 updated_on = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(admin.steam_id)
        .bind(admin.auth_type)
        .bind(&admin.identity)
        .bind(&admin.password)
        .bind(&admin.flags)
        .bind(&admin.name)
        .bind(admin.immunity)
        .bind(admin_id)
        .execute(self.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        self.row_exists("sm_admins", admin_id.get()).await
    }

    async fn delete_admin(&self, admin_id: AdminId) -> database::Result<bool> {
        let mut txn = self.begin().await?;

        sqlx::query("DELETE FROM sm_admins_groups WHERE admin_id = ?")
            .bind(admin_id)
            .execute(&mut *txn)
            .await?;

        let deleted = sqlx::query("DELETE FROM sm_admins WHERE id = ?")
            .bind(admin_id)
            .execute(&mut *txn)
            .await?
            .rows_affected()
            > 0;

        txn.commit().await?;

        Ok(deleted)
    }

    async fn admin_groups(&self, admin_id: AdminId) -> database::Result<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT g.id, g.flags, g.name, g.immunity_level, g.created_on, g.updated_on
             FROM sm_admins_groups AS ag
             JOIN sm_groups AS g ON g.id = ag.group_id
             WHERE ag.admin_id = ?
             ORDER BY ag.inherit_order",
        )
        .bind(admin_id)
        .fetch_all(self.as_ref())
        .await
        .map_err(database::Error::from)
    }

    async fn insert_admin_group(
        &self,
        admin_id: AdminId,
        group_id: GroupId,
        inherit_order: u32,
    ) -> database::Result<()> {
        sqlx::query(
            "INSERT INTO sm_admins_groups (admin_id, group_id, inherit_order)
             VALUES (?, ?, ?)",
        )
        .bind(admin_id)
        .bind(group_id)
        .bind(inherit_order)
        .execute(self.as_ref())
        .await?;

        Ok(())
    }

    async fn delete_admin_group(
        &self,
        admin_id: AdminId,
        group_id: GroupId,
    ) -> database::Result<bool> {
        sqlx::query("DELETE FROM sm_admins_groups WHERE admin_id = ? AND group_id = ?")
            .bind(admin_id)
            .bind(group_id)
            .execute(self.as_ref())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(database::Error::from)
    }

    async fn replace_admin_groups(
        &self,
        admin_id: AdminId,
        group_ids: &[GroupId],
    ) -> database::Result<()> {
        let mut txn = self.begin().await?;

        sqlx::query("DELETE FROM sm_admins_groups WHERE admin_id = ?")
            .bind(admin_id)
            .execute(&mut *txn)
            .await?;

        for (group_id, inherit_order) in group_ids.iter().zip(1_u32..) {
            sqlx::query(
                "INSERT INTO sm_admins_groups (admin_id, group_id, inherit_order)
                 VALUES (?, ?, ?)",
            )
            .bind(admin_id)
            .bind(group_id)
            .bind(inherit_order)
            .execute(&mut *txn)
            .await?;
        }

        txn.commit().await?;

        Ok(())
    }

    async fn groups(&self) -> database::Result<Vec<Group>> {
        sqlx::query_as::<_, Group>(SELECT_GROUPS)
            .fetch_all(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn group_by_id(&self, group_id: GroupId) -> database::Result<Option<Group>> {
        sqlx::query_as::<_, Group>(&format!("{SELECT_GROUPS} WHERE id = ?"))
            .bind(group_id)
            .fetch_optional(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn group_by_name(&self, name: &str) -> database::Result<Option<Group>> {
        sqlx::query_as::<_, Group>(&format!("{SELECT_GROUPS} WHERE name = ?"))
            .bind(name)
            .fetch_optional(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn insert_group(&self, group: &GroupRecord) -> database::Result<Group> {
        let group_id = sqlx::query(
            "INSERT INTO sm_groups (flags, name, immunity_level)
             VALUES (?, ?, ?)",
        )
        .bind(&group.flags)
        .bind(&group.name)
        .bind(group.immunity_level)
        .execute(self.as_ref())
        .await
        .map_err(database::Error::from)
        .and_then(|result| inserted_id::<GroupId>(result.last_insert_id()))?;

        sqlx::query_as::<_, Group>(&format!("{SELECT_GROUPS} WHERE id = ?"))
            .bind(group_id)
            .fetch_one(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn update_group(&self, group_id: GroupId, group: &GroupRecord) -> database::Result<bool> {
        let result = sqlx::query(
            "UPDATE sm_groups
             SET flags = ?,
                 name = ?,
                 immunity_level = ?,
                 updated_on = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&group.flags)
        .bind(&group.name)
        .bind(group.immunity_level)
        .bind(group_id)
        .execute(self.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        self.row_exists("sm_groups", group_id.get()).await
    }

    async fn delete_group(&self, group_id: GroupId) -> database::Result<bool> {
        let mut txn = self.begin().await?;

        sqlx::query("DELETE FROM sm_admins_groups WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *txn)
            .await?;

        sqlx::query("DELETE FROM sm_group_overrides WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *txn)
            .await?;

        sqlx::query("DELETE FROM sm_group_immunity WHERE group_id = ? OR other_id = ?")
            .bind(group_id)
            .bind(group_id)
            .execute(&mut *txn)
            .await?;

        let deleted = sqlx::query("DELETE FROM sm_groups WHERE id = ?")
            .bind(group_id)
            .execute(&mut *txn)
            .await?
            .rows_affected()
            > 0;

        // nothing else was touched if the group did not exist, so there is no harm in committing
        txn.commit().await?;

        Ok(deleted)
    }

    async fn group_immunities(&self) -> database::Result<Vec<GroupImmunity>> {
        sqlx::query_as::<_, GroupImmunity>(SELECT_GROUP_IMMUNITIES)
            .fetch_all(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn group_immunity_by_id(
        &self,
        id: GroupImmunityId,
    ) -> database::Result<Option<GroupImmunity>> {
        sqlx::query_as::<_, GroupImmunity>(&format!("{SELECT_GROUP_IMMUNITIES} WHERE gi.id = ?"))
            .bind(id)
            .fetch_optional(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn insert_group_immunity(
        &self,
        group_id: GroupId,
        other_id: GroupId,
    ) -> database::Result<GroupImmunityId> {
        sqlx::query("INSERT INTO sm_group_immunity (group_id, other_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(other_id)
            .execute(self.as_ref())
            .await
            .map_err(database::Error::from)
            .and_then(|result| inserted_id(result.last_insert_id()))
    }

    async fn delete_group_immunity(&self, id: GroupImmunityId) -> database::Result<bool> {
        sqlx::query("DELETE FROM sm_group_immunity WHERE id = ?")
            .bind(id)
            .execute(self.as_ref())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(database::Error::from)
    }

    async fn overrides(&self) -> database::Result<Vec<Override>> {
        sqlx::query_as::<_, Override>(SELECT_OVERRIDES)
            .fetch_all(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn override_by_id(&self, id: OverrideId) -> database::Result<Option<Override>> {
        sqlx::query_as::<_, Override>(&format!("{SELECT_OVERRIDES} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn insert_override(&self, r#override: &OverrideRecord) -> database::Result<Override> {
        let id = sqlx::query("INSERT INTO sm_overrides (type, name, flags) VALUES (?, ?, ?)")
            .bind(r#override.kind)
            .bind(&r#override.name)
            .bind(&r#override.flags)
            .execute(self.as_ref())
            .await
            .map_err(database::Error::from)
            .and_then(|result| inserted_id::<OverrideId>(result.last_insert_id()))?;

        sqlx::query_as::<_, Override>(&format!("{SELECT_OVERRIDES} WHERE id = ?"))
            .bind(id)
            .fetch_one(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn update_override(
        &self,
        id: OverrideId,
        r#override: &OverrideRecord,
    ) -> database::Result<bool> {
        let result = sqlx::query(
            "UPDATE sm_overrides
             SET type = ?,
                 name = ?,
                 flags = ?,
                 updated_on = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(r#override.kind)
        .bind(&r#override.name)
        .bind(&r#override.flags)
        .bind(id)
        .execute(self.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        self.row_exists("sm_overrides", id.get()).await
    }

    async fn delete_override(&self, id: OverrideId) -> database::Result<bool> {
        sqlx::query("DELETE FROM sm_overrides WHERE id = ?")
            .bind(id)
            .execute(self.as_ref())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(database::Error::from)
    }

    async fn group_overrides(&self, group_id: GroupId) -> database::Result<Vec<GroupOverride>> {
        sqlx::query_as::<_, GroupOverride>(&format!("{SELECT_GROUP_OVERRIDES} WHERE group_id = ?"))
            .bind(group_id)
            .fetch_all(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn group_override_by_id(
        &self,
        id: GroupOverrideId,
    ) -> database::Result<Option<GroupOverride>> {
        sqlx::query_as::<_, GroupOverride>(&format!("{SELECT_GROUP_OVERRIDES} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn insert_group_override(
        &self,
        group_id: GroupId,
        group_override: &GroupOverrideRecord,
    ) -> database::Result<GroupOverride> {
        let id = sqlx::query(
            "INSERT INTO sm_group_overrides (group_id, type, name, access)
             VALUES (?, ?, ?, ?)",
        )
        .bind(group_id)
        .bind(group_override.kind)
        .bind(&group_override.name)
        .bind(group_override.access)
        .execute(self.as_ref())
        .await
        .map_err(database::Error::from)
        .and_then(|result| inserted_id::<GroupOverrideId>(result.last_insert_id()))?;

        sqlx::query_as::<_, GroupOverride>(&format!("{SELECT_GROUP_OVERRIDES} WHERE id = ?"))
            .bind(id)
            .fetch_one(self.as_ref())
            .await
            .map_err(database::Error::from)
    }

    async fn update_group_override(
        &self,
        id: GroupOverrideId,
        group_override: &GroupOverrideRecord,
    ) -> database::Result<bool> {
        let result = sqlx::query(
            "UPDATE sm_group_overrides
             SET type = ?,
                 name = ?,
                 access = ?,
                 updated_on = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(group_override.kind)
        .bind(&group_override.name)
        .bind(group_override.access)
        .bind(id)
        .execute(self.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        self.row_exists("sm_group_overrides", id.get()).await
    }

    async fn delete_group_override(&self, id: GroupOverrideId) -> database::Result<bool> {
        sqlx::query("DELETE FROM sm_group_overrides WHERE id = ?")
            .bind(id)
            .execute(self.as_ref())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(database::Error::from)
    }
}
