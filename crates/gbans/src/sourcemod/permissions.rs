//! Resolving an admin's own permissions together with the ones inherited from their groups.

use crate::sourcemod::admins::Admin;
use crate::sourcemod::flags::{Flags, Immunity};
use crate::sourcemod::groups::Group;

/// The permissions an admin actually has.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct EffectivePermissions {
    /// The admin's own flags, followed by every flag contributed by their groups in inheritance
    /// order. Each flag appears once.
    pub flags: Flags,

    /// The highest immunity level among the admin and their groups.
    pub immunity: Immunity,

    /// The first group (in inheritance order) that grants `immunity`.
    ///
    /// `None` if the admin's own immunity is at least as high as any group's.
    pub primary_group: Option<Group>,
}

impl Admin {
    pub fn effective_permissions(&self) -> EffectivePermissions {
        let mut flags = self.flags.clone();
        let mut immunity = self.immunity;
        let mut primary_group = None;

        for group in &self.groups {
            flags = flags.union(&group.flags);

            if group.immunity_level > immunity {
                immunity = group.immunity_level;
                primary_group = Some(group);
            }
        }

        EffectivePermissions { flags, immunity, primary_group: primary_group.cloned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemod::admins::{AdminId, AuthType};
    use crate::sourcemod::groups::GroupId;
    use crate::time::Timestamp;

    fn group(id: u32, flags: &str, immunity: i64) -> Group {
        Group {
            id: GroupId::new(id),
            flags: Flags::new(flags).unwrap(),
            name: format!("group-{id}"),
            immunity_level: Immunity::new(immunity).unwrap(),
            created_on: Timestamp::now(),
            updated_on: Timestamp::now(),
        }
    }

    fn admin(flags: &str, immunity: i64, groups: Vec<Group>) -> Admin {
        Admin {
            id: AdminId::new(1),
            steam_id: None,
            auth_type: AuthType::Name,
            identity: String::from("alpha"),
            password: String::from("hunter2"),
            flags: Flags::new(flags).unwrap(),
            name: String::from("alpha"),
            immunity: Immunity::new(immunity).unwrap(),
            groups,
            created_on: Timestamp::now(),
            updated_on: Timestamp::now(),
        }
    }

    #[test]
    fn without_groups() {
        let permissions = admin("abc", 5, Vec::new()).effective_permissions();

        assert_eq!(permissions.flags.as_str(), "abc");
        assert_eq!(permissions.immunity.get(), 5);
        assert_eq!(permissions.primary_group, None);
    }

    #[test]
    fn unions_flags_in_inherit_order() {
        let permissions = admin("b", 0, vec![group(1, "cb", 0), group(2, "zc", 0)])
            .effective_permissions();

        assert_eq!(permissions.flags.as_str(), "bcz");
    }

    #[test]
    fn first_group_wins_immunity_ties() {
        let permissions = admin("", 10, vec![group(1, "", 5), group(2, "", 50), group(3, "", 50)])
            .effective_permissions();

        assert_eq!(permissions.immunity.get(), 50);
        assert_eq!(permissions.primary_group.map(|group| group.id), Some(GroupId::new(2)));
    }

    #[test]
    fn own_immunity_can_outrank_groups() {
        let permissions = admin("", 80, vec![group(1, "", 80)]).effective_permissions();

        assert_eq!(permissions.immunity.get(), 80);
        assert_eq!(permissions.primary_group, None);
    }
}
