//! The admin, group, immunity and override catalogs game server plugins authorize against.

pub mod flags;
pub use flags::{Flags, Immunity, VALID_FLAGS};

pub mod admins;
pub use admins::{Admin, AdminId, AuthType};

pub mod groups;
pub use groups::{Group, GroupId};

pub mod immunities;
pub use immunities::{GroupImmunity, GroupImmunityId};

pub mod overrides;
pub use overrides::{GroupOverride, GroupOverrideId, Override, OverrideId};

mod permissions;
pub use permissions::EffectivePermissions;

pub mod search;
pub mod snapshots;

mod repository;
pub use repository::SourcemodRepository;

mod mysql;
