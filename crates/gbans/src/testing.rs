//! In-memory collaborators for tests.
//!
//! [`context()`] builds a [`Context`] that never touches the network or a database. Use
//! [`context_with_fakes()`] to also get handles for seeding and inspecting the fakes.

use std::collections::{BTreeMap, HashSet};
use std::error::Error as StdError;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlx::error::{DatabaseError, ErrorKind};
use time::Duration;

use crate::bans::{BanReason, BanSource, BanStateLookup, BanType, PlayerBanState};
use crate::config::Config;
use crate::context::Collaborators;
use crate::database;
use crate::evasion::{CheckEvasionError, EvadeChecker};
use crate::notifications::{Notification, Notifier, SendNotificationError};
use crate::persons::{GetOrCreatePersonError, Person, PersonProvider};
use crate::sourcemod::admins::{Admin, AdminId, AdminRecord, AuthType, NewAdmin};
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
use crate::sourcemod::SourcemodRepository;
use crate::steam::{ResolveVanityError, SteamIdResolver};
use crate::time::Timestamp;
use crate::{Context, SteamId};

/// Handles to the fake collaborators of a test [`Context`].
#[derive(Debug, Clone)]
pub struct Fakes {
    pub sourcemod: Arc<InMemoryRepository>,
    pub persons: Arc<FakePersonProvider>,
    pub bans: Arc<FakeBanStateLookup>,
    pub evasion: Arc<FakeEvadeChecker>,
    pub notifier: Arc<FakeNotifier>,
    pub steam_ids: Arc<FakeSteamIdResolver>,
}

pub fn context() -> Context {
    context_with_fakes().0
}

pub fn context_with_fakes() -> (Context, Fakes) {
    context_with_config(Config::default())
}

pub fn context_with_config(config: Config) -> (Context, Fakes) {
    let fakes = Fakes {
        sourcemod: Arc::default(),
        persons: Arc::default(),
        bans: Arc::default(),
        evasion: Arc::default(),
        notifier: Arc::default(),
        steam_ids: Arc::default(),
    };

    let cx = Context::from_parts(config, Collaborators {
        sourcemod: Arc::clone(&fakes.sourcemod) as Arc<dyn SourcemodRepository>,
        persons: Arc::clone(&fakes.persons) as Arc<dyn PersonProvider>,
        ban_states: Arc::clone(&fakes.bans) as Arc<dyn BanStateLookup>,
        evasion: Arc::clone(&fakes.evasion) as Arc<dyn EvadeChecker>,
        notifier: Arc::clone(&fakes.notifier) as Arc<dyn Notifier>,
        steam_ids: Arc::clone(&fakes.steam_ids) as Arc<dyn SteamIdResolver>,
    });

    (cx, fakes)
}

/// `[U:1:{account_id}]`
pub fn steam_id(account_id: u32) -> SteamId {
    SteamId::from_account_id(account_id).unwrap_or(SteamId::MIN)
}

pub fn ip(ip: &str) -> IpAddr {
    ip.parse().unwrap_or_else(|error| panic!("invalid test address `{ip}`: {error}"))
}

/// A name-authenticated admin without flags or groups.
pub fn new_admin(name: &str) -> NewAdmin<'_> {
    NewAdmin {
        name,
        auth_type: AuthType::Name,
        identity: name,
        flags: "",
        immunity: 0,
        password: "hunter2",
    }
}

/// An active 30-day cheating ban against `steam_id`.
pub fn ban(steam_id: SteamId, ban_source: BanSource, ban_type: BanType) -> PlayerBanState {
    PlayerBanState {
        steam_id: Some(steam_id),
        ban_source,
        ban_id: 1,
        ban_type,
        reason: BanReason::Cheating,
        evade_ok: false,
        valid_until: Timestamp::now() + Duration::days(30),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A constraint violation shaped like the ones MySQL reports.
#[derive(Debug, Display, Error)]
#[display("{message}")]
struct ConstraintViolation {
    #[error(ignore)]
    kind: ConstraintKind,

    #[error(ignore)]
    message: String,
}

#[derive(Debug, Clone, Copy)]
enum ConstraintKind {
    Unique,
    ForeignKey,
}

impl ConstraintViolation {
    fn unique(key: &str) -> database::Error {
        Self::into_database_error(ConstraintKind::Unique, format!("Duplicate entry for key '{key}'"))
    }

    fn foreign_key(key: &str) -> database::Error {
        Self::into_database_error(
            ConstraintKind::ForeignKey,
            format!("Cannot add or update a child row: a foreign key constraint fails ({key})"),
        )
    }

    fn into_database_error(kind: ConstraintKind, message: String) -> database::Error {
        database::Error::from(sqlx::Error::Database(Box::new(Self { kind, message })))
    }
}

impl DatabaseError for ConstraintViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.kind {
            ConstraintKind::Unique => ErrorKind::UniqueViolation,
            ConstraintKind::ForeignKey => ErrorKind::ForeignKeyViolation,
        }
    }
}

/// A [`SourcemodRepository`] that keeps everything in memory.
///
/// Constraint violations are reported the same way MySQL reports them, and multi-table deletes
/// happen under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    fail_next: AtomicBool,
}

#[derive(Debug, Default)]
struct Tables {
    admins: Table<AdminId, Admin>,
    groups: Table<GroupId, Group>,
    memberships: Vec<Membership>,
    immunities: Table<GroupImmunityId, StoredImmunity>,
    overrides: Table<OverrideId, Override>,
    group_overrides: Table<GroupOverrideId, GroupOverride>,
}

#[derive(Debug)]
struct Table<Id, Row> {
    last_id: u32,
    rows: BTreeMap<Id, Row>,
}

#[derive(Debug, Clone, Copy)]
struct Membership {
    admin_id: AdminId,
    group_id: GroupId,
    inherit_order: u32,
}

#[derive(Debug, Clone, Copy)]
struct StoredImmunity {
    group_id: GroupId,
    other_id: GroupId,
    created_on: Timestamp,
}

impl<Id, Row> Default for Table<Id, Row> {
    fn default() -> Self {
        Self { last_id: 0, rows: BTreeMap::new() }
    }
}

impl<Id: Ord + From<u32>, Row> Table<Id, Row> {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        Id::from(self.last_id)
    }
}

impl InMemoryRepository {
    /// Makes the next call fail as if the connection was lost.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn tables(&self) -> database::Result<MutexGuard<'_, Tables>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(database::Error::connection_lost());
        }

        Ok(lock(&self.tables))
    }
}

impl Tables {
    fn admin_with_groups(&self, admin: &Admin) -> Admin {
        Admin { groups: self.groups_of(admin.id), ..admin.clone() }
    }

    fn groups_of(&self, admin_id: AdminId) -> Vec<Group> {
        let mut memberships = self
            .memberships
            .iter()
            .filter(|membership| membership.admin_id == admin_id)
            .collect::<Vec<_>>();

        memberships.sort_by_key(|membership| membership.inherit_order);
        memberships
            .into_iter()
            .filter_map(|membership| self.groups.rows.get(&membership.group_id).cloned())
            .collect()
    }

    fn immunity(&self, id: GroupImmunityId, stored: &StoredImmunity) -> Option<GroupImmunity> {
        Some(GroupImmunity {
            id,
            group: self.groups.rows.get(&stored.group_id)?.clone(),
            other: self.groups.rows.get(&stored.other_id)?.clone(),
            created_on: stored.created_on,
        })
    }

    fn identity_taken(&self, record: &AdminRecord, except: Option<AdminId>) -> bool {
        self.admins.rows.values().any(|admin| {
            Some(admin.id) != except
                && admin.auth_type == record.auth_type
                && admin.identity == record.identity
        })
    }

    fn group_name_taken(&self, name: &str, except: Option<GroupId>) -> bool {
        self.groups
            .rows
            .values()
            .any(|group| Some(group.id) != except && group.name == name)
    }

    fn override_taken(&self, record: &OverrideRecord, except: Option<OverrideId>) -> bool {
        self.overrides.rows.values().any(|r#override| {
            Some(r#override.id) != except
                && r#override.kind == record.kind
                && r#override.name == record.name
        })
    }

    fn group_override_taken(
        &self,
        group_id: GroupId,
        record: &GroupOverrideRecord,
        except: Option<GroupOverrideId>,
    ) -> bool {
        self.group_overrides.rows.values().any(|group_override| {
            Some(group_override.id) != except
                && group_override.group_id == group_id
                && group_override.kind == record.kind
                && group_override.name == record.name
        })
    }
}

#[async_trait::async_trait]
impl SourcemodRepository for InMemoryRepository {
    async fn admins(&self) -> database::Result<Vec<Admin>> {
        let tables = self.tables()?;

        Ok(tables
            .admins
            .rows
            .values()
            .map(|admin| tables.admin_with_groups(admin))
            .collect())
    }

    async fn admin_by_id(&self, admin_id: AdminId) -> database::Result<Option<Admin>> {
        let tables = self.tables()?;

        Ok(tables
            .admins
            .rows
            .get(&admin_id)
            .map(|admin| tables.admin_with_groups(admin)))
    }

    async fn admin_by_identity(
        &self,
        auth_type: AuthType,
        identity: &str,
    ) -> database::Result<Option<Admin>> {
        let tables = self.tables()?;

        Ok(tables
            .admins
            .rows
            .values()
            .find(|admin| admin.auth_type == auth_type && admin.identity == identity)
            .map(|admin| tables.admin_with_groups(admin)))
    }

    async fn insert_admin(&self, record: &AdminRecord) -> database::Result<Admin> {
        let mut tables = self.tables()?;

        if tables.identity_taken(record, None) {
            return Err(ConstraintViolation::unique("UC_identity"));
        }

        let now = Timestamp::now();
        let admin = Admin {
            id: tables.admins.next_id(),
            steam_id: record.steam_id,
            auth_type: record.auth_type,
            identity: record.identity.clone(),
            password: record.password.clone(),
            flags: record.flags.clone(),
            name: record.name.clone(),
            immunity: record.immunity,
            groups: Vec::new(),
            created_on: now,
            updated_on: now,
        };

        tables.admins.rows.insert(admin.id, admin.clone());

        Ok(admin)
    }

    async fn update_admin(&self, admin_id: AdminId, record: &AdminRecord) -> database::Result<bool> {
        let mut tables = self.tables()?;

        if tables.identity_taken(record, Some(admin_id)) {
            return Err(ConstraintViolation::unique("UC_identity"));
        }

        let Some(admin) = tables.admins.rows.get_mut(&admin_id) else {
            return Ok(false);
        };

        admin.steam_id = record.steam_id;
        admin.auth_type = record.auth_type;
        admin.identity = record.identity.clone();
        admin.password = record.password.clone();
        admin.flags = record.flags.clone();
        admin.name = record.name.clone();
        admin.immunity = record.immunity;
        admin.updated_on = Timestamp::now();

        Ok(true)
    }

    async fn delete_admin(&self, admin_id: AdminId) -> database::Result<bool> {
        let mut tables = self.tables()?;

        tables.memberships.retain(|membership| membership.admin_id != admin_id);

        Ok(tables.admins.rows.remove(&admin_id).is_some())
    }

    async fn admin_groups(&self, admin_id: AdminId) -> database::Result<Vec<Group>> {
        Ok(self.tables()?.groups_of(admin_id))
    }

    async fn insert_admin_group(
        &self,
        admin_id: AdminId,
        group_id: GroupId,
        inherit_order: u32,
    ) -> database::Result<()> {
        let mut tables = self.tables()?;

        if !tables.admins.rows.contains_key(&admin_id) {
            return Err(ConstraintViolation::foreign_key("admin_id"));
        }

        if !tables.groups.rows.contains_key(&group_id) {
            return Err(ConstraintViolation::foreign_key("group_id"));
        }

        if tables
            .memberships
            .iter()
            .any(|membership| membership.admin_id == admin_id && membership.group_id == group_id)
        {
            return Err(ConstraintViolation::unique("PRIMARY"));
        }

        tables.memberships.push(Membership { admin_id, group_id, inherit_order });

        Ok(())
    }

    async fn delete_admin_group(
        &self,
        admin_id: AdminId,
        group_id: GroupId,
    ) -> database::Result<bool> {
        let mut tables = self.tables()?;
        let before = tables.memberships.len();

        tables
            .memberships
            .retain(|membership| !(membership.admin_id == admin_id && membership.group_id == group_id));

        Ok(tables.memberships.len() != before)
    }

    async fn replace_admin_groups(
        &self,
        admin_id: AdminId,
        group_ids: &[GroupId],
    ) -> database::Result<()> {
        let mut tables = self.tables()?;

        if let Some(&missing) = group_ids.iter().find(|id| !tables.groups.rows.contains_key(id)) {
            return Err(ConstraintViolation::foreign_key(&format!("group_id = {missing}")));
        }

        tables.memberships.retain(|membership| membership.admin_id != admin_id);

        for (inherit_order, &group_id) in (1..).zip(group_ids) {
            tables.memberships.push(Membership { admin_id, group_id, inherit_order });
        }

        Ok(())
    }

    async fn groups(&self) -> database::Result<Vec<Group>> {
        Ok(self.tables()?.groups.rows.values().cloned().collect())
    }

    async fn group_by_id(&self, group_id: GroupId) -> database::Result<Option<Group>> {
        Ok(self.tables()?.groups.rows.get(&group_id).cloned())
    }

    async fn group_by_name(&self, name: &str) -> database::Result<Option<Group>> {
        Ok(self
            .tables()?
            .groups
            .rows
            .values()
            .find(|group| group.name == name)
            .cloned())
    }

    async fn insert_group(&self, record: &GroupRecord) -> database::Result<Group> {
        let mut tables = self.tables()?;

        if tables.group_name_taken(&record.name, None) {
            return Err(ConstraintViolation::unique("UC_name"));
        }

        let now = Timestamp::now();
        let group = Group {
            id: tables.groups.next_id(),
            flags: record.flags.clone(),
            name: record.name.clone(),
            immunity_level: record.immunity_level,
            created_on: now,
            updated_on: now,
        };

        tables.groups.rows.insert(group.id, group.clone());

        Ok(group)
    }

    async fn update_group(&self, group_id: GroupId, record: &GroupRecord) -> database::Result<bool> {
        let mut tables = self.tables()?;

        if tables.group_name_taken(&record.name, Some(group_id)) {
            return Err(ConstraintViolation::unique("UC_name"));
        }

        let Some(group) = tables.groups.rows.get_mut(&group_id) else {
            return Ok(false);
        };

        group.flags = record.flags.clone();
        group.name = record.name.clone();
        group.immunity_level = record.immunity_level;
        group.updated_on = Timestamp::now();

        Ok(true)
    }

    async fn delete_group(&self, group_id: GroupId) -> database::Result<bool> {
        let mut tables = self.tables()?;

        if !tables.groups.rows.contains_key(&group_id) {
            return Ok(false);
        }

        tables.memberships.retain(|membership| membership.group_id != group_id);
        tables
            .group_overrides
            .rows
            .retain(|_, group_override| group_override.group_id != group_id);
        tables
            .immunities
            .rows
            .retain(|_, immunity| immunity.group_id != group_id && immunity.other_id != group_id);
        tables.groups.rows.remove(&group_id);

        Ok(true)
    }

    async fn group_immunities(&self) -> database::Result<Vec<GroupImmunity>> {
        let tables = self.tables()?;

        Ok(tables
            .immunities
            .rows
            .iter()
            .filter_map(|(&id, stored)| tables.immunity(id, stored))
            .collect())
    }

    async fn group_immunity_by_id(
        &self,
        id: GroupImmunityId,
    ) -> database::Result<Option<GroupImmunity>> {
        let tables = self.tables()?;

        Ok(tables
            .immunities
            .rows
            .get(&id)
            .and_then(|stored| tables.immunity(id, stored)))
    }

    async fn insert_group_immunity(
        &self,
        group_id: GroupId,
        other_id: GroupId,
    ) -> database::Result<GroupImmunityId> {
        let mut tables = self.tables()?;

        if !tables.groups.rows.contains_key(&group_id) || !tables.groups.rows.contains_key(&other_id)
        {
            return Err(ConstraintViolation::foreign_key("FK_group_immunity_group_id"));
        }

        if tables
            .immunities
            .rows
            .values()
            .any(|immunity| immunity.group_id == group_id && immunity.other_id == other_id)
        {
            return Err(ConstraintViolation::unique("UC_group_id_other_id"));
        }

        let id = tables.immunities.next_id();
        tables.immunities.rows.insert(id, StoredImmunity {
            group_id,
            other_id,
            created_on: Timestamp::now(),
        });

        Ok(id)
    }

    async fn delete_group_immunity(&self, id: GroupImmunityId) -> database::Result<bool> {
        Ok(self.tables()?.immunities.rows.remove(&id).is_some())
    }

    async fn overrides(&self) -> database::Result<Vec<Override>> {
        Ok(self.tables()?.overrides.rows.values().cloned().collect())
    }

    async fn override_by_id(&self, id: OverrideId) -> database::Result<Option<Override>> {
        Ok(self.tables()?.overrides.rows.get(&id).cloned())
    }

    async fn insert_override(&self, record: &OverrideRecord) -> database::Result<Override> {
        let mut tables = self.tables()?;

        if tables.override_taken(record, None) {
            return Err(ConstraintViolation::unique("UC_override"));
        }

        let now = Timestamp::now();
        let r#override = Override {
            id: tables.overrides.next_id(),
            kind: record.kind,
            name: record.name.clone(),
            flags: record.flags.clone(),
            created_on: now,
            updated_on: now,
        };

        tables.overrides.rows.insert(r#override.id, r#override.clone());

        Ok(r#override)
    }

    async fn update_override(
        &self,
        id: OverrideId,
        record: &OverrideRecord,
    ) -> database::Result<bool> {
        let mut tables = self.tables()?;

        if tables.override_taken(record, Some(id)) {
            return Err(ConstraintViolation::unique("UC_override"));
        }

        let Some(r#override) = tables.overrides.rows.get_mut(&id) else {
            return Ok(false);
        };

        r#override.kind = record.kind;
        r#override.name = record.name.clone();
        r#override.flags = record.flags.clone();
        r#override.updated_on = Timestamp::now();

        Ok(true)
    }

    async fn delete_override(&self, id: OverrideId) -> database::Result<bool> {
        Ok(self.tables()?.overrides.rows.remove(&id).is_some())
    }

    async fn group_overrides(&self, group_id: GroupId) -> database::Result<Vec<GroupOverride>> {
        Ok(self
            .tables()?
            .group_overrides
            .rows
            .values()
            .filter(|group_override| group_override.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn group_override_by_id(
        &self,
        id: GroupOverrideId,
    ) -> database::Result<Option<GroupOverride>> {
        Ok(self.tables()?.group_overrides.rows.get(&id).cloned())
    }

    async fn insert_group_override(
        &self,
        group_id: GroupId,
        record: &GroupOverrideRecord,
    ) -> database::Result<GroupOverride> {
        let mut tables = self.tables()?;

        if !tables.groups.rows.contains_key(&group_id) {
            return Err(ConstraintViolation::foreign_key("FK_group_overrides_group_id"));
        }

        if tables.group_override_taken(group_id, record, None) {
            return Err(ConstraintViolation::unique("UC_group_override"));
        }

        let now = Timestamp::now();
        let group_override = GroupOverride {
            id: tables.group_overrides.next_id(),
            group_id,
            kind: record.kind,
            name: record.name.clone(),
            access: record.access,
            created_on: now,
            updated_on: now,
        };

        tables
            .group_overrides
            .rows
            .insert(group_override.id, group_override.clone());

        Ok(group_override)
    }

    async fn update_group_override(
        &self,
        id: GroupOverrideId,
        record: &GroupOverrideRecord,
    ) -> database::Result<bool> {
        let mut tables = self.tables()?;

        let Some(group_id) = tables
            .group_overrides
            .rows
            .get(&id)
            .map(|group_override| group_override.group_id)
        else {
            return Ok(false);
        };

        if tables.group_override_taken(group_id, record, Some(id)) {
            return Err(ConstraintViolation::unique("UC_group_override"));
        }

        if let Some(group_override) = tables.group_overrides.rows.get_mut(&id) {
            group_override.kind = record.kind;
            group_override.name = record.name.clone();
            group_override.access = record.access;
            group_override.updated_on = Timestamp::now();
        }

        Ok(true)
    }

    async fn delete_group_override(&self, id: GroupOverrideId) -> database::Result<bool> {
        Ok(self.tables()?.group_overrides.rows.remove(&id).is_some())
    }
}

/// Remembers every player it was asked about.
#[derive(Debug, Default)]
pub struct FakePersonProvider {
    known: Mutex<HashSet<SteamId>>,
    fail_next: AtomicBool,
}

impl FakePersonProvider {
    pub fn contains(&self, steam_id: SteamId) -> bool {
        lock(&self.known).contains(&steam_id)
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PersonProvider for FakePersonProvider {
    async fn get_or_create_person(
        &self,
        steam_id: SteamId,
    ) -> Result<Person, GetOrCreatePersonError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GetOrCreatePersonError::from(database::Error::connection_lost()));
        }

        lock(&self.known).insert(steam_id);

        Ok(Person { steam_id, created_on: Timestamp::now() })
    }
}

/// Serves bans inserted by the test.
///
/// Every stored ban is assumed to match the requester's address. A ban against the requester
/// themselves wins over bans against other accounts, which are ordered by severity.
#[derive(Debug, Default)]
pub struct FakeBanStateLookup {
    bans: Mutex<Vec<PlayerBanState>>,
    fail_next: AtomicBool,
}

impl FakeBanStateLookup {
    /// Stores `ban`, replacing any previous ban against the same account.
    pub fn insert(&self, ban: PlayerBanState) {
        let mut bans = lock(&self.bans);
        bans.retain(|existing| existing.steam_id != ban.steam_id);
        bans.push(ban);
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl BanStateLookup for FakeBanStateLookup {
    async fn query_ban_state(
        &self,
        steam_id: SteamId,
        _ip: IpAddr,
    ) -> database::Result<Option<PlayerBanState>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(database::Error::connection_lost());
        }

        let bans = lock(&self.bans);

        Ok(bans
            .iter()
            .find(|ban| ban.steam_id == Some(steam_id))
            .or_else(|| bans.iter().max_by_key(|ban| ban.ban_type))
            .cloned())
    }
}

/// Reports players flagged by the test as evading.
#[derive(Debug, Default)]
pub struct FakeEvadeChecker {
    flagged: Mutex<HashSet<SteamId>>,
    checks: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeEvadeChecker {
    pub fn flag(&self, steam_id: SteamId) {
        lock(&self.flagged).insert(steam_id);
    }

    /// How many times evasion status was checked.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EvadeChecker for FakeEvadeChecker {
    async fn check_evade_status(
        &self,
        steam_id: SteamId,
        _ip: IpAddr,
    ) -> Result<bool, CheckEvasionError> {
        self.checks.fetch_add(1, Ordering::SeqCst);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CheckEvasionError::new(database::Error::connection_lost()));
        }

        Ok(lock(&self.flagged).contains(&steam_id))
    }
}

/// Collects every notification instead of sending it.
#[derive(Debug, Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl FakeNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, notification: Notification) -> Result<(), SendNotificationError> {
        lock(&self.sent).push(notification);
        Ok(())
    }
}

/// Resolves the vanity names inserted by the test.
#[derive(Debug, Default)]
pub struct FakeSteamIdResolver {
    vanities: Mutex<BTreeMap<String, SteamId>>,
    fail_next: AtomicBool,
}

impl FakeSteamIdResolver {
    pub fn insert(&self, vanity: &str, steam_id: SteamId) {
        lock(&self.vanities).insert(vanity.to_owned(), steam_id);
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SteamIdResolver for FakeSteamIdResolver {
    async fn resolve_vanity(&self, vanity: &str) -> Result<Option<SteamId>, ResolveVanityError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ResolveVanityError::new("steam is unavailable"));
        }

        Ok(lock(&self.vanities).get(vanity).copied())
    }
}
