use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::time::FutureExt;

use crate::bans::BanStateLookup;
use crate::config::Config;
use crate::database::{self, Database, DatabaseConnectionOptions, EstablishDatabaseConnectionError};
use crate::evasion::{EvadeChecker, IpBanEvadeChecker};
use crate::notifications::{DiscordWebhookNotifier, LogNotifier, Notifier};
use crate::persons::PersonProvider;
use crate::seed::SeedQueue;
use crate::sourcemod::admins::Admin;
use crate::sourcemod::groups::Group;
use crate::sourcemod::search::SnapshotCache;
use crate::sourcemod::SourcemodRepository;
use crate::steam::{SteamIdResolver, SteamWebApi, WithoutWebApi};

mod inner {
    use super::*;

    pub(super) struct Context {
        pub(super) config: Config,
        pub(super) database: Option<Database>,
        pub(super) collaborators: Collaborators,
        pub(super) seed_queue: SeedQueue,
        pub(super) admin_snapshots: SnapshotCache<Admin>,
        pub(super) group_snapshots: SnapshotCache<Group>,
        pub(super) shutdown_token: CancellationToken,
        pub(super) tasks: TaskTracker,
    }
}

/// The engine's global state.
#[derive(Clone)]
pub struct Context(Arc<inner::Context>);

/// Everything the engine talks to that lives outside of it.
pub struct Collaborators {
    pub sourcemod: Arc<dyn SourcemodRepository>,
    pub persons: Arc<dyn PersonProvider>,
    pub ban_states: Arc<dyn BanStateLookup>,
    pub evasion: Arc<dyn EvadeChecker>,
    pub notifier: Arc<dyn Notifier>,
    pub steam_ids: Arc<dyn SteamIdResolver>,
}

#[derive(Debug, Display, Error, From)]
pub enum InitializeContextError {
    #[display("{_0}")]
    EstablishDatabaseConnection(EstablishDatabaseConnectionError),

    #[display("failed to run database migrations: {_0}")]
    RunDatabaseMigrations(sqlx::migrate::MigrateError),

    #[display("failed to initialize http client: {_0}")]
    InitializeHttpClient(reqwest::Error),
}

impl Context {
    /// Initializes a new [`Context`] backed by MySQL.
    pub async fn new(config: Config) -> Result<Self, InitializeContextError> {
        Self::with_shutdown_token(config, CancellationToken::new()).await
    }

    /// Initializes a new [`Context`] with the given cancellation token.
    ///
    /// The token will be cancelled by [`Context::cleanup()`] and is given to tasks spawned by the
    /// returned [`Context`].
    #[tracing::instrument(level = "debug", skip_all, err)]
    pub async fn with_shutdown_token(
        config: Config,
        shutdown_token: CancellationToken,
    ) -> Result<Self, InitializeContextError> {
        let database = Database::connect(DatabaseConnectionOptions {
            url: &config.database.url,
            min_connections: config.database.min_connections,
            max_connections: config.database.max_connections,
        })
        .await?;

        database::MIGRATIONS.run(database.as_ref()).await?;

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("gbans/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let notifier: Arc<dyn Notifier> = match config.discord.seed_webhook_url.clone() {
            Some(webhook_url) => {
                Arc::new(DiscordWebhookNotifier::new(http_client.clone(), webhook_url))
            },
            None => {
                info!("no discord webhook configured; notifications will only be logged");
                Arc::new(LogNotifier)
            },
        };

        let steam_ids: Arc<dyn SteamIdResolver> = match config.steam.web_api_key.as_deref() {
            Some(api_key) => Arc::new(SteamWebApi::new(http_client, api_key)),
            None => {
                info!("no steam web api key configured; vanity names cannot be resolved");
                Arc::new(WithoutWebApi)
            },
        };

        let ban_states: Arc<dyn BanStateLookup> = Arc::new(database.clone());
        let collaborators = Collaborators {
            sourcemod: Arc::new(database.clone()),
            persons: Arc::new(database.clone()),
            evasion: Arc::new(IpBanEvadeChecker::new(Arc::clone(&ban_states))),
            ban_states,
            notifier,
            steam_ids,
        };

        Ok(Self::build(config, Some(database), collaborators, shutdown_token))
    }

    /// Builds a [`Context`] around existing collaborators.
    ///
    /// No database connection is opened.
    pub fn from_parts(config: Config, collaborators: Collaborators) -> Self {
        Self::build(config, None, collaborators, CancellationToken::new())
    }

    fn build(
        config: Config,
        database: Option<Database>,
        collaborators: Collaborators,
        shutdown_token: CancellationToken,
    ) -> Self {
        let seed_queue = SeedQueue::new(config.sourcemod.seed_cooldown);
        let admin_snapshots = SnapshotCache::new(config.sourcemod.cache_ttl);
        let group_snapshots = SnapshotCache::new(config.sourcemod.cache_ttl);

        Self(Arc::new(inner::Context {
            config,
            database,
            collaborators,
            seed_queue,
            admin_snapshots,
            group_snapshots,
            shutdown_token,
            tasks: TaskTracker::new(),
        }))
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn sourcemod(&self) -> &dyn SourcemodRepository {
        &*self.0.collaborators.sourcemod
    }

    pub fn persons(&self) -> &dyn PersonProvider {
        &*self.0.collaborators.persons
    }

    pub fn ban_states(&self) -> &dyn BanStateLookup {
        &*self.0.collaborators.ban_states
    }

    pub fn evasion(&self) -> &dyn EvadeChecker {
        &*self.0.collaborators.evasion
    }

    pub fn notifier(&self) -> &dyn Notifier {
        &*self.0.collaborators.notifier
    }

    pub fn steam_ids(&self) -> &dyn SteamIdResolver {
        &*self.0.collaborators.steam_ids
    }

    /// An owned handle to the notifier, for use in spawned tasks.
    pub fn notifier_handle(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.0.collaborators.notifier)
    }

    pub fn seed_queue(&self) -> &SeedQueue {
        &self.0.seed_queue
    }

    pub(crate) fn admin_snapshots(&self) -> &SnapshotCache<Admin> {
        &self.0.admin_snapshots
    }

    pub(crate) fn group_snapshots(&self) -> &SnapshotCache<Group> {
        &self.0.group_snapshots
    }

    /// Tracks the future produced by `make_future` and spawns it as a tokio task.
    ///
    /// `make_future` is given a [`CancellationToken`] the produced future can use to detect when
    /// the server is shutting down.
    pub fn spawn<F, Fut>(&self, name: &str, make_future: F) -> task::JoinHandle<Fut::Output>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let cancellation_token = self.0.shutdown_token.child_token();
        let task = self.0.tasks.track_future(make_future(cancellation_token));

        trace!(name, "spawning task");
        task::spawn(task)
    }

    /// Initiates cleanup.
    ///
    /// All tasks spawned by this [`Context`] will be notified and are given a few seconds to
    /// exit. Open database connections are closed gracefully.
    #[tracing::instrument(level = "debug")]
    pub async fn cleanup(self) {
        self.shutdown_tasks(Duration::from_secs(10)).await;

        if let Some(database) = &self.0.database {
            let timeout = Duration::from_secs(5);

            if database.cleanup().timeout(timeout).await.is_err() {
                warn!(?timeout, "failed to cleanup database connections within timeout");
            }
        }
    }

    async fn shutdown_tasks(&self, timeout: Duration) {
        self.0.tasks.close();
        self.0.shutdown_token.cancel();

        if self.0.tasks.wait().timeout(timeout).await.is_err() {
            warn!(?timeout, "tasks did not shutdown within timeout");
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Context")
            .field("config", &self.0.config)
            .field("database", &self.0.database)
            .field("seed_queue", &self.0.seed_queue)
            .finish_non_exhaustive()
    }
}
