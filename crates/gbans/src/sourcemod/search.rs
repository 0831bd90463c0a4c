//! Autocomplete search over admins and groups.
//!
//! Moderation UIs query these on every keystroke, so results are served from a snapshot that is
//! only refreshed once it is older than the configured TTL (or empty).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::Context;
use crate::sourcemod::admins::{Admin, GetAdminsError};
use crate::sourcemod::groups::{GetGroupsError, Group};

/// A cached copy of an entire table.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot<T>>>,
}

#[derive(Debug)]
struct Snapshot<T> {
    refreshed_at: Instant,
    items: Arc<[T]>,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, snapshot: RwLock::new(None) }
    }

    /// Returns the cached items, calling `refresh` first if the snapshot is empty or stale.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<Arc<[T]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(items) = self.fresh(&*self.snapshot.read().await) {
            return Ok(items);
        }

        let mut snapshot = self.snapshot.write().await;

        // someone else may have refreshed while we were waiting for the lock
        if let Some(items) = self.fresh(&snapshot) {
            return Ok(items);
        }

        let items = Arc::<[T]>::from(refresh().await?);
        trace!(size = items.len(), "refreshed snapshot");

        *snapshot = Some(Snapshot { refreshed_at: Instant::now(), items: Arc::clone(&items) });

        Ok(items)
    }

    /// Drops the current snapshot so the next read refreshes it.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    fn fresh(&self, snapshot: &Option<Snapshot<T>>) -> Option<Arc<[T]>> {
        snapshot
            .as_ref()
            .filter(|snapshot| !snapshot.items.is_empty())
            .filter(|snapshot| snapshot.refreshed_at.elapsed() <= self.ttl)
            .map(|snapshot| Arc::clone(&snapshot.items))
    }
}

/// Returns every admin whose name or identity contains `query`, ignoring case.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn search_admins(cx: &Context, query: &str) -> Result<Vec<Admin>, GetAdminsError> {
    let admins = cx
        .admin_snapshots()
        .get_or_refresh(|| crate::sourcemod::admins::get(cx))
        .await?;

    let query = query.to_lowercase();

    Ok(admins
        .iter()
        .filter(|admin| {
            admin.name.to_lowercase().contains(&query)
                || admin.identity.to_lowercase().contains(&query)
        })
        .cloned()
        .collect())
}

/// Returns every group whose name contains `query`, ignoring case.
#[tracing::instrument(skip(cx), err(level = "debug"))]
pub async fn search_groups(cx: &Context, query: &str) -> Result<Vec<Group>, GetGroupsError> {
    let groups = cx
        .group_snapshots()
        .get_or_refresh(|| crate::sourcemod::groups::get(cx))
        .await?;

    let query = query.to_lowercase();

    Ok(groups
        .iter()
        .filter(|group| group.name.to_lowercase().contains(&query))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::sourcemod::groups::{self, NewGroup};
    use crate::testing;

    #[tokio::test(start_paused = true)]
    async fn refreshes_after_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let refreshes = AtomicUsize::new(0);
        let refresh = || async {
            refreshes.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(vec![1, 2, 3])
        };

        assert_eq!(&*cache.get_or_refresh(refresh).await.unwrap(), [1, 2, 3]);
        cache.get_or_refresh(refresh).await.unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.get_or_refresh(refresh).await.unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);

        cache.invalidate().await;
        cache.get_or_refresh(refresh).await.unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_snapshots_are_always_refreshed() {
        let cache = SnapshotCache::<u8>::new(Duration::from_secs(60));
        let refreshes = AtomicUsize::new(0);
        let refresh = || async {
            refreshes.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Vec::new())
        };

        cache.get_or_refresh(refresh).await.unwrap();
        cache.get_or_refresh(refresh).await.unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_errors_propagate() {
        let cache = SnapshotCache::<u8>::new(Duration::from_secs(60));

        assert_eq!(cache.get_or_refresh(|| async { Err("nope") }).await.unwrap_err(), "nope");
    }

    #[tokio::test]
    async fn searches_groups_case_insensitively() {
        let cx = testing::context();

        for name in ["Moderators", "Admins", "Trial Mods"] {
            groups::create(&cx, NewGroup { name, flags: "", immunity_level: 0 })
                .await
                .unwrap();
        }

        let mut names = search_groups(&cx, "MOD")
            .await
            .unwrap()
            .into_iter()
            .map(|group| group.name)
            .collect::<Vec<_>>();

        names.sort();
        assert_eq!(names, ["Moderators", "Trial Mods"]);

        // writes invalidate the snapshot
        groups::create(&cx, NewGroup { name: "Mod Squad", flags: "", immunity_level: 0 })
            .await
            .unwrap();

        assert_eq!(search_groups(&cx, "mod").await.unwrap().len(), 3);
    }
}
