//! Seed requests.
//!
//! Players on an empty server can ask for others to join ("seed" the server). Requests are
//! rate-limited per server, and a player who just asked on one server cannot immediately ask
//! again on another.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::notifications::Notification;
use crate::servers::{Server, ServerId};
use crate::{Context, SteamId};

/// Tracks the most recent seed request of every server.
#[derive(Debug)]
pub struct SeedQueue {
    min_time: Duration,
    servers: Mutex<HashMap<ServerId, SeedRequest>>,
}

#[derive(Debug, Clone, Copy)]
struct SeedRequest {
    steam_id: SteamId,
    created_on: Instant,
}

impl SeedQueue {
    pub fn new(min_time: Duration) -> Self {
        Self { min_time, servers: Mutex::new(HashMap::new()) }
    }

    /// Records a request by `steam_id` for `server_id` if it is allowed right now.
    pub fn allowed(&self, server_id: ServerId, steam_id: SteamId) -> bool {
        self.allowed_at(server_id, steam_id, Instant::now())
    }

    /// Like [`SeedQueue::allowed()`], but with an explicit "now".
    ///
    /// If the server has no recent request, the requester's latest request on any other server
    /// is used instead.
    pub fn allowed_at(&self, server_id: ServerId, steam_id: SteamId, now: Instant) -> bool {
        let mut servers = self.servers.lock().unwrap_or_else(PoisonError::into_inner);

        let baseline = servers.get(&server_id).copied().or_else(|| {
            servers
                .values()
                .filter(|request| request.steam_id == steam_id)
                .max_by_key(|request| request.created_on)
                .copied()
        });

        if baseline.is_some_and(|request| !self.expired(request, now)) {
            return false;
        }

        servers.retain(|_, request| !self.expired(*request, now));
        servers.insert(server_id, SeedRequest { steam_id, created_on: now });

        true
    }

    fn expired(&self, request: SeedRequest, now: Instant) -> bool {
        now.saturating_duration_since(request.created_on) > self.min_time
    }
}

/// Asks players subscribed to `server` to come and join it.
///
/// Returns whether a notification was sent.
#[tracing::instrument(skip(cx, server), fields(server = %server), ret(level = "debug"))]
pub fn request_seed(cx: &Context, server: &Server, steam_id: SteamId) -> bool {
    if !cx.seed_queue().allowed(server.id, steam_id) {
        debug!("seed request is on cooldown");
        return false;
    }

    if server.seed_role_ids.is_empty() {
        error!(server = %server.short_name, "server has no seed roles");
        return false;
    }

    let notification = Notification::seed_request(render_seed_request(server));
    let notifier = cx.notifier_handle();

    cx.spawn("gbans::seed_request", move |_| async move {
        if let Err(error) = notifier.send(notification).await {
            warn!(%error, "failed to send seed request");
        }
    });

    info!(%steam_id, "requested seed");

    true
}

fn render_seed_request(server: &Server) -> String {
    let mut content = format!("# Seed Request\n{}\nconnect {}\n", server.short_name, server.address);

    for role_id in &server.seed_role_ids {
        let _ = write!(content, "<@&{role_id}> ");
    }

    content.truncate(content.trim_end().len());
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;
    use crate::testing;

    const MIN_TIME: Duration = Duration::from_secs(300);

    fn server(id: u32, seed_role_ids: &[&str]) -> Server {
        Server {
            id: ServerId::new(id),
            short_name: format!("us-{id}"),
            address: format!("10.0.0.{id}:27015"),
            seed_role_ids: seed_role_ids.iter().map(|&role| String::from(role)).collect(),
        }
    }

    #[test]
    fn servers_are_rate_limited() {
        let queue = SeedQueue::new(MIN_TIME);
        let now = Instant::now();
        let server = ServerId::new(1);

        assert!(queue.allowed_at(server, testing::steam_id(1), now));
        assert!(!queue.allowed_at(server, testing::steam_id(2), now + Duration::from_secs(60)));
        assert!(!queue.allowed_at(server, testing::steam_id(1), now + MIN_TIME));
        assert!(queue.allowed_at(server, testing::steam_id(2), now + MIN_TIME + Duration::from_secs(1)));
    }

    #[test]
    fn players_cannot_hop_between_servers() {
        let queue = SeedQueue::new(MIN_TIME);
        let now = Instant::now();
        let player = testing::steam_id(1);

        assert!(queue.allowed_at(ServerId::new(1), player, now));
        assert!(!queue.allowed_at(ServerId::new(2), player, now + Duration::from_secs(10)));

        // someone else may still ask for the other server
        assert!(queue.allowed_at(ServerId::new(2), testing::steam_id(2), now + Duration::from_secs(10)));

        let later = now + MIN_TIME + Duration::from_secs(1);
        assert!(queue.allowed_at(ServerId::new(3), player, later));
    }

    #[test]
    fn renders_role_mentions() {
        let content = render_seed_request(&server(1, &["123", "456"]));

        assert_eq!(content, "# Seed Request\nus-1\nconnect 10.0.0.1:27015\n<@&123> <@&456>");
    }

    #[tokio::test]
    async fn sends_notifications() {
        let (cx, fakes) = testing::context_with_fakes();
        let server = server(1, &["123"]);

        assert!(request_seed(&cx, &server, testing::steam_id(1)));
        assert!(!request_seed(&cx, &server, testing::steam_id(2)));

        cx.clone().cleanup().await;

        let sent = fakes.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::SeedRequest);
        assert!(sent[0].content.ends_with("<@&123>"));
    }

    #[tokio::test]
    async fn servers_without_roles_are_skipped() {
        let (cx, fakes) = testing::context_with_fakes();

        assert!(!request_seed(&cx, &server(1, &[]), testing::steam_id(1)));

        cx.clone().cleanup().await;
        assert!(fakes.notifier.sent().is_empty());
    }
}
