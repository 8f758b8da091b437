//! The paginated, filterable guild directory.
//!
//! Pages accumulate into one entity map; applying a new filter descriptor is
//! the only path that clears it. The store owns its copy of every guild —
//! the focused-guild store holds an independent copy of the same record, and
//! keeping the two in sync after a mutation is the caller's job (see
//! [`crate::stores::guild`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::models::{Guild, GuildFilters, GuildPatch};
use crate::notifications::{NotificationDraft, SharedNotifications};
use crate::transport::Transport;

/// Requested page size. A returned page shorter than this marks the end of
/// the directory.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Default)]
struct ListMeta {
    /// Pages loaded so far, in load order. The cursor for `fetch_next_page`
    /// is the last entry.
    loaded_pages: Vec<u32>,
    filters: GuildFilters,
    has_more: bool,
}

pub struct GuildsStore {
    transport: Arc<dyn Transport>,
    notifications: SharedNotifications,
    guilds: DashMap<u64, Guild>,
    meta: RwLock<ListMeta>,
    loading: AtomicBool,
}

/// Shared collection store type
pub type SharedGuildsStore = Arc<GuildsStore>;

pub fn create_shared_guilds_store(
    transport: Arc<dyn Transport>,
    notifications: SharedNotifications,
) -> SharedGuildsStore {
    Arc::new(GuildsStore::new(transport, notifications))
}

impl GuildsStore {
    pub fn new(transport: Arc<dyn Transport>, notifications: SharedNotifications) -> Self {
        Self {
            transport,
            notifications,
            guilds: DashMap::new(),
            meta: RwLock::new(ListMeta {
                loaded_pages: Vec::new(),
                filters: GuildFilters::default(),
                has_more: true,
            }),
            loading: AtomicBool::new(false),
        }
    }

    /// Fetch one page under the current filter descriptor. With `reset` the
    /// map is replaced instead of merged and `has_more` starts over at true.
    ///
    /// Concurrent calls are not deduplicated here; callers that need
    /// exact-once pagination must serialize their own calls.
    pub async fn fetch_page(&self, page: u32, reset: bool) {
        debug!("Fetching guild page {} (reset={})", page, reset);
        self.loading.store(true, Ordering::SeqCst);

        let filters = {
            let mut meta = self.meta.write();
            if reset {
                meta.has_more = true;
            }
            meta.filters.clone()
        };

        let result = self.transport.list_guilds(page, PAGE_SIZE, &filters).await;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to fetch guild page {}: {}", page, e);
                self.notifications.push(NotificationDraft::error(
                    "Could not load guilds, please try again later",
                    "guilds_fetch",
                ));
                self.loading.store(false, Ordering::SeqCst);
                return;
            }
        };

        if reset {
            self.guilds.clear();
        }
        let count = fetched.len();
        for guild in fetched {
            self.guilds.insert(guild.id, guild);
        }

        {
            let mut meta = self.meta.write();
            if count < PAGE_SIZE as usize {
                meta.has_more = false;
            }
            if reset {
                meta.loaded_pages.clear();
            }
            meta.loaded_pages.push(page);
        }

        info!("Loaded guild page {}: {} entries", page, count);
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Load the page after the highest one loaded so far (page 1 when the
    /// map is fresh). The cursor advance is optimistic: two back-to-back
    /// calls before the first resolves compute the same "next" page.
    pub async fn fetch_next_page(&self) {
        let last_page = self.meta.read().loaded_pages.last().copied().unwrap_or(0);
        self.fetch_page(last_page + 1, false).await;
    }

    /// Replace the filter descriptor and refetch from page 1. The sole path
    /// that discards accumulated pages.
    pub async fn apply_filters(&self, filters: GuildFilters) {
        info!("Applying guild filters: {:?}", filters);
        self.meta.write().filters = filters;
        self.fetch_page(1, true).await;
    }

    /// Local-only merge into the stored copy; no-op when the id is not in
    /// the map. Never talks to the transport — remote operations that need
    /// to update the list call this after they resolve.
    pub fn patch_guild(&self, id: u64, patch: &GuildPatch) {
        match self.guilds.get_mut(&id) {
            Some(mut entry) => patch.apply_to(&mut entry),
            None => debug!("Patch for guild {} ignored, not in collection", id),
        }
    }

    /// Optimistic vote: the +1 and the 24h cooldown land in the local copy
    /// before the remote call is even issued. The remote vote is
    /// fire-and-forget; a failure surfaces as a notification and the
    /// optimistic patch stays.
    pub async fn vote_for(&self, id: u64) {
        let now = Utc::now();
        {
            if let Some(entry) = self.guilds.get(&id) {
                let patch = GuildPatch::voted(now, entry.votes);
                drop(entry);
                self.patch_guild(id, &patch);
            }
        }

        if let Err(e) = self.transport.vote(id).await {
            warn!("Vote for guild {} failed: {}", id, e);
            self.notifications.push(NotificationDraft::error(
                "Your vote could not be submitted",
                "vote_error",
            ));
        }
    }

    // Read-only snapshots.

    /// Current directory contents in render order: by ranking, unranked
    /// last, ties broken by id.
    pub fn guilds(&self) -> Vec<Guild> {
        let mut all: Vec<Guild> = self.guilds.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|g| (g.ranking.is_none(), g.ranking, g.id));
        all
    }

    pub fn guild(&self, id: u64) -> Option<Guild> {
        self.guilds.get(&id).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub fn filters(&self) -> GuildFilters {
        self.meta.read().filters.clone()
    }

    pub fn has_more(&self) -> bool {
        self.meta.read().has_more
    }

    /// The most recently loaded page, if any.
    pub fn last_page(&self) -> Option<u32> {
        self.meta.read().loaded_pages.last().copied()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::create_shared_notifications;
    use crate::transport::mock::{Call, MockTransport};

    fn store_with(mock: &Arc<MockTransport>) -> (SharedGuildsStore, SharedNotifications) {
        let notifications = create_shared_notifications();
        let store = create_shared_guilds_store(mock.clone(), notifications.clone());
        (store, notifications)
    }

    fn full_page(offset: u64) -> Vec<Guild> {
        (offset..offset + PAGE_SIZE as u64)
            .map(MockTransport::guild)
            .collect()
    }

    #[tokio::test]
    async fn full_page_keeps_has_more_short_page_ends_it() {
        let mock = MockTransport::new();
        mock.push_page(full_page(1));
        mock.push_page((21..28).map(MockTransport::guild).collect());
        let (store, _) = store_with(&mock);

        store.fetch_page(1, false).await;
        assert_eq!(store.len(), 20);
        assert!(store.has_more());

        store.fetch_page(2, false).await;
        assert_eq!(store.len(), 27);
        assert!(!store.has_more());

        // Still callable after the end; it just comes back empty.
        store.fetch_next_page().await;
        assert_eq!(store.len(), 27);
        assert_eq!(store.last_page(), Some(3));
    }

    #[tokio::test]
    async fn next_page_advances_from_highest_loaded() {
        let mock = MockTransport::new();
        mock.push_page(full_page(1));
        mock.push_page(full_page(21));
        let (store, _) = store_with(&mock);

        store.fetch_next_page().await;
        store.fetch_next_page().await;

        let pages: Vec<u32> = mock
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::ListGuilds { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![1, 2]);
        assert_eq!(store.last_page(), Some(2));
    }

    #[tokio::test]
    async fn apply_filters_resets_pages_and_map() {
        let mock = MockTransport::new();
        mock.push_page(full_page(1));
        mock.push_page((21..25).map(MockTransport::guild).collect());
        mock.push_page(vec![MockTransport::guild(100)]);
        let (store, _) = store_with(&mock);

        store.fetch_page(1, false).await;
        store.fetch_page(2, false).await;
        assert_eq!(store.len(), 24);
        assert!(!store.has_more());

        let filters = GuildFilters {
            platform: Some("pc".to_string()),
            language: None,
        };
        store.apply_filters(filters.clone()).await;

        // Back on page 1, map rebuilt from scratch under the new descriptor.
        assert_eq!(store.last_page(), Some(1));
        assert_eq!(store.len(), 1);
        assert!(store.guild(100).is_some());
        assert!(store.guild(1).is_none());
        assert_eq!(store.filters(), filters);
        // Short page again, so the reset `has_more = true` flips back off.
        assert!(!store.has_more());
        match mock.calls().last().unwrap() {
            Call::ListGuilds { page, filters: sent, .. } => {
                assert_eq!(*page, 1);
                assert_eq!(sent.platform.as_deref(), Some("pc"));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failure_queues_notification_and_keeps_map() {
        let mock = MockTransport::new();
        mock.push_page(full_page(1));
        let (store, notifications) = store_with(&mock);

        store.fetch_page(1, false).await;
        mock.fail("list_guilds");
        store.fetch_page(2, false).await;

        assert_eq!(store.len(), 20);
        assert!(!store.is_loading());
        assert_eq!(store.last_page(), Some(1));
        let queue = notifications.notifications();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].dedup_key.as_deref(), Some("guilds_fetch"));
    }

    #[tokio::test]
    async fn patch_is_local_and_ignores_unknown_ids() {
        let mock = MockTransport::new();
        mock.push_page(vec![MockTransport::guild(1)]);
        let (store, _) = store_with(&mock);
        store.fetch_page(1, false).await;
        let before = mock.calls().len();

        store.patch_guild(
            1,
            &GuildPatch {
                votes: Some(50),
                ..Default::default()
            },
        );
        store.patch_guild(
            999,
            &GuildPatch {
                votes: Some(1),
                ..Default::default()
            },
        );

        assert_eq!(store.guild(1).unwrap().votes, 50);
        assert!(store.guild(999).is_none());
        assert_eq!(mock.calls().len(), before);
    }

    #[tokio::test]
    async fn vote_patches_before_the_remote_call_resolves() {
        let mock = MockTransport::new();
        mock.push_page(vec![MockTransport::guild(1)]);
        let (store, _) = store_with(&mock);
        store.fetch_page(1, false).await;

        let before = Utc::now();
        store.vote_for(1).await;
        let after = Utc::now();

        let guild = store.guild(1).unwrap();
        assert_eq!(guild.votes, 6);
        assert!(!guild.can_vote);
        let next = guild.next_vote_at.unwrap();
        assert!(next >= before + chrono::Duration::hours(24));
        assert!(next <= after + chrono::Duration::hours(24));
        assert!(mock.calls().contains(&Call::Vote { guild_id: 1 }));
    }

    #[tokio::test]
    async fn failed_vote_keeps_optimistic_patch() {
        let mock = MockTransport::new();
        mock.push_page(vec![MockTransport::guild(1)]);
        let (store, notifications) = store_with(&mock);
        store.fetch_page(1, false).await;
        mock.fail("vote");

        store.vote_for(1).await;

        let guild = store.guild(1).unwrap();
        assert_eq!(guild.votes, 6);
        assert!(!guild.can_vote);
        let queue = notifications.notifications();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].dedup_key.as_deref(), Some("vote_error"));
    }

    #[tokio::test]
    async fn snapshot_orders_by_ranking() {
        let mock = MockTransport::new();
        let mut unranked = MockTransport::guild(7);
        unranked.ranking = None;
        mock.push_page(vec![MockTransport::guild(3), unranked, MockTransport::guild(1)]);
        let (store, _) = store_with(&mock);
        store.fetch_page(1, false).await;

        let ids: Vec<u64> = store.guilds().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 3, 7]);
    }
}
