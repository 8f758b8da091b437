//! The focused guild: the single record loaded for the detail view, with its
//! member roster and (on request) its pending applications.
//!
//! This store and the collection store hold independent copies of the same
//! guild. After a mutation here the caller must propagate the changed fields
//! into the collection with [`crate::stores::GuildsStore::patch_guild`]; the
//! two stores never converge on their own.
//!
//! Every load carries a sequence number. A resolution that is no longer the
//! latest issued load is discarded silently, so a slow superseded fetch can
//! never overwrite newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::models::{
    ApplicationDraft, Guild, GuildApplication, GuildMember, GuildWrite, MemberRole,
};
use crate::notifications::{NotificationDraft, SharedNotifications};
use crate::transport::Transport;

const NOT_FOUND_MESSAGE: &str = "There's no such guild";

/// How a load identifies its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildRef {
    Id(u64),
    Slug(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Show the loading state even when refetching the already-loaded guild.
    pub force_loading: bool,
    pub with_icon: bool,
    pub with_applications: bool,
}

/// The typed error surface for the not-found path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub message: String,
    pub code: u16,
}

#[derive(Debug, Default)]
struct FocusState {
    guild: Option<Guild>,
    members: Vec<GuildMember>,
    applications: Vec<GuildApplication>,
    loading: bool,
    error: Option<StoreError>,
}

pub struct GuildStore {
    transport: Arc<dyn Transport>,
    notifications: SharedNotifications,
    state: RwLock<FocusState>,
    /// Latest issued load sequence number; stale resolutions lose.
    load_seq: AtomicU64,
}

/// Shared focused-guild store type
pub type SharedGuildStore = Arc<GuildStore>;

pub fn create_shared_guild_store(
    transport: Arc<dyn Transport>,
    notifications: SharedNotifications,
) -> SharedGuildStore {
    Arc::new(GuildStore::new(transport, notifications))
}

impl GuildStore {
    pub fn new(transport: Arc<dyn Transport>, notifications: SharedNotifications) -> Self {
        Self {
            transport,
            notifications,
            state: RwLock::new(FocusState::default()),
            load_seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.load_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.load_seq.load(Ordering::SeqCst) != seq
    }

    fn push_error(&self, message: impl Into<String>) {
        self.notifications
            .push(NotificationDraft::error(message, "guild_error"));
    }

    /// Load a guild by id or slug and its member roster; pending
    /// applications only when `with_applications` is set, cleared otherwise.
    ///
    /// The loading flag only turns on when the target differs from the
    /// already-loaded guild (or `force_loading` is set), so refetching the
    /// same guild keeps stale data visible instead of flashing a loader.
    ///
    /// Returns the loaded guild, or `None` on any failure (not-found sets
    /// the typed error field; everything else surfaces as a notification).
    pub async fn load(&self, target: GuildRef, options: LoadOptions) -> Option<Guild> {
        let seq = self.next_seq();
        debug!("Loading guild {:?} (seq {})", target, seq);

        {
            let mut state = self.state.write();
            let same_target = match (&target, &state.guild) {
                (GuildRef::Id(id), Some(current)) => current.id == *id,
                (GuildRef::Slug(slug), Some(current)) => {
                    current.slug.as_deref() == Some(slug.as_str())
                }
                (_, None) => false,
            };
            if !same_target || options.force_loading {
                state.loading = true;
            }
            state.error = None;
        }

        let fetched = match &target {
            GuildRef::Id(id) => self.transport.get_guild(*id, options.with_icon).await,
            GuildRef::Slug(slug) => {
                self.transport
                    .get_guild_by_slug(slug, options.with_icon)
                    .await
            }
        };

        if self.is_stale(seq) {
            debug!("Discarding stale load (seq {})", seq);
            return None;
        }

        let guild = match fetched {
            Ok(Some(guild)) => guild,
            Ok(None) => {
                warn!("Guild {:?} not found", target);
                let mut state = self.state.write();
                state.loading = false;
                state.guild = None;
                state.members.clear();
                state.applications.clear();
                state.error = Some(StoreError {
                    message: NOT_FOUND_MESSAGE.to_string(),
                    code: 404,
                });
                drop(state);
                self.push_error(NOT_FOUND_MESSAGE);
                return None;
            }
            Err(e) => {
                warn!("Failed to load guild {:?}: {}", target, e);
                self.state.write().loading = false;
                self.push_error("Could not load this guild, please try again later");
                return None;
            }
        };

        let id = guild.id;
        self.state.write().guild = Some(guild.clone());

        match self.transport.list_members(id).await {
            Ok(members) => {
                if self.is_stale(seq) {
                    return None;
                }
                self.state.write().members = members;
            }
            Err(e) => {
                if self.is_stale(seq) {
                    return None;
                }
                warn!("Failed to load members for guild {}: {}", id, e);
                self.push_error("Could not load the member list");
            }
        }

        if options.with_applications {
            match self.transport.list_applications(id).await {
                Ok(applications) => {
                    if self.is_stale(seq) {
                        return None;
                    }
                    self.state.write().applications = applications;
                }
                Err(e) => {
                    if self.is_stale(seq) {
                        return None;
                    }
                    warn!("Failed to load applications for guild {}: {}", id, e);
                    self.push_error("Could not load pending applications");
                }
            }
        } else {
            self.state.write().applications.clear();
        }

        self.state.write().loading = false;
        info!("Loaded guild {} ({})", guild.name, id);
        Some(guild)
    }

    /// Refetch the loaded guild's core fields and member roster by id,
    /// leaving applications untouched. No-op when nothing is loaded.
    pub async fn reload(&self) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        let seq = self.next_seq();
        self.state.write().error = None;

        match self.transport.get_guild(id, false).await {
            Ok(Some(guild)) => {
                if self.is_stale(seq) {
                    return;
                }
                self.state.write().guild = Some(guild);
            }
            Ok(None) => {
                if self.is_stale(seq) {
                    return;
                }
                warn!("Guild {} vanished during reload", id);
                let mut state = self.state.write();
                state.guild = None;
                state.members.clear();
                state.loading = false;
                state.error = Some(StoreError {
                    message: NOT_FOUND_MESSAGE.to_string(),
                    code: 404,
                });
                return;
            }
            Err(e) => {
                if self.is_stale(seq) {
                    return;
                }
                warn!("Failed to reload guild {}: {}", id, e);
                self.state.write().loading = false;
                self.push_error("Could not refresh this guild");
                return;
            }
        }

        match self.transport.list_members(id).await {
            Ok(members) => {
                if self.is_stale(seq) {
                    return;
                }
                self.state.write().members = members;
            }
            Err(e) => {
                warn!("Failed to reload members for guild {}: {}", id, e);
            }
        }

        self.state.write().loading = false;
    }

    /// Back to the empty state: no guild, no members, no applications, no
    /// error, not loading. Also invalidates any in-flight load.
    pub fn unload(&self) {
        self.next_seq();
        *self.state.write() = FocusState::default();
        debug!("Unloaded focused guild");
    }

    /// Turn the loading flag on without touching anything else; navigation
    /// glue uses this right before kicking off a load.
    pub fn force_loading(&self) {
        self.state.write().loading = true;
    }

    /// Optimistic vote on the focused guild: +1 and a fresh 24h cooldown
    /// applied before the remote call. No rollback on failure.
    ///
    /// The collection store is NOT informed; the calling view propagates the
    /// new cooldown fields with `GuildsStore::patch_guild` itself.
    pub async fn vote(&self) {
        let id = {
            let mut state = self.state.write();
            match state.guild.as_mut() {
                Some(guild) => {
                    guild.record_vote(Utc::now());
                    guild.id
                }
                None => return,
            }
        };

        if let Err(e) = self.transport.vote(id).await {
            warn!("Vote for guild {} failed: {}", id, e);
            self.notifications.push(NotificationDraft::error(
                "Your vote could not be submitted",
                "vote_error",
            ));
        }
    }

    pub async fn make_admin(&self, member_id: u64) {
        self.change_role(member_id, MemberRole::Admin).await;
    }

    pub async fn remove_admin(&self, member_id: u64) {
        self.change_role(member_id, MemberRole::Member).await;
    }

    /// Role changes re-derive member state with a full reload instead of
    /// patching locally; owner/admin badges depend on it.
    async fn change_role(&self, member_id: u64, role: MemberRole) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        match self.transport.change_member_role(id, member_id, role).await {
            Ok(()) => self.reload().await,
            Err(e) => {
                warn!("Role change for member {} failed: {}", member_id, e);
                self.notifications.push(NotificationDraft::error(
                    "Could not update the member's role",
                    "member_update",
                ));
            }
        }
    }

    pub async fn remove_member(&self, member_id: u64) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        match self.transport.remove_member(id, member_id).await {
            Ok(()) => self.reload().await,
            Err(e) => {
                warn!("Removing member {} failed: {}", member_id, e);
                self.notifications.push(NotificationDraft::error(
                    "Could not remove the member",
                    "member_update",
                ));
            }
        }
    }

    /// Accept or dismiss a pending application, then reload with
    /// applications so the server's updated pending list comes back.
    pub async fn resolve_application(&self, application_id: u64, accepted: bool) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        let result = if accepted {
            self.transport.accept_application(id, application_id).await
        } else {
            self.transport.dismiss_application(id, application_id).await
        };
        match result {
            Ok(()) => {
                self.load(
                    GuildRef::Id(id),
                    LoadOptions {
                        with_applications: true,
                        with_icon: true,
                        ..Default::default()
                    },
                )
                .await;
            }
            Err(e) => {
                warn!("Resolving application {} failed: {}", application_id, e);
                self.notifications.push(NotificationDraft::error(
                    "Could not resolve the application",
                    "application_update",
                ));
            }
        }
    }

    /// Submit a membership application for the focused guild.
    pub async fn apply(&self, draft: ApplicationDraft) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        if let Err(e) = self.transport.submit_application(id, &draft).await {
            warn!("Application to guild {} failed: {}", id, e);
            self.notifications.push(NotificationDraft::error(
                "Could not submit your application",
                "application_update",
            ));
        }
    }

    /// Routes on the presence of an id: with one, an update (the id never
    /// travels in the body); without one, a create. A missing payload is a
    /// caller error — logged, no remote call, `None` back.
    ///
    /// The store's own state is untouched either way; callers reload or
    /// patch with the returned record.
    pub async fn create_or_update(&self, data: Option<GuildWrite>) -> Option<Guild> {
        let Some(data) = data else {
            error!("Tried to create or update a guild with an empty payload");
            return None;
        };

        let result = match data.id {
            Some(id) => self.transport.update_guild(id, &data).await,
            None => self.transport.create_guild(&data).await,
        };

        match result {
            Ok(guild) => {
                info!("Saved guild {} ({})", guild.name, guild.id);
                Some(guild)
            }
            Err(e) => {
                warn!("Saving guild failed: {}", e);
                self.notifications.push(NotificationDraft::error(
                    "Could not save the guild",
                    "guild_save",
                ));
                None
            }
        }
    }

    /// Delete the focused guild and return to the empty state.
    pub async fn delete(&self) {
        let id = match self.state.read().guild.as_ref() {
            Some(guild) => guild.id,
            None => return,
        };
        match self.transport.delete_guild(id).await {
            Ok(()) => self.unload(),
            Err(e) => {
                warn!("Deleting guild {} failed: {}", id, e);
                self.notifications.push(NotificationDraft::error(
                    "Could not delete the guild",
                    "guild_delete",
                ));
            }
        }
    }

    // Read-only snapshots.

    pub fn guild(&self) -> Option<Guild> {
        self.state.read().guild.clone()
    }

    pub fn members(&self) -> Vec<GuildMember> {
        self.state.read().members.clone()
    }

    pub fn applications(&self) -> Vec<GuildApplication> {
        self.state.read().applications.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<StoreError> {
        self.state.read().error.clone()
    }
}
