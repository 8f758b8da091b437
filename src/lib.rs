//! Client-side state layer for the guild directory.
//!
//! Three entangled concerns live here: time-gated vote eligibility rendered
//! as a per-second countdown, paginated/filtered accumulation of the guild
//! list, and optimistic local mutation ahead of server confirmation. The
//! list store and the focused-guild store deliberately hold independent
//! copies of the same guild; after a mutation on one side the orchestrating
//! caller propagates the changed fields to the other with an explicit patch.
//!
//! Rendering, routing and input handling are out of scope — consumers drive
//! the stores and read their snapshots. All remote traffic goes through the
//! [`transport::Transport`] trait.
//!
//! ```no_run
//! use std::sync::Arc;
//! use guildboard::notifications::create_shared_notifications;
//! use guildboard::stores::{create_shared_guild_store, create_shared_guilds_store};
//! # fn transport() -> Arc<dyn guildboard::transport::Transport> { unimplemented!() }
//!
//! # async fn run() {
//! let notifications = create_shared_notifications();
//! let guilds = create_shared_guilds_store(transport(), notifications.clone());
//! let guild = create_shared_guild_store(transport(), notifications.clone());
//!
//! guilds.fetch_page(1, false).await;
//!
//! // A detail-view vote; the list copy is patched explicitly afterwards.
//! guild.vote().await;
//! if let Some(updated) = guild.guild() {
//!     guilds.patch_guild(
//!         updated.id,
//!         &guildboard::models::GuildPatch {
//!             votes: Some(updated.votes),
//!             cooldown: Some((updated.can_vote, updated.next_vote_at)),
//!             ..Default::default()
//!         },
//!     );
//! }
//! # }
//! ```

pub mod countdown;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod stores;
pub mod transport;

pub use countdown::{Countdown, Ticker};
pub use error::{ClientError, Result};
pub use models::{
    ApplicationDraft, Guild, GuildApplication, GuildFilters, GuildMember, GuildPatch, GuildWrite,
    MemberRole,
};
pub use notifications::{
    create_shared_notifications, Notification, NotificationChannel, NotificationDraft,
    NotificationKind, SharedNotifications,
};
pub use stores::{
    create_shared_guild_store, create_shared_guilds_store, GuildRef, GuildStore, GuildsStore,
    LoadOptions, SharedGuildStore, SharedGuildsStore, StoreError,
};
pub use transport::Transport;
