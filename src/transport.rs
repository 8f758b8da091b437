//! The remote boundary. Stores talk to the directory server exclusively
//! through this trait; the wire format behind it is not this crate's concern.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ApplicationDraft, Guild, GuildApplication, GuildFilters, GuildMember, GuildWrite, MemberRole,
};

#[async_trait]
pub trait Transport: Send + Sync {
    /// One page of the directory, filtered. Ordered by ranking; no total count.
    async fn list_guilds(
        &self,
        page: u32,
        per_page: u32,
        filters: &GuildFilters,
    ) -> Result<Vec<Guild>>;

    /// `None` when the id does not exist.
    async fn get_guild(&self, id: u64, with_icon: bool) -> Result<Option<Guild>>;

    /// `None` when the slug does not exist.
    async fn get_guild_by_slug(&self, slug: &str, with_icon: bool) -> Result<Option<Guild>>;

    async fn list_members(&self, guild_id: u64) -> Result<Vec<GuildMember>>;

    async fn list_applications(&self, guild_id: u64) -> Result<Vec<GuildApplication>>;

    /// Idempotent per cooldown window server-side; the client does not
    /// enforce that.
    async fn vote(&self, guild_id: u64) -> Result<()>;

    async fn create_guild(&self, data: &GuildWrite) -> Result<Guild>;

    async fn update_guild(&self, id: u64, data: &GuildWrite) -> Result<Guild>;

    async fn delete_guild(&self, id: u64) -> Result<()>;

    async fn change_member_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role: MemberRole,
    ) -> Result<()>;

    async fn remove_member(&self, guild_id: u64, member_id: u64) -> Result<()>;

    async fn submit_application(&self, guild_id: u64, draft: &ApplicationDraft) -> Result<()>;

    async fn accept_application(&self, guild_id: u64, application_id: u64) -> Result<()>;

    async fn dismiss_application(&self, guild_id: u64, application_id: u64) -> Result<()>;
}
