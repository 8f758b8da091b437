pub mod guild;
pub mod guilds;

pub use guild::{
    create_shared_guild_store, GuildRef, GuildStore, LoadOptions, SharedGuildStore, StoreError,
};
pub use guilds::{create_shared_guilds_store, GuildsStore, SharedGuildsStore, PAGE_SIZE};
