//! SpacetimeDB table definitions for guild progression.
//!
//! Guild level/experience and guild-sourced perks are stored here so the
//! progression engine's host state survives restarts and syncs to clients.

use spacetimedb::{table, Identity, Timestamp};

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// Server configuration singleton (id always 0)
#[table(name = server_config, public)]
#[derive(Clone)]
pub struct ServerConfig {
    #[primary_key]
    pub id: u32,
    /// Identity that published the module; its characters are administrators.
    pub owner: Identity,
    pub experience_per_level: u32,
    pub max_level: u32,         // 0 = uncapped
}

// ============================================================================
// PLAYERS
// ============================================================================

/// Player character, one per client identity
#[table(name = player, public)]
#[derive(Clone)]
pub struct Player {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub owner_identity: Identity,
    pub name: String,
    pub online: bool,
    pub in_combat: bool,
    pub in_flight: bool,
    pub privilege: u8,              // privilege_levels::*
    pub selected_player: Option<u64>,
    pub experience: u64,            // character's own experience
    pub created_at: Timestamp,
}

// ============================================================================
// GUILDS
// ============================================================================

/// Guild with its progression state
#[table(name = guild, public)]
#[derive(Clone)]
pub struct Guild {
    #[primary_key]
    #[auto_inc]
    pub id: u32,
    pub name: String,
    pub leader_id: u64,
    pub level: u32,
    pub experience: u32,        // toward next level
    pub created_at: Timestamp,
}

/// Guild membership (a player belongs to at most one guild)
#[table(name = guild_member, public)]
pub struct GuildMember {
    #[primary_key]
    pub player_id: u64,
    #[index(btree)]
    pub guild_id: u32,
    pub joined_at: Timestamp,
}

/// One guild-sourced perk active on a player
#[table(name = guild_perk, public)]
pub struct GuildPerk {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    #[index(btree)]
    pub player_id: u64,
    pub perk_id: u32,
}

/// Guild-wide notice (level-ups, experience gains). Pruned after
/// `housekeeping::NOTICE_RETENTION` and on disband.
#[table(name = guild_notice, public)]
pub struct GuildNotice {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    #[index(btree)]
    pub guild_id: u32,
    pub message: String,
    pub sent_at: Timestamp,
}

// ============================================================================
// SERVICES & ADMIN
// ============================================================================

/// Guild service use (repair, bank window) for clients to act on
#[table(name = service_use, public)]
pub struct ServiceUse {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub player_id: u64,
    pub service: u8,            // services::*
    pub used_at: Timestamp,
}

/// Reply to an admin command, addressed to the issuing identity.
/// Clients clear their own with `clear_command_replies`.
#[table(name = command_reply, public)]
pub struct CommandReply {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub identity: Identity,
    pub command: String,
    pub success: bool,
    pub message: String,
    pub issued_at: Timestamp,
}

// ============================================================================
// ENUM CONSTANTS
// ============================================================================

pub mod privilege_levels {
    pub const PLAYER: u8 = 0;
    pub const MODERATOR: u8 = 1;
    pub const GAME_MASTER: u8 = 2;
    pub const ADMINISTRATOR: u8 = 3;
}

pub mod services {
    pub const REPAIR: u8 = 0;
    pub const BANK: u8 = 1;
}

pub mod experience_sources {
    pub const KILL: u8 = 0;
    pub const QUEST: u8 = 1;
    pub const EXPLORATION: u8 = 2;
    pub const OTHER: u8 = 3;
}

pub mod guild_events {
    pub const ARENA_WON: u8 = 0;
    pub const BATTLEGROUND_WON: u8 = 1;
    pub const GROUP_ACTIVITY_COMPLETED: u8 = 2;
}
