//! Host collaborator interface.
//!
//! The progression engine does not own guilds or players. The host's entity
//! registry does, and exposes the handful of reads and writes the engine
//! needs through [`GuildWorld`]. All calls happen synchronously inside the
//! host's current event, so implementations need no locking.

use crate::ledger::GuildProgress;
use crate::perks::{PerkId, PerkSet};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the player flags the engine cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub online: bool,
    pub in_combat: bool,
    /// On a taxi / flight path.
    pub in_flight: bool,
}

/// Everything the engine reads from or writes to the host.
pub trait GuildWorld {
    // ── Guilds ──

    fn guild_progress(&self, guild: GuildId) -> Option<GuildProgress>;
    /// Only the ledger calls this.
    fn set_guild_progress(&mut self, guild: GuildId, progress: GuildProgress);
    fn guild_name(&self, guild: GuildId) -> Option<String>;
    fn find_guild_by_name(&self, name: &str) -> Option<GuildId>;
    fn online_members(&self, guild: GuildId) -> Vec<PlayerId>;
    /// Best-effort notice to every connected member.
    fn broadcast(&mut self, guild: GuildId, message: &str);

    // ── Players ──

    fn player_name(&self, player: PlayerId) -> Option<String>;
    fn player_guild(&self, player: PlayerId) -> Option<GuildId>;
    fn player_state(&self, player: PlayerId) -> PlayerState;
    /// Guild-sourced effects currently on the player.
    fn active_perks(&self, player: PlayerId) -> PerkSet;
    fn grant_perk(&mut self, player: PlayerId, perk: PerkId);
    fn revoke_perk(&mut self, player: PlayerId, perk: PerkId);

    // ── Services ──

    fn repair_all(&mut self, player: PlayerId);
    fn show_bank(&mut self, player: PlayerId);
}
