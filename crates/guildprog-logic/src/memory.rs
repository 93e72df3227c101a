//! In-memory [`GuildWorld`] for tests and the headless harness.
//!
//! Keeps guilds and players in ordered maps and records every side effect
//! (notices, perk grants, repairs, bank windows) so callers can assert on
//! them afterwards.

use crate::ledger::GuildProgress;
use crate::perks::{PerkId, PerkSet};
use crate::world::{GuildId, GuildWorld, PlayerId, PlayerState};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct MemoryGuild {
    pub id: GuildId,
    pub name: String,
    pub progress: GuildProgress,
    /// Every notice broadcast to the guild, oldest first.
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryPlayer {
    pub id: PlayerId,
    pub name: String,
    pub guild: Option<GuildId>,
    pub state: PlayerState,
    pub perks: PerkSet,
    /// Notices delivered while online.
    pub inbox: Vec<String>,
    pub perk_grants: u32,
    pub perk_revokes: u32,
    pub repairs: u32,
    pub bank_opens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    guilds: BTreeMap<GuildId, MemoryGuild>,
    players: BTreeMap<PlayerId, MemoryPlayer>,
    next_guild: u32,
    next_player: u64,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_guild(&mut self, name: &str) -> GuildId {
        self.next_guild += 1;
        let id = GuildId(self.next_guild);
        self.guilds.insert(
            id,
            MemoryGuild {
                id,
                name: name.to_string(),
                progress: GuildProgress::new(),
                notices: Vec::new(),
            },
        );
        id
    }

    /// New offline, guildless player.
    pub fn create_player(&mut self, name: &str) -> PlayerId {
        self.next_player += 1;
        let id = PlayerId(self.next_player);
        self.players.insert(
            id,
            MemoryPlayer {
                id,
                name: name.to_string(),
                guild: None,
                state: PlayerState::default(),
                perks: PerkSet::new(),
                inbox: Vec::new(),
                perk_grants: 0,
                perk_revokes: 0,
                repairs: 0,
                bank_opens: 0,
            },
        );
        id
    }

    /// Remove a guild record. Members keep their dangling affiliation
    /// until the caller clears it.
    pub fn remove_guild(&mut self, guild: GuildId) {
        self.guilds.remove(&guild);
    }

    pub fn guild(&self, guild: GuildId) -> Option<&MemoryGuild> {
        self.guilds.get(&guild)
    }

    pub fn player(&self, player: PlayerId) -> Option<&MemoryPlayer> {
        self.players.get(&player)
    }

    /// Current progress, or the starting progress for an unknown guild.
    pub fn progress(&self, guild: GuildId) -> GuildProgress {
        self.guilds
            .get(&guild)
            .map(|g| g.progress)
            .unwrap_or_default()
    }

    pub fn perks_of(&self, player: PlayerId) -> PerkSet {
        self.players
            .get(&player)
            .map(|p| p.perks.clone())
            .unwrap_or_default()
    }

    pub fn members(&self, guild: GuildId) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.guild == Some(guild))
            .map(|p| p.id)
            .collect()
    }

    /// Raw affiliation write. Hooks are the caller's job.
    pub fn set_player_guild(&mut self, player: PlayerId, guild: Option<GuildId>) {
        if let Some(p) = self.players.get_mut(&player) {
            p.guild = guild;
        }
    }

    pub fn set_online(&mut self, player: PlayerId, online: bool) {
        if let Some(p) = self.players.get_mut(&player) {
            p.state.online = online;
        }
    }

    pub fn set_in_combat(&mut self, player: PlayerId, in_combat: bool) {
        if let Some(p) = self.players.get_mut(&player) {
            p.state.in_combat = in_combat;
        }
    }

    pub fn set_in_flight(&mut self, player: PlayerId, in_flight: bool) {
        if let Some(p) = self.players.get_mut(&player) {
            p.state.in_flight = in_flight;
        }
    }
}

impl GuildWorld for MemoryWorld {
    fn guild_progress(&self, guild: GuildId) -> Option<GuildProgress> {
        self.guilds.get(&guild).map(|g| g.progress)
    }

    fn set_guild_progress(&mut self, guild: GuildId, progress: GuildProgress) {
        if let Some(g) = self.guilds.get_mut(&guild) {
            g.progress = progress;
        }
    }

    fn guild_name(&self, guild: GuildId) -> Option<String> {
        self.guilds.get(&guild).map(|g| g.name.clone())
    }

    fn find_guild_by_name(&self, name: &str) -> Option<GuildId> {
        self.guilds
            .values()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| g.id)
    }

    fn online_members(&self, guild: GuildId) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.guild == Some(guild) && p.state.online)
            .map(|p| p.id)
            .collect()
    }

    fn broadcast(&mut self, guild: GuildId, message: &str) {
        let Some(g) = self.guilds.get_mut(&guild) else {
            return;
        };
        g.notices.push(message.to_string());
        for p in self.players.values_mut() {
            if p.guild == Some(guild) && p.state.online {
                p.inbox.push(message.to_string());
            }
        }
    }

    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.players.get(&player).map(|p| p.name.clone())
    }

    fn player_guild(&self, player: PlayerId) -> Option<GuildId> {
        self.players.get(&player).and_then(|p| p.guild)
    }

    fn player_state(&self, player: PlayerId) -> PlayerState {
        self.players
            .get(&player)
            .map(|p| p.state)
            .unwrap_or_default()
    }

    fn active_perks(&self, player: PlayerId) -> PerkSet {
        self.perks_of(player)
    }

    fn grant_perk(&mut self, player: PlayerId, perk: PerkId) {
        if let Some(p) = self.players.get_mut(&player) {
            p.perks.insert(perk);
            p.perk_grants += 1;
        }
    }

    fn revoke_perk(&mut self, player: PlayerId, perk: PerkId) {
        if let Some(p) = self.players.get_mut(&player) {
            p.perks.remove(&perk);
            p.perk_revokes += 1;
        }
    }

    fn repair_all(&mut self, player: PlayerId) {
        if let Some(p) = self.players.get_mut(&player) {
            p.repairs += 1;
        }
    }

    fn show_bank(&mut self, player: PlayerId) {
        if let Some(p) = self.players.get_mut(&player) {
            p.bank_opens += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_only_online_members() {
        let mut w = MemoryWorld::new();
        let g = w.create_guild("Night Watch");
        let on = w.create_player("Ana");
        let off = w.create_player("Bo");
        let outsider = w.create_player("Cy");
        w.set_player_guild(on, Some(g));
        w.set_player_guild(off, Some(g));
        w.set_online(on, true);
        w.set_online(outsider, true);

        w.broadcast(g, "hello");

        assert_eq!(w.guild(g).map(|g| g.notices.len()), Some(1));
        assert_eq!(w.player(on).map(|p| p.inbox.len()), Some(1));
        assert_eq!(w.player(off).map(|p| p.inbox.len()), Some(0));
        assert_eq!(w.player(outsider).map(|p| p.inbox.len()), Some(0));
        assert_eq!(w.online_members(g), vec![on]);
    }

    #[test]
    fn name_lookup_ignores_case() {
        let mut w = MemoryWorld::new();
        let g = w.create_guild("Night Watch");
        assert_eq!(w.find_guild_by_name("night watch"), Some(g));
        assert_eq!(w.find_guild_by_name("Day Watch"), None);
    }

    #[test]
    fn new_guild_starts_at_level_one() {
        let mut w = MemoryWorld::new();
        let g = w.create_guild("Fresh");
        assert_eq!(w.progress(g), GuildProgress::new());
        assert_eq!(w.progress(g).level, 1);
        assert_eq!(w.progress(g).experience, 0);
    }
}
