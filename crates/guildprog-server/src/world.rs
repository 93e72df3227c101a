//! `GuildWorld` over SpacetimeDB tables.

use crate::tables::*;
use guildprog_logic::ledger::GuildProgress;
use guildprog_logic::perks::{PerkId, PerkSet};
use guildprog_logic::world::{GuildId, GuildWorld, PlayerId, PlayerState};
use spacetimedb::{ReducerContext, Table};

pub struct DbWorld<'a> {
    ctx: &'a ReducerContext,
}

impl<'a> DbWorld<'a> {
    pub fn new(ctx: &'a ReducerContext) -> Self {
        Self { ctx }
    }

    fn record_service(&self, player: PlayerId, service: u8) {
        self.ctx.db.service_use().insert(ServiceUse {
            id: 0,
            player_id: player.0,
            service,
            used_at: self.ctx.timestamp,
        });
    }
}

impl GuildWorld for DbWorld<'_> {
    fn guild_progress(&self, guild: GuildId) -> Option<GuildProgress> {
        self.ctx
            .db
            .guild()
            .id()
            .find(guild.0)
            .map(|g| GuildProgress {
                level: g.level,
                experience: g.experience,
            })
    }

    fn set_guild_progress(&mut self, guild: GuildId, progress: GuildProgress) {
        if let Some(mut g) = self.ctx.db.guild().id().find(guild.0) {
            g.level = progress.level;
            g.experience = progress.experience;
            self.ctx.db.guild().id().update(g);
        }
    }

    fn guild_name(&self, guild: GuildId) -> Option<String> {
        self.ctx.db.guild().id().find(guild.0).map(|g| g.name)
    }

    fn find_guild_by_name(&self, name: &str) -> Option<GuildId> {
        self.ctx
            .db
            .guild()
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| GuildId(g.id))
    }

    fn online_members(&self, guild: GuildId) -> Vec<PlayerId> {
        self.ctx
            .db
            .guild_member()
            .guild_id()
            .filter(guild.0)
            .filter(|m| {
                self.ctx
                    .db
                    .player()
                    .id()
                    .find(m.player_id)
                    .is_some_and(|p| p.online)
            })
            .map(|m| PlayerId(m.player_id))
            .collect()
    }

    fn broadcast(&mut self, guild: GuildId, message: &str) {
        self.ctx.db.guild_notice().insert(GuildNotice {
            id: 0,
            guild_id: guild.0,
            message: message.to_string(),
            sent_at: self.ctx.timestamp,
        });
    }

    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.ctx.db.player().id().find(player.0).map(|p| p.name)
    }

    fn player_guild(&self, player: PlayerId) -> Option<GuildId> {
        self.ctx
            .db
            .guild_member()
            .player_id()
            .find(player.0)
            .map(|m| GuildId(m.guild_id))
    }

    fn player_state(&self, player: PlayerId) -> PlayerState {
        self.ctx
            .db
            .player()
            .id()
            .find(player.0)
            .map(|p| PlayerState {
                online: p.online,
                in_combat: p.in_combat,
                in_flight: p.in_flight,
            })
            .unwrap_or_default()
    }

    fn active_perks(&self, player: PlayerId) -> PerkSet {
        self.ctx
            .db
            .guild_perk()
            .player_id()
            .filter(player.0)
            .map(|p| PerkId(p.perk_id))
            .collect()
    }

    fn grant_perk(&mut self, player: PlayerId, perk: PerkId) {
        let already = self
            .ctx
            .db
            .guild_perk()
            .player_id()
            .filter(player.0)
            .any(|p| p.perk_id == perk.0);
        if already {
            return;
        }
        self.ctx.db.guild_perk().insert(GuildPerk {
            id: 0,
            player_id: player.0,
            perk_id: perk.0,
        });
    }

    fn revoke_perk(&mut self, player: PlayerId, perk: PerkId) {
        let rows: Vec<u64> = self
            .ctx
            .db
            .guild_perk()
            .player_id()
            .filter(player.0)
            .filter(|p| p.perk_id == perk.0)
            .map(|p| p.id)
            .collect();
        for id in rows {
            self.ctx.db.guild_perk().id().delete(id);
        }
    }

    fn repair_all(&mut self, player: PlayerId) {
        self.record_service(player, services::REPAIR);
    }

    fn show_bank(&mut self, player: PlayerId) {
        self.record_service(player, services::BANK);
    }
}
