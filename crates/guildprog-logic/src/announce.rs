//! Guild-wide notices for level-ups and experience gains.

use crate::hooks::{GuildHooks, HookTable};
use crate::world::{GuildId, GuildWorld, PlayerId};

pub fn level_reached_message(level: u32, contributor: Option<&str>) -> String {
    match contributor {
        Some(name) => format!(
            "Congratulations! The guild has reached level {}. The last experience was gained by {}.",
            level, name
        ),
        None => format!("Congratulations! The guild has reached level {}.", level),
    }
}

pub fn experience_received_message(amount: u32, contributor: Option<&str>) -> String {
    match contributor {
        Some(name) => format!(
            "The guild has received {} experience points, gained by {}.",
            amount, name
        ),
        None => format!("The guild has received {} experience points.", amount),
    }
}

/// Broadcasts progression notices to the guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuildAnnouncer;

impl GuildHooks for GuildAnnouncer {
    fn name(&self) -> &'static str {
        "guild_announcer"
    }

    fn on_level_up(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        contributor: Option<PlayerId>,
        new_level: u32,
    ) {
        let name = contributor.and_then(|p| world.player_name(p));
        world.broadcast(guild, &level_reached_message(new_level, name.as_deref()));
    }

    fn on_experience_gained(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        contributor: Option<PlayerId>,
        amount: u32,
    ) {
        let name = contributor.and_then(|p| world.player_name(p));
        world.broadcast(guild, &experience_received_message(amount, name.as_deref()));
    }
}
