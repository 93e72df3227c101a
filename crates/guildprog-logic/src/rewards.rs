//! Event-to-experience policy.
//!
//! Gameplay systems report wins and completions for a player; the player's
//! guild receives a flat experience amount from [`EventRewards`]. Guild
//! membership also multiplies the member's own character experience once
//! the guild reaches the bonus level. That multiplier is a read-only
//! modifier and never touches the ledger.
//!
//! | Event | Guild XP |
//! |-------|----------|
//! | Arena won | 5 |
//! | Battleground won | 1 |
//! | Group-finder activity completed | 1 |
//! | Award(n) | n |

use crate::hooks::{ExperienceSource, GuildHooks, HookTable, PlayerHooks};
use crate::ledger::ExperienceLedger;
use crate::policy::{EventRewards, PersonalXpBonus, ProgressionPolicy};
use crate::world::{GuildId, GuildWorld, PlayerId};
use serde::{Deserialize, Serialize};

/// A gameplay event that feeds guild experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuildEvent {
    ArenaWon,
    BattlegroundWon,
    GroupActivityCompleted,
    /// Flat amount from any other source.
    Award(u32),
}

/// Guild experience granted for `event`.
pub fn experience_for(event: GuildEvent, rewards: &EventRewards) -> u32 {
    match event {
        GuildEvent::ArenaWon => rewards.arena_won,
        GuildEvent::BattlegroundWon => rewards.battleground_won,
        GuildEvent::GroupActivityCompleted => rewards.group_activity_completed,
        GuildEvent::Award(amount) => amount,
    }
}

/// Personal XP multiplier for a member of a guild at `guild_level`.
/// Guildless characters get 1.
pub fn personal_xp_multiplier(guild_level: Option<u32>, bonus: &PersonalXpBonus) -> u32 {
    match guild_level {
        Some(level) if level >= bonus.min_guild_level => bonus.multiplier.max(1),
        _ => 1,
    }
}

/// Scale a personal experience award, saturating on overflow.
pub fn scale_personal_experience(
    amount: u32,
    guild_level: Option<u32>,
    bonus: &PersonalXpBonus,
) -> u32 {
    amount.saturating_mul(personal_xp_multiplier(guild_level, bonus))
}

/// Hook component that turns gameplay events into ledger calls.
#[derive(Debug, Clone)]
pub struct GuildRewards {
    ledger: ExperienceLedger,
}

impl GuildRewards {
    pub fn new(policy: ProgressionPolicy) -> Self {
        Self {
            ledger: ExperienceLedger::new(policy),
        }
    }

    fn reward(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
        event: GuildEvent,
    ) {
        let amount = experience_for(event, &self.ledger.policy().rewards);
        log::debug!(
            "Guild {} rewarded {} exp for {:?} by player {}",
            guild,
            amount,
            event,
            player
        );
        self.ledger
            .add_experience(world, hooks, guild, amount, Some(player));
    }
}

impl PlayerHooks for GuildRewards {
    fn name(&self) -> &'static str {
        "guild_rewards"
    }

    fn on_personal_experience_gain(
        &self,
        world: &dyn GuildWorld,
        player: PlayerId,
        amount: u32,
        _source: ExperienceSource,
    ) -> u32 {
        let level = world
            .player_guild(player)
            .and_then(|g| world.guild_progress(g))
            .map(|p| p.level);
        scale_personal_experience(amount, level, &self.ledger.policy().personal_xp)
    }
}

impl GuildHooks for GuildRewards {
    fn name(&self) -> &'static str {
        "guild_rewards"
    }

    fn on_arena_won(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
    ) {
        self.reward(world, hooks, guild, player, GuildEvent::ArenaWon);
    }

    fn on_battleground_won(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
    ) {
        self.reward(world, hooks, guild, player, GuildEvent::BattlegroundWon);
    }

    fn on_group_activity_completed(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
    ) {
        self.reward(world, hooks, guild, player, GuildEvent::GroupActivityCompleted);
    }

    fn on_award(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
        amount: u32,
    ) {
        self.reward(world, hooks, guild, player, GuildEvent::Award(amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWorld;
    use crate::perks::PerkRegistry;

    fn table() -> HookTable {
        HookTable::with_progression(&ProgressionPolicy::default(), &PerkRegistry::standard())
    }

    #[test]
    fn baseline_event_amounts() {
        let r = EventRewards::default();
        assert_eq!(experience_for(GuildEvent::ArenaWon, &r), 5);
        assert_eq!(experience_for(GuildEvent::BattlegroundWon, &r), 1);
        assert_eq!(experience_for(GuildEvent::GroupActivityCompleted, &r), 1);
        assert_eq!(experience_for(GuildEvent::Award(42), &r), 42);
    }

    #[test]
    fn multiplier_needs_guild_at_bonus_level() {
        let bonus = PersonalXpBonus::default();
        assert_eq!(personal_xp_multiplier(None, &bonus), 1);
        assert_eq!(personal_xp_multiplier(Some(1), &bonus), 2);

        let gated = PersonalXpBonus {
            min_guild_level: 5,
            multiplier: 3,
        };
        assert_eq!(personal_xp_multiplier(Some(4), &gated), 1);
        assert_eq!(personal_xp_multiplier(Some(5), &gated), 3);
        assert_eq!(scale_personal_experience(u32::MAX, Some(5), &gated), u32::MAX);
    }

    #[test]
    fn each_event_feeds_the_ledger() {
        let hooks = table();
        let mut world = MemoryWorld::new();
        let g = world.create_guild("Arena Kings");
        let p = world.create_player("Rex");
        world.set_player_guild(p, Some(g));

        hooks.arena_won(&mut world, p);
        hooks.battleground_won(&mut world, p);
        hooks.group_activity_completed(&mut world, p);
        hooks.guild_event(&mut world, p, GuildEvent::Award(13));

        assert_eq!(world.progress(g).experience, 5 + 1 + 1 + 13);
    }

    #[test]
    fn guildless_battleground_is_silent() {
        let hooks = table();
        let mut world = MemoryWorld::new();
        let g = world.create_guild("Bystanders");
        let p = world.create_player("Nomad");

        hooks.battleground_won(&mut world, p);

        assert_eq!(world.progress(g).experience, 0);
        assert!(world.guild(g).map(|g| g.notices.is_empty()).unwrap_or(false));
    }

    #[test]
    fn personal_gain_doubles_for_members() {
        let hooks = table();
        let mut world = MemoryWorld::new();
        let g = world.create_guild("Scholars");
        let member = world.create_player("Iva");
        let loner = world.create_player("Ole");
        world.set_player_guild(member, Some(g));

        assert_eq!(
            hooks.personal_experience_gain(&world, member, 120, ExperienceSource::Kill),
            240
        );
        assert_eq!(
            hooks.personal_experience_gain(&world, loner, 120, ExperienceSource::Kill),
            120
        );
        // the bonus never writes to the guild ledger
        assert_eq!(world.progress(g).experience, 0);
    }
}
