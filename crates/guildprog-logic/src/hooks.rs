//! Event hooks and the host-owned dispatch table.
//!
//! Each engine component implements [`PlayerHooks`] and/or [`GuildHooks`]
//! and is registered into a [`HookTable`] the host builds at startup. The
//! host calls the table's dispatch methods when the matching gameplay event
//! happens; the table forwards to every registered component in order.
//!
//! All trait methods default to no-ops, so a component only overrides the
//! events it reacts to.
//!
//! ```
//! use guildprog_logic::hooks::HookTable;
//! use guildprog_logic::memory::MemoryWorld;
//! use guildprog_logic::perks::PerkRegistry;
//! use guildprog_logic::policy::ProgressionPolicy;
//!
//! let hooks = HookTable::with_progression(&ProgressionPolicy::default(), &PerkRegistry::standard());
//! let mut world = MemoryWorld::new();
//! let guild = world.create_guild("Lorekeepers");
//! let player = world.create_player("Ilse");
//! world.set_player_guild(player, Some(guild));
//!
//! hooks.arena_won(&mut world, player);
//! assert_eq!(world.progress(guild).experience, 5);
//! ```

use crate::announce::GuildAnnouncer;
use crate::binder::MembershipPerkBinder;
use crate::perks::PerkRegistry;
use crate::policy::ProgressionPolicy;
use crate::rewards::{GuildEvent, GuildRewards};
use crate::world::{GuildId, GuildWorld, PlayerId};
use serde::{Deserialize, Serialize};

/// Where a character's own experience came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceSource {
    Kill,
    Quest,
    Exploration,
    Other,
}

/// Why a member left a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    Left,
    Kicked,
    Disbanded,
}

/// Per-player events.
pub trait PlayerHooks {
    fn name(&self) -> &'static str;

    /// Scale a character's own experience award. Returns the new amount.
    fn on_personal_experience_gain(
        &self,
        _world: &dyn GuildWorld,
        _player: PlayerId,
        amount: u32,
        _source: ExperienceSource,
    ) -> u32 {
        amount
    }

    fn on_login(&self, _world: &mut dyn GuildWorld, _player: PlayerId) {}

    fn on_logout(&self, _world: &mut dyn GuildWorld, _player: PlayerId) {}
}

/// Per-guild events. Receives the table so a reaction can raise further
/// events (a reward feeding the ledger fires level-up hooks).
pub trait GuildHooks {
    fn name(&self) -> &'static str;

    fn on_member_added(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
    ) {
    }

    fn on_member_removed(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
        _reason: RemovalReason,
    ) {
    }

    fn on_level_up(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _contributor: Option<PlayerId>,
        _new_level: u32,
    ) {
    }

    fn on_level_down(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _new_level: u32,
    ) {
    }

    fn on_experience_gained(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _contributor: Option<PlayerId>,
        _amount: u32,
    ) {
    }

    fn on_arena_won(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
    ) {
    }

    fn on_battleground_won(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
    ) {
    }

    fn on_group_activity_completed(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
    ) {
    }

    /// Generic flat award from any other game system.
    fn on_award(
        &self,
        _world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        _guild: GuildId,
        _player: PlayerId,
        _amount: u32,
    ) {
    }
}

/// Registered hook components, in dispatch order.
#[derive(Default)]
pub struct HookTable {
    player: Vec<Box<dyn PlayerHooks>>,
    guild: Vec<Box<dyn GuildHooks>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the full progression engine installed: perk binder,
    /// event rewards and guild notices.
    pub fn with_progression(policy: &ProgressionPolicy, registry: &PerkRegistry) -> Self {
        let binder = MembershipPerkBinder::new(registry.clone());
        let rewards = GuildRewards::new(policy.clone());

        let mut table = Self::new();
        table.register_player(Box::new(binder.clone()));
        table.register_player(Box::new(rewards.clone()));
        table.register_guild(Box::new(binder));
        table.register_guild(Box::new(rewards));
        table.register_guild(Box::new(GuildAnnouncer));
        table
    }

    pub fn register_player(&mut self, hooks: Box<dyn PlayerHooks>) {
        log::debug!("Registered player hooks: {}", hooks.name());
        self.player.push(hooks);
    }

    pub fn register_guild(&mut self, hooks: Box<dyn GuildHooks>) {
        log::debug!("Registered guild hooks: {}", hooks.name());
        self.guild.push(hooks);
    }

    /// Names of registered components as `(player, guild)`.
    pub fn registered(&self) -> (Vec<&'static str>, Vec<&'static str>) {
        (
            self.player.iter().map(|h| h.name()).collect(),
            self.guild.iter().map(|h| h.name()).collect(),
        )
    }

    // ── Player dispatch ──

    /// Run a personal experience award through every modifier.
    pub fn personal_experience_gain(
        &self,
        world: &dyn GuildWorld,
        player: PlayerId,
        amount: u32,
        source: ExperienceSource,
    ) -> u32 {
        self.player.iter().fold(amount, |amt, h| {
            h.on_personal_experience_gain(world, player, amt, source)
        })
    }

    pub fn player_login(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        for h in &self.player {
            h.on_login(world, player);
        }
    }

    pub fn player_logout(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        for h in &self.player {
            h.on_logout(world, player);
        }
    }

    // ── Guild dispatch ──

    pub fn member_added(&self, world: &mut dyn GuildWorld, guild: GuildId, player: PlayerId) {
        for h in &self.guild {
            h.on_member_added(world, self, guild, player);
        }
    }

    pub fn member_removed(
        &self,
        world: &mut dyn GuildWorld,
        guild: GuildId,
        player: PlayerId,
        reason: RemovalReason,
    ) {
        for h in &self.guild {
            h.on_member_removed(world, self, guild, player, reason);
        }
    }

    pub fn guild_level_up(
        &self,
        world: &mut dyn GuildWorld,
        guild: GuildId,
        contributor: Option<PlayerId>,
        new_level: u32,
    ) {
        for h in &self.guild {
            h.on_level_up(world, self, guild, contributor, new_level);
        }
    }

    pub fn guild_level_down(&self, world: &mut dyn GuildWorld, guild: GuildId, new_level: u32) {
        for h in &self.guild {
            h.on_level_down(world, self, guild, new_level);
        }
    }

    pub fn guild_experience_gained(
        &self,
        world: &mut dyn GuildWorld,
        guild: GuildId,
        contributor: Option<PlayerId>,
        amount: u32,
    ) {
        for h in &self.guild {
            h.on_experience_gained(world, self, guild, contributor, amount);
        }
    }

    /// Arena win by `player`. No-op for guildless players.
    pub fn arena_won(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        self.guild_event(world, player, GuildEvent::ArenaWon);
    }

    /// Battleground win by `player`. No-op for guildless players.
    pub fn battleground_won(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        self.guild_event(world, player, GuildEvent::BattlegroundWon);
    }

    /// Group-finder completion by `player`. No-op for guildless players.
    pub fn group_activity_completed(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        self.guild_event(world, player, GuildEvent::GroupActivityCompleted);
    }

    /// Route a gameplay event to the player's guild.
    pub fn guild_event(&self, world: &mut dyn GuildWorld, player: PlayerId, event: GuildEvent) {
        let Some(guild) = world.player_guild(player) else {
            return;
        };
        for h in &self.guild {
            match event {
                GuildEvent::ArenaWon => h.on_arena_won(world, self, guild, player),
                GuildEvent::BattlegroundWon => h.on_battleground_won(world, self, guild, player),
                GuildEvent::GroupActivityCompleted => {
                    h.on_group_activity_completed(world, self, guild, player)
                }
                GuildEvent::Award(amount) => h.on_award(world, self, guild, player, amount),
            }
        }
    }
}
