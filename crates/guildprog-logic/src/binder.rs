//! Membership perk binder.
//!
//! Keeps each member's guild-sourced effects equal to what the registry
//! grants for their guild's current level: the full level set while online
//! and guilded, nothing otherwise. Every transition (join, leave, login,
//! logout, level change) recomputes the wanted set and applies only the
//! difference, so repeating a transition never stacks or double-revokes.

use crate::hooks::{GuildHooks, HookTable, PlayerHooks, RemovalReason};
use crate::perks::{PerkId, PerkRegistry, PerkSet};
use crate::world::{GuildId, GuildWorld, PlayerId};

/// Perks granted and revoked by one sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerkDelta {
    pub granted: Vec<PerkId>,
    pub revoked: Vec<PerkId>,
}

impl PerkDelta {
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty() && self.revoked.is_empty()
    }
}

/// Difference between what a member has and what they should have.
pub fn perk_delta(active: &PerkSet, wanted: &PerkSet) -> PerkDelta {
    PerkDelta {
        granted: wanted.difference(active).copied().collect(),
        revoked: active.difference(wanted).copied().collect(),
    }
}

#[derive(Debug, Clone)]
pub struct MembershipPerkBinder {
    registry: PerkRegistry,
}

impl MembershipPerkBinder {
    pub fn new(registry: PerkRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PerkRegistry {
        &self.registry
    }

    /// Bring `player` to exactly the perks of `guild_level`, or to none.
    pub fn sync(
        &self,
        world: &mut dyn GuildWorld,
        player: PlayerId,
        guild_level: Option<u32>,
    ) -> PerkDelta {
        let wanted = guild_level
            .map(|level| self.registry.effects_for(level))
            .unwrap_or_default();
        let delta = perk_delta(&world.active_perks(player), &wanted);
        for &perk in &delta.revoked {
            world.revoke_perk(player, perk);
        }
        for &perk in &delta.granted {
            world.grant_perk(player, perk);
        }
        if !delta.is_empty() {
            log::debug!(
                "Player {} perks: +{:?} -{:?}",
                player,
                delta.granted,
                delta.revoked
            );
        }
        delta
    }

    /// Sync an online member to their guild's current level.
    pub fn sync_member(&self, world: &mut dyn GuildWorld, player: PlayerId) -> PerkDelta {
        let level = if world.player_state(player).online {
            world
                .player_guild(player)
                .and_then(|g| world.guild_progress(g))
                .map(|p| p.level)
        } else {
            None
        };
        self.sync(world, player, level)
    }

    /// Strip every guild perk from `player`.
    pub fn clear(&self, world: &mut dyn GuildWorld, player: PlayerId) -> PerkDelta {
        self.sync(world, player, None)
    }

    /// Resync every online member of `guild`.
    pub fn refresh_guild(&self, world: &mut dyn GuildWorld, guild: GuildId) {
        let Some(level) = world.guild_progress(guild).map(|p| p.level) else {
            return;
        };
        for player in world.online_members(guild) {
            self.sync(world, player, Some(level));
        }
    }
}

impl PlayerHooks for MembershipPerkBinder {
    fn name(&self) -> &'static str {
        "membership_perk_binder"
    }

    fn on_login(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        self.sync_member(world, player);
    }

    fn on_logout(&self, world: &mut dyn GuildWorld, player: PlayerId) {
        self.clear(world, player);
    }
}

impl GuildHooks for MembershipPerkBinder {
    fn name(&self) -> &'static str {
        "membership_perk_binder"
    }

    fn on_member_added(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
    ) {
        let level = if world.player_state(player).online {
            world.guild_progress(guild).map(|p| p.level)
        } else {
            None
        };
        self.sync(world, player, level);
    }

    fn on_member_removed(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        player: PlayerId,
        reason: RemovalReason,
    ) {
        log::debug!(
            "Player {} removed from guild {} ({:?})",
            player,
            guild,
            reason
        );
        self.clear(world, player);
    }

    fn on_level_up(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        _contributor: Option<PlayerId>,
        _new_level: u32,
    ) {
        self.refresh_guild(world, guild);
    }

    fn on_level_down(
        &self,
        world: &mut dyn GuildWorld,
        _hooks: &HookTable,
        guild: GuildId,
        _new_level: u32,
    ) {
        self.refresh_guild(world, guild);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::GuildProgress;
    use crate::memory::MemoryWorld;
    use crate::policy::ProgressionPolicy;

    fn setup(level: u32) -> (MemoryWorld, HookTable, MembershipPerkBinder, GuildId, PlayerId) {
        let registry = PerkRegistry::standard();
        let hooks = HookTable::with_progression(&ProgressionPolicy::default(), &registry);
        let mut world = MemoryWorld::new();
        let guild = world.create_guild("Wardens");
        world.set_guild_progress(
            guild,
            GuildProgress {
                level,
                experience: 0,
            },
        );
        let player = world.create_player("Tam");
        world.set_online(player, true);
        world.set_player_guild(player, Some(guild));
        (world, hooks, MembershipPerkBinder::new(registry), guild, player)
    }

    #[test]
    fn delta_only_touches_differences() {
        let active = PerkSet::from([PerkId(1), PerkId(2)]);
        let wanted = PerkSet::from([PerkId(2), PerkId(3)]);
        let d = perk_delta(&active, &wanted);
        assert_eq!(d.granted, vec![PerkId(3)]);
        assert_eq!(d.revoked, vec![PerkId(1)]);
        assert!(perk_delta(&wanted, &wanted).is_empty());
    }

    #[test]
    fn join_grants_level_set() {
        let (mut world, hooks, binder, guild, player) = setup(5);
        binder.on_member_added(&mut world, &hooks, guild, player);
        assert_eq!(world.perks_of(player), binder.registry().effects_for(5));
    }

    #[test]
    fn join_while_offline_grants_nothing() {
        let (mut world, hooks, binder, guild, player) = setup(5);
        world.set_online(player, false);
        binder.on_member_added(&mut world, &hooks, guild, player);
        assert!(world.perks_of(player).is_empty());
    }

    #[test]
    fn login_twice_does_not_stack() {
        let (mut world, _hooks, binder, _guild, player) = setup(4);
        binder.on_login(&mut world, player);
        let grants_after_first = world.player(player).map(|p| p.perk_grants);
        let once = world.perks_of(player);
        binder.on_login(&mut world, player);
        assert_eq!(world.perks_of(player), once);
        assert_eq!(world.player(player).map(|p| p.perk_grants), grants_after_first);
    }

    #[test]
    fn logout_without_perks_is_noop() {
        let (mut world, _hooks, binder, _guild, player) = setup(4);
        binder.on_logout(&mut world, player);
        binder.on_logout(&mut world, player);
        assert!(world.perks_of(player).is_empty());
        assert_eq!(world.player(player).map(|p| p.perk_revokes), Some(0));
    }

    #[test]
    fn leave_revokes_for_every_reason() {
        for reason in [
            RemovalReason::Left,
            RemovalReason::Kicked,
            RemovalReason::Disbanded,
        ] {
            let (mut world, hooks, binder, guild, player) = setup(10);
            binder.on_login(&mut world, player);
            assert!(!world.perks_of(player).is_empty());
            world.set_player_guild(player, None);
            binder.on_member_removed(&mut world, &hooks, guild, player, reason);
            assert!(world.perks_of(player).is_empty(), "{:?}", reason);
        }
    }

    #[test]
    fn level_down_revokes_higher_perks() {
        let (mut world, hooks, binder, guild, player) = setup(10);
        binder.on_login(&mut world, player);
        world.set_guild_progress(
            guild,
            GuildProgress {
                level: 2,
                experience: 0,
            },
        );
        binder.on_level_down(&mut world, &hooks, guild, 2);
        assert_eq!(world.perks_of(player), binder.registry().effects_for(2));
    }

    #[test]
    fn refresh_skips_offline_members() {
        let (mut world, _hooks, binder, guild, player) = setup(6);
        let away = world.create_player("Away");
        world.set_player_guild(away, Some(guild));
        binder.refresh_guild(&mut world, guild);
        assert_eq!(world.perks_of(player), binder.registry().effects_for(6));
        assert!(world.perks_of(away).is_empty());
    }
}
