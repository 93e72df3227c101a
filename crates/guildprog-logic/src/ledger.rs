//! Guild experience ledger: level, experience and level-up cascades.
//!
//! The pure half of this module works on a plain [`GuildProgress`] value.
//! [`ExperienceLedger`] wraps it with the host round-trip: read the guild's
//! progress, apply the change, write the final state back, then fire the
//! level hooks. The final state is written before any hook runs, so no
//! observer ever sees an intermediate level of a cascade.
//!
//! ```
//! use guildprog_logic::ledger::{apply_experience, GuildProgress};
//! use guildprog_logic::policy::ProgressionPolicy;
//!
//! let policy = ProgressionPolicy::default();
//! let mut progress = GuildProgress::new();
//! let gain = apply_experience(&mut progress, 1600, &policy);
//! assert_eq!(progress.level, 2);
//! assert_eq!(progress.experience, 100);
//! assert!(gain.leveled_up());
//! ```

use crate::hooks::HookTable;
use crate::policy::{ProgressionPolicy, STARTING_LEVEL};
use crate::world::{GuildId, GuildWorld, PlayerId};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A guild's position on the level track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildProgress {
    pub level: u32,
    /// Experience banked toward the next level.
    pub experience: u32,
}

impl GuildProgress {
    pub fn new() -> Self {
        Self {
            level: STARTING_LEVEL,
            experience: 0,
        }
    }
}

impl Default for GuildProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of adding experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceGain {
    pub previous_level: u32,
    pub new_level: u32,
    /// Experience left toward the next level after the cascade.
    pub experience: u32,
    /// Part of the requested amount the guild actually kept. Lower than the
    /// request only when a cap or overflow discarded the rest.
    pub absorbed: u32,
}

impl ExperienceGain {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }

    /// Each level crossed, in ascending order. Empty when none were.
    pub fn levels_reached(&self) -> RangeInclusive<u32> {
        (self.previous_level + 1)..=self.new_level
    }
}

/// Result of a direct level adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub previous_level: u32,
    pub new_level: u32,
}

impl LevelChange {
    pub fn changed(&self) -> bool {
        self.new_level != self.previous_level
    }
}

/// Add `amount` experience and cascade level-ups.
///
/// Each full threshold consumed advances one level. The cascade stops at
/// the policy's level cap, if one is set; a capped guild keeps at most
/// `threshold - 1` experience so it never holds a whole unconsumed level.
pub fn apply_experience(
    progress: &mut GuildProgress,
    amount: u32,
    policy: &ProgressionPolicy,
) -> ExperienceGain {
    let previous_level = progress.level;
    let previous_experience = progress.experience;
    let threshold = policy.threshold_for(progress.level);
    let mut experience = progress.experience.saturating_add(amount);

    let crossed = experience / threshold;
    let room = match policy.max_level {
        Some(cap) => cap.saturating_sub(progress.level),
        None => u32::MAX - progress.level,
    };
    let steps = crossed.min(room);

    experience -= steps * threshold;
    progress.level += steps;
    if policy.is_capped(progress.level) {
        experience = experience.min(threshold - 1);
    }
    progress.experience = experience;

    let kept = (steps as u64 * threshold as u64 + experience as u64)
        .saturating_sub(previous_experience as u64);

    ExperienceGain {
        previous_level,
        new_level: progress.level,
        experience,
        absorbed: kept.min(amount as u64) as u32,
    }
}

/// Raise the level by `delta` without touching experience. Clamped to the cap.
pub fn add_levels(
    progress: &mut GuildProgress,
    delta: u32,
    policy: &ProgressionPolicy,
) -> LevelChange {
    let previous_level = progress.level;
    progress.level = policy.clamp_level(progress.level.saturating_add(delta));
    LevelChange {
        previous_level,
        new_level: progress.level,
    }
}

/// Lower the level by `delta`, never below the starting level.
pub fn remove_levels(progress: &mut GuildProgress, delta: u32) -> LevelChange {
    let previous_level = progress.level;
    progress.level = progress.level.saturating_sub(delta).max(STARTING_LEVEL);
    LevelChange {
        previous_level,
        new_level: progress.level,
    }
}

/// Ledger operations against a live host.
#[derive(Debug, Clone, Default)]
pub struct ExperienceLedger {
    policy: ProgressionPolicy,
}

impl ExperienceLedger {
    pub fn new(policy: ProgressionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ProgressionPolicy {
        &self.policy
    }

    pub fn threshold_for(&self, level: u32) -> u32 {
        self.policy.threshold_for(level)
    }

    /// Add experience to a guild. Fires the experience hook for the amount
    /// kept (skipped when nothing was), then one level-up hook per level
    /// crossed. `None` if the guild is unknown.
    pub fn add_experience(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        amount: u32,
        contributor: Option<PlayerId>,
    ) -> Option<ExperienceGain> {
        let mut progress = world.guild_progress(guild)?;
        let gain = apply_experience(&mut progress, amount, &self.policy);
        world.set_guild_progress(guild, progress);

        log::debug!(
            "Guild {} +{} exp -> level {} ({} / {})",
            guild,
            amount,
            gain.new_level,
            gain.experience,
            self.threshold_for(gain.new_level)
        );

        if gain.absorbed > 0 {
            hooks.guild_experience_gained(world, guild, contributor, gain.absorbed);
        }
        for level in gain.levels_reached() {
            log::info!("Guild {} reached level {}", guild, level);
            hooks.guild_level_up(world, guild, contributor, level);
        }
        Some(gain)
    }

    /// Raise a guild's level directly. Fires a single level-up hook for the
    /// net change.
    pub fn add_level(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        delta: u32,
        contributor: Option<PlayerId>,
    ) -> Option<LevelChange> {
        let mut progress = world.guild_progress(guild)?;
        let change = add_levels(&mut progress, delta, &self.policy);
        world.set_guild_progress(guild, progress);

        if change.changed() {
            log::info!(
                "Guild {} level {} -> {}",
                guild,
                change.previous_level,
                change.new_level
            );
            hooks.guild_level_up(world, guild, contributor, change.new_level);
        }
        Some(change)
    }

    /// Lower a guild's level directly. No level-up notice; the level-down
    /// hook lets perk holders resync.
    pub fn remove_level(
        &self,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        guild: GuildId,
        delta: u32,
    ) -> Option<LevelChange> {
        let mut progress = world.guild_progress(guild)?;
        let change = remove_levels(&mut progress, delta);
        world.set_guild_progress(guild, progress);

        if change.changed() {
            log::info!(
                "Guild {} level {} -> {}",
                guild,
                change.previous_level,
                change.new_level
            );
            hooks.guild_level_down(world, guild, change.new_level);
        }
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped() -> ProgressionPolicy {
        ProgressionPolicy {
            max_level: Some(35),
            ..Default::default()
        }
    }

    #[test]
    fn small_gain_stays_in_level() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress::new();
        let gain = apply_experience(&mut p, 5, &policy);
        assert!(!gain.leveled_up());
        assert_eq!(gain.levels_reached().count(), 0);
        assert_eq!(p, GuildProgress { level: 1, experience: 5 });
    }

    #[test]
    fn exact_threshold_levels_once() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress::new();
        apply_experience(&mut p, 1500, &policy);
        assert_eq!(p, GuildProgress { level: 2, experience: 0 });
    }

    #[test]
    fn single_crossing_carries_remainder() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress::new();
        let gain = apply_experience(&mut p, 1600, &policy);
        assert_eq!(p, GuildProgress { level: 2, experience: 100 });
        assert_eq!(gain.levels_reached().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn multi_crossing_cascades_one_level_per_threshold() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress {
            level: 3,
            experience: 1000,
        };
        // 1000 + 4000 = 5000 -> three thresholds, 500 left
        let gain = apply_experience(&mut p, 4000, &policy);
        assert_eq!(p, GuildProgress { level: 6, experience: 500 });
        assert_eq!(gain.levels_reached().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn cascade_stops_at_cap() {
        let policy = capped();
        let mut p = GuildProgress {
            level: 34,
            experience: 0,
        };
        let gain = apply_experience(&mut p, 10_000, &policy);
        assert_eq!(gain.new_level, 35);
        assert_eq!(p.experience, 1499);
        assert!(p.experience < policy.threshold_for(p.level));

        assert_eq!(gain.absorbed, 1500 + 1499);

        let again = apply_experience(&mut p, 10_000, &policy);
        assert!(!again.leveled_up());
        assert_eq!(again.absorbed, 0);
        assert_eq!(p.level, 35);
    }

    #[test]
    fn absorbed_matches_request_without_cap() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress {
            level: 40,
            experience: 700,
        };
        let gain = apply_experience(&mut p, 4321, &policy);
        assert_eq!(gain.absorbed, 4321);
        assert_eq!(p.level, 43);
    }

    #[test]
    fn huge_gain_does_not_overflow() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress {
            level: 1,
            experience: 1499,
        };
        let gain = apply_experience(&mut p, u32::MAX, &policy);
        assert!(gain.leveled_up());
        assert!(p.experience < 1500);
        assert!(gain.absorbed <= u32::MAX - 1499);
    }

    #[test]
    fn add_then_remove_round_trips() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress {
            level: 4,
            experience: 321,
        };
        add_levels(&mut p, 3, &policy);
        assert_eq!(p.level, 7);
        remove_levels(&mut p, 3);
        assert_eq!(p, GuildProgress { level: 4, experience: 321 });
    }

    #[test]
    fn add_then_remove_round_trips_past_thirty_five() {
        let policy = ProgressionPolicy::default();
        let mut p = GuildProgress {
            level: 34,
            experience: 0,
        };
        add_levels(&mut p, 3, &policy);
        assert_eq!(p.level, 37);
        remove_levels(&mut p, 3);
        assert_eq!(p, GuildProgress { level: 34, experience: 0 });
    }

    #[test]
    fn remove_floors_at_one() {
        let mut p = GuildProgress {
            level: 3,
            experience: 10,
        };
        let change = remove_levels(&mut p, 50);
        assert_eq!(change.new_level, 1);
        assert_eq!(p.experience, 10);

        let noop = remove_levels(&mut p, 1);
        assert!(!noop.changed());
    }

    #[test]
    fn add_levels_clamps_to_cap() {
        let policy = capped();
        let mut p = GuildProgress::new();
        let change = add_levels(&mut p, 1000, &policy);
        assert_eq!(change.new_level, 35);
        let noop = add_levels(&mut p, 1, &policy);
        assert!(!noop.changed());
    }
}
