//! Fixed guild progression policy tables.
//!
//! Every number the progression engine uses lives here: the experience
//! needed per level, the level cap, the flat rewards for gameplay events,
//! the personal XP bonus and the level gates on guild services.
//!
//! ```
//! use guildprog_logic::policy::ProgressionPolicy;
//!
//! let policy = ProgressionPolicy::default();
//! assert_eq!(policy.experience_per_level, 1500);
//! assert_eq!(policy.rewards.arena_won, 5);
//! assert_eq!(policy.services.bank.min_level, 5);
//! ```

use serde::{Deserialize, Serialize};

/// Level every guild starts at.
pub const STARTING_LEVEL: u32 = 1;

/// Flat guild experience granted per gameplay event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRewards {
    pub arena_won: u32,
    pub battleground_won: u32,
    pub group_activity_completed: u32,
}

impl Default for EventRewards {
    fn default() -> Self {
        Self {
            arena_won: 5,
            battleground_won: 1,
            group_activity_completed: 1,
        }
    }
}

/// Multiplier applied to a guilded character's own experience gains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalXpBonus {
    /// Guild level at which the bonus starts applying.
    pub min_guild_level: u32,
    pub multiplier: u32,
}

impl Default for PersonalXpBonus {
    fn default() -> Self {
        Self {
            min_guild_level: 1,
            multiplier: 2,
        }
    }
}

/// Level gate on a single guild service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGate {
    pub min_level: u32,
    /// Refuse the service while the player is in combat or in flight.
    pub requires_stable_state: bool,
}

/// Level-gated guild services reachable through admin commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGates {
    pub repair: ServiceGate,
    pub bank: ServiceGate,
}

impl Default for ServiceGates {
    fn default() -> Self {
        Self {
            repair: ServiceGate {
                min_level: 3,
                requires_stable_state: false,
            },
            bank: ServiceGate {
                min_level: 5,
                requires_stable_state: true,
            },
        }
    }
}

/// The complete progression policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionPolicy {
    /// Experience needed to advance one level. Same for every level.
    pub experience_per_level: u32,
    /// Highest reachable level. `None` (the default) leaves levels uncapped.
    pub max_level: Option<u32>,
    pub rewards: EventRewards,
    pub personal_xp: PersonalXpBonus,
    pub services: ServiceGates,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            experience_per_level: 1500,
            max_level: None,
            rewards: EventRewards::default(),
            personal_xp: PersonalXpBonus::default(),
            services: ServiceGates::default(),
        }
    }
}

impl ProgressionPolicy {
    /// Experience required to go from `level` to `level + 1`.
    ///
    /// Never returns zero, so a cascade always terminates.
    pub fn threshold_for(&self, _level: u32) -> u32 {
        self.experience_per_level.max(1)
    }

    /// Clamp a level into `[STARTING_LEVEL, max_level]`.
    pub fn clamp_level(&self, level: u32) -> u32 {
        let level = level.max(STARTING_LEVEL);
        match self.max_level {
            Some(cap) => level.min(cap.max(STARTING_LEVEL)),
            None => level,
        }
    }

    /// Whether `level` is the last reachable level.
    pub fn is_capped(&self, level: u32) -> bool {
        self.max_level.is_some_and(|cap| level >= cap)
    }
}
