//! Guild perk registry: which effects each guild level grants.
//!
//! Perks are cumulative. A guild at level `L` grants every perk whose
//! unlock level is `<= L`. The registry is a static table built once at
//! startup and never mutated afterwards.
//!
//! ```
//! use guildprog_logic::perks::PerkRegistry;
//!
//! let registry = PerkRegistry::standard();
//! let low = registry.effects_for(2);
//! let high = registry.effects_for(10);
//! assert!(low.is_subset(&high));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque handle for one granted effect (aura or ability id on the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PerkId(pub u32);

/// A set of active perks. Ordered so diffs and logs are deterministic.
pub type PerkSet = BTreeSet<PerkId>;

/// What kind of effect a perk is on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerkKind {
    /// Passive aura kept on the character while online.
    Aura,
    /// Unlocked ability.
    Ability,
    /// Access to a guild service.
    Service,
}

/// One row of the perk table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perk {
    pub id: PerkId,
    pub name: String,
    pub kind: PerkKind,
    pub unlock_level: u32,
}

/// Level-ordered perk table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkRegistry {
    perks: Vec<Perk>,
}

impl PerkRegistry {
    /// Build a registry from arbitrary rows. Rows are sorted by unlock level.
    pub fn new(mut perks: Vec<Perk>) -> Self {
        perks.sort_by_key(|p| (p.unlock_level, p.id));
        Self { perks }
    }

    /// The baseline perk table shipped with the server.
    pub fn standard() -> Self {
        Self::new(standard_perks())
    }

    /// Every perk granted at `level`. Empty below the first unlock.
    pub fn effects_for(&self, level: u32) -> PerkSet {
        self.perks
            .iter()
            .take_while(|p| p.unlock_level <= level)
            .map(|p| p.id)
            .collect()
    }

    /// Perks that unlock exactly at `level`.
    pub fn unlocked_at(&self, level: u32) -> impl Iterator<Item = &Perk> {
        self.perks.iter().filter(move |p| p.unlock_level == level)
    }

    pub fn get(&self, id: PerkId) -> Option<&Perk> {
        self.perks.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Perk> {
        self.perks.iter()
    }

    pub fn len(&self) -> usize {
        self.perks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perks.is_empty()
    }
}

fn perk(id: u32, name: &str, kind: PerkKind, unlock_level: u32) -> Perk {
    Perk {
        id: PerkId(id),
        name: name.to_string(),
        kind,
        unlock_level,
    }
}

/// Baseline perk rows.
pub fn standard_perks() -> Vec<Perk> {
    vec![
        perk(1001, "Guild Camaraderie", PerkKind::Aura, 1),
        perk(1002, "Mount Up", PerkKind::Aura, 2),
        perk(1003, "Field Repairs", PerkKind::Service, 3),
        perk(1004, "Hasty Hearth", PerkKind::Ability, 4),
        perk(1005, "Guild Vault Access", PerkKind::Service, 5),
        perk(1006, "Reputation Boost", PerkKind::Aura, 6),
        perk(1008, "Elixir Potency", PerkKind::Aura, 8),
        perk(1010, "Mass Resurrection", PerkKind::Ability, 10),
        perk(1012, "Swift Travel", PerkKind::Aura, 12),
        perk(1015, "Bountiful Bags", PerkKind::Aura, 15),
        perk(1020, "Guild Herald", PerkKind::Ability, 20),
        perk(1025, "Honored Defender", PerkKind::Aura, 25),
        perk(1030, "Banner of Unity", PerkKind::Aura, 30),
        perk(1035, "Legendary Guild", PerkKind::Aura, 35),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_first_unlock_is_empty() {
        let r = PerkRegistry::standard();
        assert!(r.effects_for(0).is_empty());
        assert_eq!(r.effects_for(1), PerkSet::from([PerkId(1001)]));
    }

    #[test]
    fn perks_are_cumulative() {
        let r = PerkRegistry::standard();
        for level in 1..40 {
            let lower = r.effects_for(level);
            let higher = r.effects_for(level + 1);
            assert!(lower.is_subset(&higher), "level {} not subset", level);
        }
        assert_eq!(r.effects_for(35).len(), r.len());
        assert_eq!(r.effects_for(1000).len(), r.len());
    }

    #[test]
    fn unsorted_input_is_ordered() {
        let r = PerkRegistry::new(vec![
            perk(2, "b", PerkKind::Aura, 5),
            perk(1, "a", PerkKind::Aura, 1),
        ]);
        assert_eq!(r.effects_for(1), PerkSet::from([PerkId(1)]));
        assert_eq!(r.effects_for(5).len(), 2);
    }

    #[test]
    fn unlocked_at_and_lookup() {
        let r = PerkRegistry::standard();
        let at_five: Vec<_> = r.unlocked_at(5).map(|p| p.name.as_str()).collect();
        assert_eq!(at_five, vec!["Guild Vault Access"]);
        assert_eq!(r.unlocked_at(7).count(), 0);
        assert_eq!(r.get(PerkId(1003)).map(|p| p.kind), Some(PerkKind::Service));
        assert!(r.get(PerkId(9)).is_none());
    }

    #[test]
    fn standard_table_valid() {
        let r = PerkRegistry::standard();
        assert!(!r.is_empty());
        let ids: BTreeSet<_> = r.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), r.len(), "duplicate perk ids");
        for p in r.iter() {
            assert!(p.unlock_level >= 1);
            assert!(!p.name.is_empty());
        }
    }
}
