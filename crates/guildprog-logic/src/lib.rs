//! Pure guild progression logic for GuildProg.
//!
//! This crate contains the guild progression engine independent of any
//! database or server runtime. The host (a SpacetimeDB module, the headless
//! harness, or a test) implements [`world::GuildWorld`] over its own entity
//! registry and drives the engine through a [`hooks::HookTable`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`admin`] | Operator commands: progress, add/remove level, add experience, services |
//! | [`announce`] | Guild-wide level-up and experience notices |
//! | [`binder`] | Keeps members' guild perks equal to their guild's level |
//! | [`hooks`] | Event hook traits and the host-owned dispatch table |
//! | [`ledger`] | Level/experience state and level-up cascades |
//! | [`memory`] | In-memory host for tests and the harness |
//! | [`perks`] | Level → perk registry |
//! | [`policy`] | Thresholds, rewards, XP bonus, service gates |
//! | [`rewards`] | Gameplay events → guild experience, personal XP bonus |
//! | [`world`] | Host collaborator interface and id types |

pub mod admin;
pub mod announce;
pub mod binder;
pub mod hooks;
pub mod ledger;
pub mod memory;
pub mod perks;
pub mod policy;
pub mod rewards;
pub mod world;
