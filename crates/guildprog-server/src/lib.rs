//! GuildProg Server - SpacetimeDB Module
//!
//! Hosts the guild progression engine. Guild, player and perk state live in
//! tables; reducers translate client calls and gameplay reports into hook
//! dispatches on the pure logic in guildprog-logic.

mod engine;
mod housekeeping;
mod reducers;
mod tables;
mod world;

pub use reducers::*;
pub use tables::*;
