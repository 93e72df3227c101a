//! Progression engine wiring for reducers.
//!
//! SpacetimeDB reducers are stateless calls, so the hook table is rebuilt
//! from the stored configuration at the start of each reducer that needs it.

use crate::tables::*;
use guildprog_logic::admin::AdminConsole;
use guildprog_logic::hooks::HookTable;
use guildprog_logic::perks::PerkRegistry;
use guildprog_logic::policy::ProgressionPolicy;
use spacetimedb::ReducerContext;

pub struct Engine {
    pub hooks: HookTable,
    pub console: AdminConsole,
}

impl Engine {
    pub fn load(ctx: &ReducerContext) -> Self {
        let policy = policy_from(ctx);
        Self {
            hooks: HookTable::with_progression(&policy, &PerkRegistry::standard()),
            console: AdminConsole::new(policy),
        }
    }
}

/// Default policy with the stored threshold and cap applied.
pub fn policy_from(ctx: &ReducerContext) -> ProgressionPolicy {
    let mut policy = ProgressionPolicy::default();
    if let Some(config) = ctx.db.server_config().id().find(0) {
        policy.experience_per_level = config.experience_per_level;
        policy.max_level = (config.max_level > 0).then_some(config.max_level);
    }
    policy
}
