//! Client-facing reducers for guild membership, gameplay events and admin
//! commands.

use crate::engine::Engine;
use crate::housekeeping;
use crate::tables::*;
use crate::world::DbWorld;
use guildprog_logic::admin::{CommandSession, Privilege};
use guildprog_logic::hooks::{ExperienceSource, RemovalReason};
use guildprog_logic::policy::{ProgressionPolicy, STARTING_LEVEL};
use guildprog_logic::rewards::GuildEvent;
use guildprog_logic::world::{GuildId, PlayerId};
use spacetimedb::{reducer, Identity, ReducerContext, Table};

// ============================================================================
// LIFECYCLE
// ============================================================================

#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    let policy = ProgressionPolicy::default();
    ctx.db.server_config().insert(ServerConfig {
        id: 0,
        owner: ctx.sender,
        experience_per_level: policy.experience_per_level,
        max_level: policy.max_level.unwrap_or(0),
    });
    log::info!(
        "Guild progression initialized: {} exp per level, cap {:?}",
        policy.experience_per_level,
        policy.max_level
    );
}

/// Called when a client connects; logs their character in
#[reducer(client_connected)]
pub fn client_connected(ctx: &ReducerContext) {
    log::info!("Client connected: {:?}", ctx.sender);
    housekeeping::prune_history(ctx);
    let Some(mut player) = player_for(ctx, ctx.sender) else {
        return;
    };
    player.online = true;
    let player_id = PlayerId(player.id);
    ctx.db.player().id().update(player);

    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine.hooks.player_login(&mut world, player_id);
}

/// Called when a client disconnects; logs their character out
#[reducer(client_disconnected)]
pub fn client_disconnected(ctx: &ReducerContext) {
    log::info!("Client disconnected: {:?}", ctx.sender);
    let Some(mut player) = player_for(ctx, ctx.sender) else {
        return;
    };
    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine.hooks.player_logout(&mut world, PlayerId(player.id));

    player.online = false;
    ctx.db.player().id().update(player);
}

// ============================================================================
// CHARACTERS
// ============================================================================

/// Create the caller's character
#[reducer]
pub fn create_character(ctx: &ReducerContext, name: String) -> Result<(), String> {
    if player_for(ctx, ctx.sender).is_some() {
        return Err("Character already exists".into());
    }
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err("Character name must not be empty".into());
    }

    let privilege = if is_owner(ctx, ctx.sender) {
        privilege_levels::ADMINISTRATOR
    } else {
        privilege_levels::PLAYER
    };
    let player_id = ctx
        .db
        .player()
        .insert(Player {
            id: 0,
            owner_identity: ctx.sender,
            name: name.clone(),
            online: true,
            in_combat: false,
            in_flight: false,
            privilege,
            selected_player: None,
            experience: 0,
            created_at: ctx.timestamp,
        })
        .id;

    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine.hooks.player_login(&mut world, PlayerId(player_id));

    log::info!("Character {} created with id {}", name, player_id);
    Ok(())
}

/// Target another player for admin commands (None clears the selection)
#[reducer]
pub fn select_player(ctx: &ReducerContext, target: Option<u64>) -> Result<(), String> {
    let mut me = require_player(ctx)?;
    if let Some(id) = target {
        if ctx.db.player().id().find(id).is_none() {
            return Err(format!("No player with id {}", id));
        }
    }
    me.selected_player = target;
    ctx.db.player().id().update(me);
    Ok(())
}

/// Combat/flight flags reported by the game simulation
#[reducer]
pub fn set_player_state(
    ctx: &ReducerContext,
    player_id: u64,
    in_combat: bool,
    in_flight: bool,
) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::GAME_MASTER)?;
    let Some(mut player) = ctx.db.player().id().find(player_id) else {
        return Err(format!("No player with id {}", player_id));
    };
    player.in_combat = in_combat;
    player.in_flight = in_flight;
    ctx.db.player().id().update(player);
    Ok(())
}

#[reducer]
pub fn set_privilege(ctx: &ReducerContext, player_id: u64, privilege: u8) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::ADMINISTRATOR)?;
    let Some(mut player) = ctx.db.player().id().find(player_id) else {
        return Err(format!("No player with id {}", player_id));
    };
    player.privilege = privilege.min(privilege_levels::ADMINISTRATOR);
    log::info!("Player {} privilege set to {}", player.name, player.privilege);
    ctx.db.player().id().update(player);
    Ok(())
}

// ============================================================================
// GUILD MEMBERSHIP
// ============================================================================

/// Found a new guild led by the caller
#[reducer]
pub fn create_guild(ctx: &ReducerContext, name: String) -> Result<(), String> {
    let me = require_player(ctx)?;
    if ctx.db.guild_member().player_id().find(me.id).is_some() {
        return Err("Already in a guild".into());
    }
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err("Guild name must not be empty".into());
    }
    if ctx
        .db
        .guild()
        .iter()
        .any(|g| g.name.eq_ignore_ascii_case(&name))
    {
        return Err(format!("Guild name '{}' is taken", name));
    }

    let guild_id = ctx
        .db
        .guild()
        .insert(Guild {
            id: 0,
            name: name.clone(),
            leader_id: me.id,
            level: STARTING_LEVEL,
            experience: 0,
            created_at: ctx.timestamp,
        })
        .id;
    add_member(ctx, guild_id, me.id);

    log::info!("Guild {} ({}) founded by {}", name, guild_id, me.name);
    Ok(())
}

#[reducer]
pub fn join_guild(ctx: &ReducerContext, guild_id: u32) -> Result<(), String> {
    let me = require_player(ctx)?;
    if ctx.db.guild_member().player_id().find(me.id).is_some() {
        return Err("Already in a guild".into());
    }
    if ctx.db.guild().id().find(guild_id).is_none() {
        return Err(format!("No guild with id {}", guild_id));
    }
    add_member(ctx, guild_id, me.id);
    log::info!("{} joined guild {}", me.name, guild_id);
    Ok(())
}

#[reducer]
pub fn leave_guild(ctx: &ReducerContext) -> Result<(), String> {
    let me = require_player(ctx)?;
    let Some(membership) = ctx.db.guild_member().player_id().find(me.id) else {
        return Err("Not in a guild".into());
    };
    let is_leader = ctx
        .db
        .guild()
        .id()
        .find(membership.guild_id)
        .is_some_and(|g| g.leader_id == me.id);
    if is_leader {
        return Err("The guild leader must disband the guild instead".into());
    }
    remove_member(ctx, membership.guild_id, me.id, RemovalReason::Left);
    log::info!("{} left guild {}", me.name, membership.guild_id);
    Ok(())
}

#[reducer]
pub fn kick_member(ctx: &ReducerContext, player_id: u64) -> Result<(), String> {
    let me = require_player(ctx)?;
    let guild = led_guild(ctx, me.id)?;
    if player_id == me.id {
        return Err("Cannot kick yourself".into());
    }
    let in_guild = ctx
        .db
        .guild_member()
        .player_id()
        .find(player_id)
        .is_some_and(|m| m.guild_id == guild.id);
    if !in_guild {
        return Err(format!("Player {} is not in your guild", player_id));
    }
    remove_member(ctx, guild.id, player_id, RemovalReason::Kicked);
    log::info!("Player {} kicked from guild {}", player_id, guild.id);
    Ok(())
}

/// Disband the caller's guild. Perks are revoked from every member before
/// the guild row goes away; the guild's notices are deleted with it.
#[reducer]
pub fn disband_guild(ctx: &ReducerContext) -> Result<(), String> {
    let me = require_player(ctx)?;
    let guild = led_guild(ctx, me.id)?;
    let members: Vec<u64> = ctx
        .db
        .guild_member()
        .guild_id()
        .filter(guild.id)
        .map(|m| m.player_id)
        .collect();
    for player_id in members {
        remove_member(ctx, guild.id, player_id, RemovalReason::Disbanded);
    }
    housekeeping::delete_guild_notices(ctx, guild.id);
    ctx.db.guild().id().delete(guild.id);
    log::info!("Guild {} ({}) disbanded", guild.name, guild.id);
    Ok(())
}

// ============================================================================
// GAMEPLAY EVENTS
// ============================================================================

/// Arena / battleground / group-finder result for a player (guild_events::*)
#[reducer]
pub fn report_guild_event(ctx: &ReducerContext, player_id: u64, event: u8) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::GAME_MASTER)?;
    let event = match event {
        guild_events::ARENA_WON => GuildEvent::ArenaWon,
        guild_events::BATTLEGROUND_WON => GuildEvent::BattlegroundWon,
        guild_events::GROUP_ACTIVITY_COMPLETED => GuildEvent::GroupActivityCompleted,
        other => return Err(format!("Unknown guild event {}", other)),
    };
    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine.hooks.guild_event(&mut world, PlayerId(player_id), event);
    Ok(())
}

/// Flat guild experience award from any other game system
#[reducer]
pub fn award_guild_experience(ctx: &ReducerContext, player_id: u64, amount: u32) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::GAME_MASTER)?;
    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine
        .hooks
        .guild_event(&mut world, PlayerId(player_id), GuildEvent::Award(amount));
    Ok(())
}

/// Character experience award; guild membership may scale it
#[reducer]
pub fn grant_personal_experience(
    ctx: &ReducerContext,
    player_id: u64,
    amount: u32,
    source: u8,
) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::GAME_MASTER)?;
    let Some(mut player) = ctx.db.player().id().find(player_id) else {
        return Err(format!("No player with id {}", player_id));
    };
    let source = match source {
        experience_sources::KILL => ExperienceSource::Kill,
        experience_sources::QUEST => ExperienceSource::Quest,
        experience_sources::EXPLORATION => ExperienceSource::Exploration,
        _ => ExperienceSource::Other,
    };

    let engine = Engine::load(ctx);
    let world = DbWorld::new(ctx);
    let scaled = engine
        .hooks
        .personal_experience_gain(&world, PlayerId(player_id), amount, source);

    player.experience = player.experience.saturating_add(scaled as u64);
    ctx.db.player().id().update(player);
    Ok(())
}

// ============================================================================
// ADMIN COMMANDS
// ============================================================================

/// Run a progression admin command line; replies land in `command_reply`
#[reducer]
pub fn admin_command(ctx: &ReducerContext, line: String) {
    let me = player_for(ctx, ctx.sender);
    let privilege = match &me {
        Some(p) => Privilege::from_u8(p.privilege),
        None if is_owner(ctx, ctx.sender) => Privilege::Administrator,
        None => Privilege::Player,
    };
    let session = CommandSession {
        privilege,
        own_player: me.as_ref().map(|p| PlayerId(p.id)),
        selected_player: me.as_ref().and_then(|p| p.selected_player).map(PlayerId),
    };

    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    match engine.console.run(&session, &mut world, &engine.hooks, &line) {
        Ok(lines) => {
            for message in lines {
                reply(ctx, &line, true, message);
            }
        }
        Err(e) => {
            log::warn!("Admin command '{}' failed: {}", line, e);
            reply(ctx, &line, false, e.to_string());
        }
    }
}

/// Delete the caller's admin command replies once the client has read them
#[reducer]
pub fn clear_command_replies(ctx: &ReducerContext) {
    housekeeping::delete_replies_for(ctx, ctx.sender);
}

// ============================================================================
// HOUSEKEEPING
// ============================================================================

/// Delete notices, service uses and replies past their retention window
#[reducer]
pub fn prune_history(ctx: &ReducerContext) -> Result<(), String> {
    require_privilege(ctx, privilege_levels::GAME_MASTER)?;
    housekeeping::prune_history(ctx);
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn reply(ctx: &ReducerContext, command: &str, success: bool, message: String) {
    ctx.db.command_reply().insert(CommandReply {
        id: 0,
        identity: ctx.sender,
        command: command.to_string(),
        success,
        message,
        issued_at: ctx.timestamp,
    });
}

fn player_for(ctx: &ReducerContext, identity: Identity) -> Option<Player> {
    ctx.db
        .player()
        .iter()
        .find(|p| p.owner_identity == identity)
}

fn require_player(ctx: &ReducerContext) -> Result<Player, String> {
    player_for(ctx, ctx.sender).ok_or_else(|| "Create a character first".to_string())
}

fn is_owner(ctx: &ReducerContext, identity: Identity) -> bool {
    ctx.db
        .server_config()
        .id()
        .find(0)
        .is_some_and(|c| c.owner == identity)
}

/// Module owner always passes; everyone else needs a character at `min`.
fn require_privilege(ctx: &ReducerContext, min: u8) -> Result<(), String> {
    if is_owner(ctx, ctx.sender) {
        return Ok(());
    }
    match player_for(ctx, ctx.sender) {
        Some(p) if p.privilege >= min => Ok(()),
        _ => Err("Insufficient privilege".into()),
    }
}

fn led_guild(ctx: &ReducerContext, player_id: u64) -> Result<Guild, String> {
    ctx.db
        .guild_member()
        .player_id()
        .find(player_id)
        .and_then(|m| ctx.db.guild().id().find(m.guild_id))
        .filter(|g| g.leader_id == player_id)
        .ok_or_else(|| "Only the guild leader can do that".to_string())
}

fn add_member(ctx: &ReducerContext, guild_id: u32, player_id: u64) {
    ctx.db.guild_member().insert(GuildMember {
        player_id,
        guild_id,
        joined_at: ctx.timestamp,
    });
    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine
        .hooks
        .member_added(&mut world, GuildId(guild_id), PlayerId(player_id));
}

fn remove_member(ctx: &ReducerContext, guild_id: u32, player_id: u64, reason: RemovalReason) {
    let engine = Engine::load(ctx);
    let mut world = DbWorld::new(ctx);
    engine
        .hooks
        .member_removed(&mut world, GuildId(guild_id), PlayerId(player_id), reason);
    ctx.db.guild_member().player_id().delete(player_id);
}
