//! Administrative command surface for guild progression.
//!
//! Privileged operators inspect and mutate progression directly, bypassing
//! the event reward policy. Commands are plain text lines:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `progress [id \| name]` | Level/experience summary |
//! | `add-level [n]` | Raise the selected player's guild level |
//! | `remove-level [n]` | Lower it (floored at 1) |
//! | `add-experience [n]` | Feed the ledger directly |
//! | `repair` | Level-gated repair of the issuer's equipment |
//! | `show-bank` | Level-gated guild bank window |
//!
//! Missing, non-numeric or zero amounts fall back to 1. A line that names
//! no command is a `progress` lookup, so a bare `12` or `Iron Oath` works.
//! Every command returns reply lines for the operator or a [`CommandError`]
//! whose `Display` is the message to show.
//!
//! ```
//! use guildprog_logic::admin::{AdminCommand, GuildLookup};
//! use guildprog_logic::world::GuildId;
//!
//! assert_eq!(AdminCommand::parse("add-level 3"), AdminCommand::AddLevel(3));
//! assert_eq!(AdminCommand::parse("add-experience"), AdminCommand::AddExperience(1));
//! assert_eq!(
//!     AdminCommand::parse("progress 12"),
//!     AdminCommand::Progress(GuildLookup::Id(GuildId(12)))
//! );
//! assert_eq!(AdminCommand::parse("12"), AdminCommand::Progress(GuildLookup::Id(GuildId(12))));
//! ```

use crate::hooks::HookTable;
use crate::ledger::ExperienceLedger;
use crate::policy::{ProgressionPolicy, ServiceGate};
use crate::world::{GuildId, GuildWorld, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Operator privilege, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Privilege {
    Player,
    Moderator,
    GameMaster,
    Administrator,
}

impl Privilege {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Privilege::Player,
            1 => Privilege::Moderator,
            2 => Privilege::GameMaster,
            _ => Privilege::Administrator,
        }
    }
}

/// Minimum privilege for every progression command.
pub const REQUIRED_PRIVILEGE: Privilege = Privilege::GameMaster;

/// Who issued a command and what they have selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSession {
    pub privilege: Privilege,
    /// The issuer's own character, if they are in the world.
    pub own_player: Option<PlayerId>,
    /// The player the issuer currently has targeted.
    pub selected_player: Option<PlayerId>,
}

impl CommandSession {
    /// Selected player, falling back to the issuer's own character.
    pub fn selected_or_self(&self) -> Option<PlayerId> {
        self.selected_player.or(self.own_player)
    }
}

/// How a `progress` argument names its guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildLookup {
    Id(GuildId),
    Name(String),
    /// No argument: the selected player's guild.
    Selection,
}

impl GuildLookup {
    /// Numeric ids first, then names, then the implicit selection.
    pub fn from_arg(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.is_empty() {
            return GuildLookup::Selection;
        }
        match arg.parse::<u32>() {
            Ok(id) => GuildLookup::Id(GuildId(id)),
            Err(_) => GuildLookup::Name(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Progress(GuildLookup),
    AddLevel(u32),
    RemoveLevel(u32),
    AddExperience(u32),
    Repair,
    ShowBank,
}

impl AdminCommand {
    /// Unrecognized first words fall through to a `progress` lookup on the
    /// whole line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        match name.to_ascii_lowercase().as_str() {
            "progress" => AdminCommand::Progress(GuildLookup::from_arg(rest)),
            "add-level" | "addlevel" => AdminCommand::AddLevel(parse_amount(rest)),
            "remove-level" | "removelevel" => AdminCommand::RemoveLevel(parse_amount(rest)),
            "add-experience" | "addexperience" => AdminCommand::AddExperience(parse_amount(rest)),
            "repair" => AdminCommand::Repair,
            "show-bank" | "mybank" => AdminCommand::ShowBank,
            _ => AdminCommand::Progress(GuildLookup::from_arg(line)),
        }
    }
}

/// Leading digits of the first token, or 1 when there are none (or zero).
pub fn parse_amount(arg: &str) -> u32 {
    let token = arg.split_whitespace().next().unwrap_or("");
    let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => n,
        Ok(_) => 1,
        // overflowing digit runs saturate instead of falling back
        Err(_) if !digits.is_empty() => u32::MAX,
        Err(_) => 1,
    }
}

/// Level-gated guild services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildService {
    Repair,
    Bank,
}

impl fmt::Display for GuildService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuildService::Repair => write!(f, "guild repair"),
            GuildService::Bank => write!(f, "guild bank access"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStateIssue {
    InCombat,
    InFlight,
}

impl fmt::Display for PlayerStateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStateIssue::InCombat => write!(f, "You are in combat."),
            PlayerStateIssue::InFlight => write!(f, "You are in flight."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Guild not found.")]
    GuildNotFound,

    #[error("No player selected.")]
    PlayerNotFound,

    #[error("{0} is not in a guild.")]
    NoGuild(String),

    #[error("Your guild level is lower than {required} (currently {current}), {service} is unavailable.")]
    ThresholdNotMet {
        service: GuildService,
        required: u32,
        current: u32,
    },

    #[error("{0}")]
    InvalidPlayerState(PlayerStateIssue),

    #[error("You do not have permission to use this command.")]
    InsufficientPrivilege,
}

/// Executes admin commands against a live host.
#[derive(Debug, Clone, Default)]
pub struct AdminConsole {
    ledger: ExperienceLedger,
}

impl AdminConsole {
    pub fn new(policy: ProgressionPolicy) -> Self {
        Self {
            ledger: ExperienceLedger::new(policy),
        }
    }

    /// Privilege check, parse and execute one command line.
    pub fn run(
        &self,
        session: &CommandSession,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        line: &str,
    ) -> Result<Vec<String>, CommandError> {
        authorize(session)?;
        let command = AdminCommand::parse(line);
        self.execute(session, world, hooks, &command)
    }

    pub fn execute(
        &self,
        session: &CommandSession,
        world: &mut dyn GuildWorld,
        hooks: &HookTable,
        command: &AdminCommand,
    ) -> Result<Vec<String>, CommandError> {
        authorize(session)?;
        match command {
            AdminCommand::Progress(lookup) => self.progress(session, world, lookup),
            AdminCommand::AddLevel(n) => {
                let (player, guild, name) = selected_guild(session, world)?;
                let change = self
                    .ledger
                    .add_level(world, hooks, guild, *n, Some(player))
                    .ok_or(CommandError::GuildNotFound)?;
                let applied = change.new_level.abs_diff(change.previous_level);
                log::info!("Admin: guild {} +{} levels -> {}", guild, applied, change.new_level);
                Ok(vec![format!(
                    "Guild {} has received {} additional levels and is now level {}.",
                    name, applied, change.new_level
                )])
            }
            AdminCommand::RemoveLevel(n) => {
                let (_, guild, name) = selected_guild(session, world)?;
                let change = self
                    .ledger
                    .remove_level(world, hooks, guild, *n)
                    .ok_or(CommandError::GuildNotFound)?;
                let applied = change.previous_level.abs_diff(change.new_level);
                log::info!("Admin: guild {} -{} levels -> {}", guild, applied, change.new_level);
                Ok(vec![format!(
                    "Guild {} has lost {} levels and is now level {}.",
                    name, applied, change.new_level
                )])
            }
            AdminCommand::AddExperience(n) => {
                let (player, guild, name) = selected_guild(session, world)?;
                let gain = self
                    .ledger
                    .add_experience(world, hooks, guild, *n, Some(player))
                    .ok_or(CommandError::GuildNotFound)?;
                log::info!(
                    "Admin: guild {} +{} exp -> level {} ({} exp)",
                    guild,
                    gain.absorbed,
                    gain.new_level,
                    gain.experience
                );
                Ok(vec![format!(
                    "Guild {} has received {} additional experience and now has {} / {} experience at level {}.",
                    name,
                    gain.absorbed,
                    gain.experience,
                    self.ledger.threshold_for(gain.new_level),
                    gain.new_level
                )])
            }
            AdminCommand::Repair => {
                let gate = &self.ledger.policy().services.repair;
                let player = self.gated_player(session, world, GuildService::Repair, gate)?;
                world.repair_all(player);
                let name = world.player_name(player).unwrap_or_default();
                log::info!("Admin: guild repair for player {}", player);
                Ok(vec![format!("All equipment of {} has been repaired.", name)])
            }
            AdminCommand::ShowBank => {
                let gate = &self.ledger.policy().services.bank;
                let player = self.gated_player(session, world, GuildService::Bank, gate)?;
                world.show_bank(player);
                log::info!("Admin: guild bank opened for player {}", player);
                Ok(vec!["Opening the guild bank.".to_string()])
            }
        }
    }

    fn progress(
        &self,
        session: &CommandSession,
        world: &dyn GuildWorld,
        lookup: &GuildLookup,
    ) -> Result<Vec<String>, CommandError> {
        let guild = match lookup {
            GuildLookup::Id(id) => *id,
            GuildLookup::Name(name) => world
                .find_guild_by_name(name)
                .ok_or(CommandError::GuildNotFound)?,
            GuildLookup::Selection => selected_guild(session, world)?.1,
        };
        let name = world.guild_name(guild).ok_or(CommandError::GuildNotFound)?;
        let progress = world
            .guild_progress(guild)
            .ok_or(CommandError::GuildNotFound)?;
        Ok(vec![
            format!("Guild {} (id {})", name, guild),
            format!(
                "Guild has level {} and {} / {} experience toward the next level.",
                progress.level,
                progress.experience,
                self.ledger.threshold_for(progress.level)
            ),
        ])
    }

    /// The issuer's own player, checked against a service gate.
    fn gated_player(
        &self,
        session: &CommandSession,
        world: &dyn GuildWorld,
        service: GuildService,
        gate: &ServiceGate,
    ) -> Result<PlayerId, CommandError> {
        let player = session
            .own_player
            .filter(|&p| world.player_name(p).is_some())
            .ok_or(CommandError::PlayerNotFound)?;
        let guild = world
            .player_guild(player)
            .ok_or_else(|| CommandError::NoGuild(world.player_name(player).unwrap_or_default()))?;
        let level = world
            .guild_progress(guild)
            .ok_or(CommandError::GuildNotFound)?
            .level;
        check_service(service, gate, level)?;

        if gate.requires_stable_state {
            let state = world.player_state(player);
            if state.in_combat {
                return Err(CommandError::InvalidPlayerState(PlayerStateIssue::InCombat));
            }
            if state.in_flight {
                return Err(CommandError::InvalidPlayerState(PlayerStateIssue::InFlight));
            }
        }
        Ok(player)
    }
}

fn authorize(session: &CommandSession) -> Result<(), CommandError> {
    if session.privilege < REQUIRED_PRIVILEGE {
        return Err(CommandError::InsufficientPrivilege);
    }
    Ok(())
}

/// Reject the service if the guild is below its gate.
pub fn check_service(service: GuildService, gate: &ServiceGate, level: u32) -> Result<(), CommandError> {
    if level < gate.min_level {
        return Err(CommandError::ThresholdNotMet {
            service,
            required: gate.min_level,
            current: level,
        });
    }
    Ok(())
}

/// Selected (or own) player, their guild and the guild's name.
fn selected_guild(
    session: &CommandSession,
    world: &dyn GuildWorld,
) -> Result<(PlayerId, GuildId, String), CommandError> {
    let player = session
        .selected_or_self()
        .ok_or(CommandError::PlayerNotFound)?;
    let player_name = world
        .player_name(player)
        .ok_or(CommandError::PlayerNotFound)?;
    let guild = world
        .player_guild(player)
        .ok_or(CommandError::NoGuild(player_name))?;
    let guild_name = world.guild_name(guild).ok_or(CommandError::GuildNotFound)?;
    Ok((player, guild, guild_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::GuildProgress;
    use crate::memory::MemoryWorld;
    use crate::perks::PerkRegistry;

    struct Fixture {
        world: MemoryWorld,
        hooks: HookTable,
        console: AdminConsole,
        guild: GuildId,
        gm: PlayerId,
        member: PlayerId,
    }

    fn fixture(level: u32) -> Fixture {
        let policy = ProgressionPolicy::default();
        let hooks = HookTable::with_progression(&policy, &PerkRegistry::standard());
        let mut world = MemoryWorld::new();
        let guild = world.create_guild("Iron Oath");
        world.set_guild_progress(
            guild,
            GuildProgress {
                level,
                experience: 0,
            },
        );
        let gm = world.create_player("Overseer");
        let member = world.create_player("Brannock");
        world.set_player_guild(gm, Some(guild));
        world.set_player_guild(member, Some(guild));
        world.set_online(gm, true);
        world.set_online(member, true);
        Fixture {
            world,
            hooks,
            console: AdminConsole::new(policy),
            guild,
            gm,
            member,
        }
    }

    fn gm_session(f: &Fixture) -> CommandSession {
        CommandSession {
            privilege: Privilege::GameMaster,
            own_player: Some(f.gm),
            selected_player: Some(f.member),
        }
    }

    fn run(f: &mut Fixture, session: CommandSession, line: &str) -> Result<Vec<String>, CommandError> {
        f.console.run(&session, &mut f.world, &f.hooks, line)
    }

    #[test]
    fn lookup_strategy() {
        assert_eq!(GuildLookup::from_arg(""), GuildLookup::Selection);
        assert_eq!(GuildLookup::from_arg("  "), GuildLookup::Selection);
        assert_eq!(GuildLookup::from_arg("7"), GuildLookup::Id(GuildId(7)));
        assert_eq!(
            GuildLookup::from_arg("Iron Oath"),
            GuildLookup::Name("Iron Oath".into())
        );
        assert_eq!(GuildLookup::from_arg("7th Legion"), GuildLookup::Name("7th Legion".into()));
    }

    #[test]
    fn amount_parsing_is_lenient() {
        assert_eq!(parse_amount(""), 1);
        assert_eq!(parse_amount("abc"), 1);
        assert_eq!(parse_amount("0"), 1);
        assert_eq!(parse_amount("50"), 50);
        assert_eq!(parse_amount("12abc"), 12);
        assert_eq!(parse_amount("3 4"), 3);
        assert_eq!(parse_amount("99999999999999"), u32::MAX);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(AdminCommand::parse(""), AdminCommand::Progress(GuildLookup::Selection));
        assert_eq!(AdminCommand::parse("addlevel 2"), AdminCommand::AddLevel(2));
        assert_eq!(AdminCommand::parse("REMOVE-LEVEL"), AdminCommand::RemoveLevel(1));
        assert_eq!(AdminCommand::parse("mybank"), AdminCommand::ShowBank);
    }

    #[test]
    fn unmatched_line_is_a_progress_lookup() {
        assert_eq!(
            AdminCommand::parse("12"),
            AdminCommand::Progress(GuildLookup::Id(GuildId(12)))
        );
        assert_eq!(
            AdminCommand::parse("Iron Oath"),
            AdminCommand::Progress(GuildLookup::Name("Iron Oath".into()))
        );
        assert_eq!(
            AdminCommand::parse("dance"),
            AdminCommand::Progress(GuildLookup::Name("dance".into()))
        );
    }

    #[test]
    fn bare_target_runs_progress() {
        let mut f = fixture(3);
        let session = gm_session(&f);
        let by_id_line = f.guild.to_string();
        let by_id = run(&mut f, session, &by_id_line).unwrap();
        let by_name = run(&mut f, session, "Iron Oath").unwrap();
        let explicit = run(&mut f, session, "progress iron oath").unwrap();
        assert_eq!(by_id, explicit);
        assert_eq!(by_name, explicit);
        assert_eq!(run(&mut f, session, "dance"), Err(CommandError::GuildNotFound));
    }

    #[test]
    fn players_cannot_run_commands() {
        let mut f = fixture(1);
        let session = CommandSession {
            privilege: Privilege::Moderator,
            ..gm_session(&f)
        };
        assert_eq!(
            run(&mut f, session, "add-level 5"),
            Err(CommandError::InsufficientPrivilege)
        );
        assert_eq!(f.world.progress(f.guild).level, 1);
        assert_eq!(
            run(&mut f, session, "nonsense"),
            Err(CommandError::InsufficientPrivilege)
        );
    }

    #[test]
    fn progress_by_id_name_and_selection() {
        let mut f = fixture(3);
        let session = gm_session(&f);
        let by_id_line = format!("progress {}", f.guild);
        let by_id = run(&mut f, session, &by_id_line).unwrap();
        let by_name = run(&mut f, session, "progress iron oath").unwrap();
        let by_sel = run(&mut f, session, "progress").unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id, by_sel);
        assert_eq!(by_id[0], format!("Guild Iron Oath (id {})", f.guild));
        assert_eq!(
            by_id[1],
            "Guild has level 3 and 0 / 1500 experience toward the next level."
        );
    }

    #[test]
    fn progress_unknown_guild() {
        let mut f = fixture(1);
        let session = gm_session(&f);
        assert_eq!(run(&mut f, session, "progress 404"), Err(CommandError::GuildNotFound));
        assert_eq!(
            run(&mut f, session, "progress Nobody"),
            Err(CommandError::GuildNotFound)
        );
    }

    #[test]
    fn selection_falls_back_to_self() {
        let mut f = fixture(1);
        let session = CommandSession {
            selected_player: None,
            ..gm_session(&f)
        };
        run(&mut f, session, "add-level").unwrap();
        assert_eq!(f.world.progress(f.guild).level, 2);

        let nobody = CommandSession {
            privilege: Privilege::Administrator,
            own_player: None,
            selected_player: None,
        };
        assert_eq!(run(&mut f, nobody, "add-level"), Err(CommandError::PlayerNotFound));
    }

    #[test]
    fn guildless_target_is_reported() {
        let mut f = fixture(1);
        let loner = f.world.create_player("Drifter");
        let session = CommandSession {
            selected_player: Some(loner),
            ..gm_session(&f)
        };
        assert_eq!(
            run(&mut f, session, "add-experience 5"),
            Err(CommandError::NoGuild("Drifter".into()))
        );
    }

    #[test]
    fn add_and_remove_levels() {
        let mut f = fixture(2);
        let session = gm_session(&f);
        let reply = run(&mut f, session, "add-level 3").unwrap();
        assert_eq!(
            reply,
            vec!["Guild Iron Oath has received 3 additional levels and is now level 5.".to_string()]
        );
        let reply = run(&mut f, session, "remove-level 10").unwrap();
        assert_eq!(
            reply,
            vec!["Guild Iron Oath has lost 4 levels and is now level 1.".to_string()]
        );
        assert_eq!(f.world.progress(f.guild).experience, 0);

        let reply = run(&mut f, session, "remove-level").unwrap();
        assert_eq!(
            reply,
            vec!["Guild Iron Oath has lost 0 levels and is now level 1.".to_string()]
        );
    }

    #[test]
    fn capped_add_level_reports_levels_applied() {
        let mut f = fixture(33);
        f.console = AdminConsole::new(ProgressionPolicy {
            max_level: Some(35),
            ..Default::default()
        });
        let session = gm_session(&f);
        let reply = run(&mut f, session, "add-level 1000").unwrap();
        assert_eq!(
            reply,
            vec!["Guild Iron Oath has received 2 additional levels and is now level 35.".to_string()]
        );
    }

    #[test]
    fn add_experience_without_amount_adds_one() {
        let mut f = fixture(1);
        let session = gm_session(&f);
        run(&mut f, session, "add-experience").unwrap();
        run(&mut f, session, "add-experience   ").unwrap();
        assert_eq!(f.world.progress(f.guild).experience, 2);

        let reply = run(&mut f, session, "add-experience 1600").unwrap();
        assert_eq!(f.world.progress(f.guild), GuildProgress { level: 2, experience: 102 });
        assert!(reply[0].contains("102 / 1500"));
    }

    #[test]
    fn repair_requires_level_three() {
        let mut f = fixture(2);
        let session = gm_session(&f);
        assert_eq!(
            run(&mut f, session, "repair"),
            Err(CommandError::ThresholdNotMet {
                service: GuildService::Repair,
                required: 3,
                current: 2,
            })
        );
        assert_eq!(f.world.player(f.gm).map(|p| p.repairs), Some(0));

        f.world.set_guild_progress(f.guild, GuildProgress { level: 3, experience: 0 });
        run(&mut f, session, "repair").unwrap();
        assert_eq!(f.world.player(f.gm).map(|p| p.repairs), Some(1));
        // the issuer is repaired, not the selection
        assert_eq!(f.world.player(f.member).map(|p| p.repairs), Some(0));
    }

    #[test]
    fn repair_ignores_combat() {
        let mut f = fixture(3);
        let session = gm_session(&f);
        f.world.set_in_combat(f.gm, true);
        assert!(run(&mut f, session, "repair").is_ok());
    }

    #[test]
    fn bank_checks_level_then_state() {
        let mut f = fixture(4);
        let session = gm_session(&f);
        f.world.set_in_combat(f.gm, true);
        assert!(matches!(
            run(&mut f, session, "show-bank"),
            Err(CommandError::ThresholdNotMet { required: 5, .. })
        ));

        f.world.set_guild_progress(f.guild, GuildProgress { level: 5, experience: 0 });
        assert_eq!(
            run(&mut f, session, "show-bank"),
            Err(CommandError::InvalidPlayerState(PlayerStateIssue::InCombat))
        );

        f.world.set_in_combat(f.gm, false);
        f.world.set_in_flight(f.gm, true);
        assert_eq!(
            run(&mut f, session, "show-bank"),
            Err(CommandError::InvalidPlayerState(PlayerStateIssue::InFlight))
        );

        f.world.set_in_flight(f.gm, false);
        assert!(run(&mut f, session, "show-bank").is_ok());
        assert_eq!(f.world.player(f.gm).map(|p| p.bank_opens), Some(1));
    }

    #[test]
    fn error_messages_are_readable() {
        let err = CommandError::ThresholdNotMet {
            service: GuildService::Bank,
            required: 5,
            current: 2,
        };
        assert_eq!(
            err.to_string(),
            "Your guild level is lower than 5 (currently 2), guild bank access is unavailable."
        );
        assert_eq!(
            CommandError::InvalidPlayerState(PlayerStateIssue::InFlight).to_string(),
            "You are in flight."
        );
    }
}
