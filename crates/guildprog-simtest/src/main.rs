//! GuildProg Headless Progression Harness
//!
//! Validates pure progression logic and policy data without SpacetimeDB.
//! Runs entirely in-process against the in-memory world.
//!
//! Usage:
//!   cargo run -p guildprog-simtest
//!   cargo run -p guildprog-simtest -- --verbose
//!   cargo run -p guildprog-simtest -- --seed 7

use guildprog_logic::admin::{AdminConsole, CommandError, CommandSession, Privilege};
use guildprog_logic::hooks::{ExperienceSource, HookTable, RemovalReason};
use guildprog_logic::ledger::{
    add_levels, apply_experience, remove_levels, ExperienceLedger, GuildProgress,
};
use guildprog_logic::memory::MemoryWorld;
use guildprog_logic::perks::{PerkRegistry, PerkSet};
use guildprog_logic::policy::ProgressionPolicy;
use guildprog_logic::world::{GuildId, GuildWorld, PlayerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Policy table (same JSON the server documents) ───────────────────────
const POLICY_JSON: &str = include_str!("../../../data/progression_policy.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let seed = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    println!("=== GuildProg Progression Harness (seed {}) ===\n", seed);

    let policy = ProgressionPolicy::default();
    let registry = PerkRegistry::standard();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    // 1. Policy data file
    results.extend(validate_policy_file(&policy, verbose));

    // 2. Perk registry
    results.extend(validate_perk_registry(&registry, verbose));

    // 3. Ledger cascade sweep
    results.extend(validate_ledger_sweep(&policy, &mut rng));

    // 4. Level add/remove sweep
    results.extend(validate_level_adjustments(&policy, &mut rng));

    // 5. Perk consistency under random transitions
    results.extend(validate_perk_consistency(&policy, &registry, &mut rng, verbose));

    // 6. Rewards and personal XP
    results.extend(validate_rewards(&policy, &registry));

    // 7. Admin command scenarios
    results.extend(validate_admin_commands(&policy, &registry));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Policy File ──────────────────────────────────────────────────────

fn validate_policy_file(policy: &ProgressionPolicy, verbose: bool) -> Vec<TestResult> {
    println!("--- Policy File ---");
    let mut results = Vec::new();

    let parsed: ProgressionPolicy = match serde_json::from_str(POLICY_JSON) {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult {
                name: "policy_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "policy_matches_defaults".into(),
        passed: parsed == *policy,
        detail: if parsed == *policy {
            "data/progression_policy.json matches built-in policy".into()
        } else {
            format!("file {:?} != built-in {:?}", parsed, policy)
        },
    });

    results.push(TestResult {
        name: "policy_positive_threshold".into(),
        passed: parsed.experience_per_level > 0,
        detail: format!("{} exp per level", parsed.experience_per_level),
    });

    let gates_ordered = parsed.services.repair.min_level <= parsed.services.bank.min_level;
    let gates_reachable = parsed
        .max_level
        .map_or(true, |cap| parsed.services.bank.min_level <= cap);
    results.push(TestResult {
        name: "policy_service_gates".into(),
        passed: gates_ordered && gates_reachable,
        detail: format!(
            "repair at {}, bank at {}, cap {:?}",
            parsed.services.repair.min_level, parsed.services.bank.min_level, parsed.max_level
        ),
    });

    if verbose {
        println!(
            "  Rewards: arena {} / battleground {} / group {}",
            parsed.rewards.arena_won,
            parsed.rewards.battleground_won,
            parsed.rewards.group_activity_completed
        );
    }

    results
}

// ── 2. Perk Registry ────────────────────────────────────────────────────

fn validate_perk_registry(registry: &PerkRegistry, verbose: bool) -> Vec<TestResult> {
    println!("--- Perk Registry ---");
    let mut results = Vec::new();

    let non_cumulative: Vec<u32> = (1..50)
        .filter(|&l| !registry.effects_for(l).is_subset(&registry.effects_for(l + 1)))
        .collect();
    results.push(TestResult {
        name: "perks_cumulative".into(),
        passed: non_cumulative.is_empty(),
        detail: if non_cumulative.is_empty() {
            "every level's perks include the level below".into()
        } else {
            format!("levels losing perks: {:?}", non_cumulative)
        },
    });

    let ids: PerkSet = registry.iter().map(|p| p.id).collect();
    results.push(TestResult {
        name: "perks_unique_ids".into(),
        passed: ids.len() == registry.len(),
        detail: format!("{} perks, {} distinct ids", registry.len(), ids.len()),
    });

    results.push(TestResult {
        name: "perks_level_one".into(),
        passed: !registry.effects_for(1).is_empty(),
        detail: format!("{} perks at level 1", registry.effects_for(1).len()),
    });

    if verbose {
        println!("  Perk table:");
        for p in registry.iter() {
            println!("    L{:>2} {:?} {}", p.unlock_level, p.kind, p.name);
        }
    }

    results
}

// ── 3. Ledger Cascade ───────────────────────────────────────────────────

fn validate_ledger_sweep(policy: &ProgressionPolicy, rng: &mut StdRng) -> Vec<TestResult> {
    println!("--- Ledger Cascade ---");
    let mut results = Vec::new();
    let threshold = policy.threshold_for(1);

    let mut leftover_violations = 0;
    let mut level_count_violations = 0;
    for _ in 0..5_000 {
        let mut p = GuildProgress {
            level: rng.gen_range(1..=20),
            experience: rng.gen_range(0..threshold),
        };
        let before = p;
        let delta = rng.gen_range(0..20_000);
        let gain = apply_experience(&mut p, delta, policy);

        if p.experience >= policy.threshold_for(p.level) {
            leftover_violations += 1;
        }
        let expected = (before.experience + delta) / threshold;
        if gain.levels_reached().count() as u32 != expected
            || p.level != before.level + expected
        {
            level_count_violations += 1;
        }
    }
    results.push(TestResult {
        name: "ledger_cascade_consumed".into(),
        passed: leftover_violations == 0,
        detail: format!("{} of 5000 gains left a full threshold", leftover_violations),
    });
    results.push(TestResult {
        name: "ledger_one_level_per_threshold".into(),
        passed: level_count_violations == 0,
        detail: format!("{} of 5000 gains miscounted levels", level_count_violations),
    });

    let mut p = GuildProgress::new();
    apply_experience(&mut p, 1600, policy);
    results.push(TestResult {
        name: "ledger_1600_scenario".into(),
        passed: p == GuildProgress { level: 2, experience: 100 },
        detail: format!("level {} exp {}", p.level, p.experience),
    });

    let cap = 35;
    let capped_policy = ProgressionPolicy {
        max_level: Some(cap),
        ..policy.clone()
    };
    let mut capped = GuildProgress::new();
    apply_experience(&mut capped, u32::MAX, &capped_policy);
    let again = apply_experience(&mut capped, 5_000, &capped_policy);
    results.push(TestResult {
        name: "ledger_cap_holds".into(),
        passed: capped.level == cap && capped.experience < threshold && again.absorbed == 0,
        detail: format!(
            "level {} exp {}, {} absorbed at cap",
            capped.level, capped.experience, again.absorbed
        ),
    });

    results
}

// ── 4. Level Adjustments ────────────────────────────────────────────────

fn validate_level_adjustments(policy: &ProgressionPolicy, rng: &mut StdRng) -> Vec<TestResult> {
    println!("--- Level Adjustments ---");
    let mut results = Vec::new();

    let mut mismatches = 0;
    for _ in 0..2_000 {
        let start = GuildProgress {
            level: rng.gen_range(1..=60),
            experience: rng.gen_range(0..policy.threshold_for(1)),
        };
        let n = rng.gen_range(1..=20);
        let mut p = start;
        add_levels(&mut p, n, policy);
        remove_levels(&mut p, n);
        if p != start {
            mismatches += 1;
        }
    }
    results.push(TestResult {
        name: "levels_round_trip".into(),
        passed: mismatches == 0,
        detail: format!("{} of 2000 add/remove pairs drifted", mismatches),
    });

    let mut p = GuildProgress {
        level: 3,
        experience: 42,
    };
    remove_levels(&mut p, 1_000);
    results.push(TestResult {
        name: "levels_floor_at_one".into(),
        passed: p == GuildProgress { level: 1, experience: 42 },
        detail: format!("level {} exp {}", p.level, p.experience),
    });

    results
}

// ── 5. Perk Consistency ─────────────────────────────────────────────────

fn validate_perk_consistency(
    policy: &ProgressionPolicy,
    registry: &PerkRegistry,
    rng: &mut StdRng,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Perk Consistency ---");
    let mut results = Vec::new();

    let hooks = HookTable::with_progression(policy, registry);
    let ledger = ExperienceLedger::new(policy.clone());
    let console = AdminConsole::new(policy.clone());
    let mut world = MemoryWorld::new();
    let guilds: Vec<GuildId> = ["Ash", "Briar", "Cinder"]
        .iter()
        .map(|n| world.create_guild(n))
        .collect();
    let players: Vec<PlayerId> = (0..12)
        .map(|i| world.create_player(&format!("P{}", i)))
        .collect();

    let steps = 3_000;
    let mut violations = Vec::new();
    let mut op_counts = [0u32; 8];
    for step in 0..steps {
        let p = players[rng.gen_range(0..players.len())];
        let op = rng.gen_range(0..8);
        op_counts[op] += 1;
        match op {
            0 => {
                if !world.player_state(p).online {
                    world.set_online(p, true);
                    hooks.player_login(&mut world, p);
                }
            }
            1 => {
                if world.player_state(p).online {
                    hooks.player_logout(&mut world, p);
                    world.set_online(p, false);
                }
            }
            2 => {
                if world.player_guild(p).is_none() {
                    let g = guilds[rng.gen_range(0..guilds.len())];
                    world.set_player_guild(p, Some(g));
                    hooks.member_added(&mut world, g, p);
                }
            }
            3 => {
                if let Some(g) = world.player_guild(p) {
                    world.set_player_guild(p, None);
                    let reason = if rng.gen_bool(0.5) {
                        RemovalReason::Left
                    } else {
                        RemovalReason::Kicked
                    };
                    hooks.member_removed(&mut world, g, p, reason);
                }
            }
            4 => hooks.arena_won(&mut world, p),
            5 => {
                let amount = rng.gen_range(0..4_000);
                if let Some(g) = world.player_guild(p) {
                    ledger.add_experience(&mut world, &hooks, g, amount, Some(p));
                }
            }
            6 => {
                let session = CommandSession {
                    privilege: Privilege::GameMaster,
                    own_player: Some(p),
                    selected_player: None,
                };
                let line = if rng.gen_bool(0.5) {
                    format!("add-level {}", rng.gen_range(1..4))
                } else {
                    format!("remove-level {}", rng.gen_range(1..4))
                };
                let _ = console.run(&session, &mut world, &hooks, &line);
            }
            _ => hooks.battleground_won(&mut world, p),
        }

        for &q in &players {
            let expected = match world.player_guild(q) {
                Some(g) if world.player_state(q).online => {
                    registry.effects_for(world.progress(g).level)
                }
                _ => PerkSet::new(),
            };
            if world.perks_of(q) != expected {
                violations.push(format!("step {} op {} player {}", step, op, q));
            }
        }
    }

    results.push(TestResult {
        name: "perks_match_guild_level".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("{} random transitions, all members consistent", steps)
        } else {
            format!(
                "{} violations, first: {}",
                violations.len(),
                violations[0]
            )
        },
    });

    if verbose {
        println!("  Op mix: {:?}", op_counts);
        for &g in &guilds {
            let progress = world.progress(g);
            println!(
                "    guild {}: level {} exp {} members {}",
                g,
                progress.level,
                progress.experience,
                world.members(g).len()
            );
        }
    }

    results
}

// ── 6. Rewards ──────────────────────────────────────────────────────────

fn validate_rewards(policy: &ProgressionPolicy, registry: &PerkRegistry) -> Vec<TestResult> {
    println!("--- Rewards ---");
    let mut results = Vec::new();

    let hooks = HookTable::with_progression(policy, registry);
    let mut world = MemoryWorld::new();
    let g = world.create_guild("Victors");
    let member = world.create_player("Member");
    let nomad = world.create_player("Nomad");
    world.set_player_guild(member, Some(g));

    hooks.arena_won(&mut world, member);
    hooks.battleground_won(&mut world, member);
    hooks.group_activity_completed(&mut world, member);
    let expected = policy.rewards.arena_won
        + policy.rewards.battleground_won
        + policy.rewards.group_activity_completed;
    results.push(TestResult {
        name: "rewards_event_amounts".into(),
        passed: world.progress(g).experience == expected,
        detail: format!("{} exp after one of each event", world.progress(g).experience),
    });

    let notices_before = world.guild(g).map_or(0, |g| g.notices.len());
    hooks.battleground_won(&mut world, nomad);
    let notices_after = world.guild(g).map_or(0, |g| g.notices.len());
    results.push(TestResult {
        name: "rewards_guildless_noop".into(),
        passed: notices_before == notices_after && world.progress(g).experience == expected,
        detail: "guildless battleground win changed nothing".into(),
    });

    let doubled = hooks.personal_experience_gain(&world, member, 100, ExperienceSource::Kill);
    let plain = hooks.personal_experience_gain(&world, nomad, 100, ExperienceSource::Kill);
    results.push(TestResult {
        name: "rewards_personal_multiplier".into(),
        passed: doubled == 100 * policy.personal_xp.multiplier && plain == 100,
        detail: format!("member {} / guildless {}", doubled, plain),
    });

    results
}

// ── 7. Admin Commands ───────────────────────────────────────────────────

fn validate_admin_commands(policy: &ProgressionPolicy, registry: &PerkRegistry) -> Vec<TestResult> {
    println!("--- Admin Commands ---");
    let mut results = Vec::new();

    let hooks = HookTable::with_progression(policy, registry);
    let console = AdminConsole::new(policy.clone());
    let mut world = MemoryWorld::new();
    let g = world.create_guild("Stewards");
    let gm = world.create_player("Steward");
    world.set_player_guild(gm, Some(g));
    world.set_online(gm, true);
    hooks.member_added(&mut world, g, gm);
    world.set_guild_progress(g, GuildProgress { level: 2, experience: 0 });

    let session = CommandSession {
        privilege: Privilege::GameMaster,
        own_player: Some(gm),
        selected_player: None,
    };

    let repair = console.run(&session, &mut world, &hooks, "repair");
    let repairs = world.player(gm).map_or(0, |p| p.repairs);
    results.push(TestResult {
        name: "admin_repair_gate".into(),
        passed: matches!(repair, Err(CommandError::ThresholdNotMet { .. })) && repairs == 0,
        detail: match &repair {
            Ok(_) => "repair unexpectedly succeeded".into(),
            Err(e) => e.to_string(),
        },
    });

    let before = world.progress(g).experience;
    let add = console.run(&session, &mut world, &hooks, "add-experience");
    results.push(TestResult {
        name: "admin_default_amount".into(),
        passed: add.is_ok() && world.progress(g).experience == before + 1,
        detail: format!("{} -> {}", before, world.progress(g).experience),
    });

    let player_session = CommandSession {
        privilege: Privilege::Player,
        ..session
    };
    let denied = console.run(&player_session, &mut world, &hooks, "add-level 10");
    results.push(TestResult {
        name: "admin_privilege_required".into(),
        passed: denied == Err(CommandError::InsufficientPrivilege) && world.progress(g).level == 2,
        detail: "player-level session rejected".into(),
    });

    let progress = console.run(&session, &mut world, &hooks, &format!("progress {}", g));
    results.push(TestResult {
        name: "admin_progress_summary".into(),
        passed: progress
            .as_ref()
            .map(|lines| lines.len() == 2 && lines[0].contains("Stewards"))
            .unwrap_or(false),
        detail: match progress {
            Ok(lines) => lines.join(" | "),
            Err(e) => e.to_string(),
        },
    });

    results
}
