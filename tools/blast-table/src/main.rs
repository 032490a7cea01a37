//! blast-table: blast scaling tables and a headless demo engagement.
//!
//! Usage:
//!   blast-table table --tnt 0.5,5,50
//!   blast-table engage --distance 800 --seconds 5 --seed 7 --weapon autocannon.json

use std::path::PathBuf;
use std::process;

use glam::DVec3;
use tracing::info;

use ordnance_core::commands::SessionCommand;
use ordnance_core::config::{ExplosiveConfig, SimConfig, WeaponConfig};
use ordnance_core::enums::FuzeType;
use ordnance_core::events::CombatEvent;
use ordnance_core::types::TeamId;
use ordnance_sim::arena::Arena;
use ordnance_sim::blast::physics::{
    blast_max_time, blast_range, clamp_range, incident_impulse, positive_phase_time, scaled_distance,
};
use ordnance_sim::host::TallyLedger;
use ordnance_sim::CombatSession;

const DEFAULT_CHARGES: [f64; 6] = [0.1, 0.5, 1.0, 5.0, 20.0, 100.0];

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "table" => cmd_table(&args[2..]),
        "engage" => cmd_engage(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "blast-table: ORDNANCE blast and engagement tool\n\
         \n\
         Commands:\n\
         \n\
         table     Print blast range, arrival time and impulse per charge\n\
         \n\
           --tnt <kg,kg,...>  TNT-equivalent masses (default: 0.1,0.5,1,5,20,100)\n\
         \n\
         engage    Run a headless gunnery engagement and summarise it\n\
         \n\
           --distance <m>     Range to the target (default: 800)\n\
           --seconds <s>      Session length (default: 5)\n\
           --seed <n>         RNG seed (default: 42)\n\
           --weapon <path>    Weapon definition JSON (default: built-in HE autocannon)\n"
    );
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_or<T: std::str::FromStr>(args: &[String], name: &str, default: T) -> T {
    match flag(args, name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("Error: invalid value for {name}: {raw}");
            process::exit(1);
        }),
        None => default,
    }
}

// --- Table command ---

fn cmd_table(args: &[String]) {
    let charges: Vec<f64> = match flag(args, "--tnt") {
        Some(list) => list
            .split(',')
            .map(|s| {
                s.trim().parse().unwrap_or_else(|_| {
                    eprintln!("Error: invalid charge mass: {s}");
                    process::exit(1);
                })
            })
            .collect(),
        None => DEFAULT_CHARGES.to_vec(),
    };

    println!(
        "{:>10} {:>10} {:>10} {:>14} {:>14} {:>14}",
        "tnt_kg", "range_m", "front_s", "i(r/4) kPa·ms", "i(r/2) kPa·ms", "t+(r/2) ms"
    );
    for tnt in charges.into_iter().filter(|w| *w > 0.0) {
        let range = blast_range(tnt);
        let at = |fraction: f64| {
            let d = clamp_range(tnt, range * fraction);
            scaled_distance(tnt, d)
        };
        println!(
            "{:>10.2} {:>10.1} {:>10.3} {:>14.1} {:>14.1} {:>14.2}",
            tnt,
            range,
            blast_max_time(tnt),
            incident_impulse(at(0.25), tnt),
            incident_impulse(at(0.5), tnt),
            positive_phase_time(at(0.5), tnt),
        );
    }
}

// --- Engage command ---

fn default_weapon() -> WeaponConfig {
    let mut config = WeaponConfig {
        name: "40mm HE".to_string(),
        rounds_per_minute: 240.0,
        muzzle_velocity: 1_000.0,
        max_deviation_deg: 0.3,
        ..Default::default()
    };
    config.ammo.name = "40x365 HE".to_string();
    config.ammo.caliber_mm = 40.0;
    config.ammo.mass_kg = 0.96;
    config.ammo.explosive = Some(ExplosiveConfig {
        tnt_mass: 0.12,
        fuze: FuzeType::Proximity,
        detonation_range: 6.0,
        arming_time: 0.1,
        ..Default::default()
    });
    config
}

fn load_weapon(path: &PathBuf) -> WeaponConfig {
    let json = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    WeaponConfig::from_json(&json).unwrap_or_else(|e| {
        eprintln!("Error parsing {}: {e}", path.display());
        process::exit(1);
    })
}

fn cmd_engage(args: &[String]) {
    let distance: f64 = parse_or(args, "--distance", 800.0);
    let seconds: f64 = parse_or(args, "--seconds", 5.0);
    let seed: u64 = parse_or(args, "--seed", 42);
    let weapon_config = match flag(args, "--weapon") {
        Some(path) => load_weapon(&PathBuf::from(path)),
        None => default_weapon(),
    };

    let mut arena = Arena::new();
    let (ship, _) = arena.add_single_part_vessel("gunboat", TeamId(1), DVec3::new(0.0, 0.0, 20.0), 6.0, 50_000.0, 2e4);
    let target = arena.add_vessel("drone", TeamId(2), DVec3::new(0.0, 60.0, 0.0));
    for offset in [-2.0, 0.0, 2.0] {
        arena.add_part(
            target,
            DVec3::new(distance, offset, 300.0),
            1.5,
            400.0,
            1_500.0,
            0.0,
        );
    }

    let config = SimConfig {
        seed,
        ..Default::default()
    };
    let mut session = CombatSession::new(config, arena, TallyLedger::default());
    let weapon = session.add_weapon(weapon_config, ship, DVec3::new(0.0, 0.0, 6.5));
    session.queue_commands([
        SessionCommand::EnableWeapon { weapon },
        SessionCommand::TrackTarget {
            weapon,
            target: Some(target),
        },
        SessionCommand::SetTrigger { weapon, held: true },
    ]);
    info!(distance, seconds, seed, "engagement started");

    let dt = session.config().fixed_dt;
    let mut shots = 0u32;
    let mut detonations = 0u32;
    let mut hits = 0u32;
    let mut fragment_hits = 0u32;
    let mut elapsed = 0.0;
    while elapsed < seconds {
        session.host_mut().step(dt);
        for event in session.tick() {
            match event {
                CombatEvent::ShotFired { rounds, .. } => shots += rounds,
                CombatEvent::Detonation { .. } => detonations += 1,
                CombatEvent::PartHit {
                    negative_pressure: false,
                    damage,
                    ..
                } if damage > 0.0 => hits += 1,
                CombatEvent::FragmentHit { damage, .. } if damage > 0.0 => fragment_hits += 1,
                _ => {}
            }
        }
        elapsed += dt;
    }

    let damage = session.ledger().damage_dealt("gunboat", "drone");
    let in_flight = session.registry().in_use();
    info!(shots, detonations, hits, fragment_hits, damage, in_flight, "engagement finished");
    println!("rounds fired:   {shots}");
    println!("detonations:    {detonations}");
    println!("damaging hits:  {hits}");
    println!("fragment hits:  {fragment_hits}");
    println!("damage dealt:   {damage:.1}");
    println!("still in pools: {in_flight}");
    session.teardown();
}
