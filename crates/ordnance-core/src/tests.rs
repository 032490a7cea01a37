use glam::DVec3;

use crate::commands::*;
use crate::components::*;
use crate::config::*;
use crate::constants::*;
use crate::enums::*;
use crate::events::*;
use crate::types::*;

#[test]
fn test_weapon_state_serde() {
    let variants = vec![
        WeaponState::Disabled,
        WeaponState::PoweringUp,
        WeaponState::Enabled,
        WeaponState::PoweringDown,
        WeaponState::Locked,
        WeaponState::Standby,
    ];
    for v in variants {
        let json = serde_json::to_string(&v).unwrap();
        let back: WeaponState = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}

#[test]
fn test_fuze_type_serde() {
    let variants = vec![
        FuzeType::None,
        FuzeType::Impact,
        FuzeType::Delay,
        FuzeType::Penetrating,
        FuzeType::Timed,
        FuzeType::Proximity,
        FuzeType::Flak,
    ];
    for v in variants {
        let json = serde_json::to_string(&v).unwrap();
        let back: FuzeType = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}

#[test]
fn test_fuze_classification() {
    assert!(FuzeType::Flak.is_proximity());
    assert!(FuzeType::Flak.is_timed());
    assert!(FuzeType::Proximity.is_proximity());
    assert!(!FuzeType::Proximity.is_timed());
    assert!(!FuzeType::Impact.is_proximity());
}

#[test]
fn test_casing_sources() {
    assert!(ExplosionSourceType::Missile.has_casing());
    assert!(ExplosionSourceType::Rocket.has_casing());
    assert!(!ExplosionSourceType::Bullet.has_casing());
    assert_eq!(ProjectileKind::Rocket.source_type(), ExplosionSourceType::Rocket);
}

#[test]
fn test_blast_target_tagged_json() {
    let target = BlastTarget::Building {
        building: BuildingId(7),
    };
    let json = serde_json::to_string(&target).unwrap();
    assert!(json.contains("\"type\":\"Building\""), "got {json}");
}

#[test]
fn test_combat_event_tagged_json() {
    let event = CombatEvent::ShotFired {
        weapon: WeaponId(3),
        rounds: 2,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"ShotFired\""));
    let back: CombatEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(event, back);
}

// ---- Blast events ----

fn part_target() -> BlastTarget {
    BlastTarget::Part {
        part: PartId(1),
        vessel: VesselId(1),
        hit_point: DVec3::new(1000.0, 0.0, 0.0),
        hit_normal: DVec3::NEG_X,
        intermediate: Vec::new(),
        in_cone: true,
    }
}

#[test]
fn test_fragment_event_targets_part() {
    let event = BlastEvent::positive(
        24.0,
        1_200.0,
        BlastTarget::Fragments {
            part: PartId(4),
            vessel: VesselId(2),
            hit_point: DVec3::new(24.0, 0.0, 0.0),
            cover_armor: 0.0,
        },
    );
    assert_eq!(event.part_id(), Some(PartId(4)));
    assert!((event.time_to_impact - 0.02).abs() < 1e-12);
}

#[test]
fn test_positive_event_timing() {
    let event = BlastEvent::positive(1000.0, 343.0, part_target());
    assert!((event.time_to_impact - 1000.0 / 343.0).abs() < 1e-12);
    assert!(!event.negative_pressure);
}

#[test]
fn test_rebound_event_is_later() {
    let event = BlastEvent::positive(1000.0, 343.0, part_target());
    let rebound = event.rebound(1200.0, 343.0, 1.5);
    assert!(rebound.negative_pressure);
    assert!(rebound.time_to_impact > event.time_to_impact);
    let expected = 2.0 * (1200.0 / 343.0) + 200.0 / 343.0;
    assert!(
        (rebound.time_to_impact - expected).abs() < 1e-9,
        "rebound at {:.3}s, expected {expected:.3}s",
        rebound.time_to_impact
    );
    assert_eq!(rebound.part_id(), Some(PartId(1)));
}

#[test]
fn test_rebound_later_even_at_range_edge() {
    // distance == range: the rebound still trails by twice the crossing time.
    let event = BlastEvent::positive(500.0, 422.75, part_target());
    let rebound = event.rebound(500.0, 422.75, 0.0);
    assert!(rebound.time_to_impact > event.time_to_impact);
}

// ---- Config ----

#[test]
fn test_sim_config_defaults() {
    let config = SimConfig::default();
    assert_eq!(config.seed, 42);
    assert!((config.fixed_dt - DT).abs() < 1e-12);
    assert!((config.blast.propagation_velocity - EXPLOSION_VELOCITY).abs() < 1e-12);
    assert!((config.blast.spall_radius_fraction - 0.10).abs() < 1e-12);
}

#[test]
fn test_sim_config_partial_json() {
    let config = SimConfig::from_json(r#"{ "seed": 7, "blast": { "propagation_velocity": 343.0 } }"#)
        .unwrap();
    assert_eq!(config.seed, 7);
    assert!((config.blast.propagation_velocity - 343.0).abs() < 1e-12);
    assert!((config.blast.rebound_force_fraction - REBOUND_FORCE_FRACTION).abs() < 1e-12);
}

#[test]
fn test_sim_config_invalid_values_fall_back() {
    let config =
        SimConfig::from_json(r#"{ "fixed_dt": -1.0, "blast": { "propagation_velocity": 0.0 } }"#)
            .unwrap();
    assert!((config.fixed_dt - DT).abs() < 1e-12);
    assert!((config.blast.propagation_velocity - EXPLOSION_VELOCITY).abs() < 1e-12);
}

#[test]
fn test_sim_config_malformed_json_is_error() {
    assert!(SimConfig::from_json("{ seed: ").is_err());
}

#[test]
fn test_weapon_config_validation() {
    let config = WeaponConfig::from_json(
        r#"{ "name": "bad", "rounds_per_minute": 0, "barrels": 0, "ammo": { "caliber_mm": -5, "projectiles_per_shot": 0 } }"#,
    )
    .unwrap();
    assert!(config.rounds_per_minute > 0.0);
    assert_eq!(config.barrels, 1);
    assert!(config.ammo.caliber_mm > 0.0);
    assert_eq!(config.ammo.projectiles_per_shot, 1);
}

#[test]
fn test_weapon_time_between_shots() {
    let config = WeaponConfig {
        rounds_per_minute: 600.0,
        barrels: 2,
        ..Default::default()
    };
    assert!((config.time_between_shots() - 0.2).abs() < 1e-12);
    assert_eq!(config.rounds_per_shot(), 2);
}

#[test]
fn test_lifetime_expiry() {
    let mut life = Lifetime {
        time_alive: 0.0,
        time_to_live: 1.0,
    };
    assert!(!life.expired());
    life.time_alive = 1.0;
    assert!(life.expired());
}

#[test]
fn test_sim_time_advance() {
    let mut time = SimTime::default();
    time.advance(DT);
    time.advance(DT);
    assert_eq!(time.tick, 2);
    assert!((time.elapsed_secs - 2.0 * DT).abs() < 1e-12);
}

#[test]
fn test_session_command_parse() {
    let json = r#"{"type":"SetTrigger","weapon":3,"held":true}"#;
    let cmd: SessionCommand = serde_json::from_str(json).unwrap();
    assert!(matches!(
        cmd,
        SessionCommand::SetTrigger {
            weapon: WeaponId(3),
            held: true
        }
    ));
    assert_eq!(cmd.weapon(), Some(WeaponId(3)));

    let arm = r#"{"type":"ArmNuclear","origin":[0.0,0.0,10.0],"config":{"yield_kt":1.0},"source":{"vessel":null,"name":"","weapon":"","team":0}}"#;
    let cmd: SessionCommand = serde_json::from_str(arm).unwrap();
    match cmd {
        SessionCommand::ArmNuclear { config, .. } => {
            assert_eq!(config.yield_kt, 1.0);
            assert_eq!(config.thermal_radius, NuclearConfig::default().thermal_radius);
        }
        other => panic!("expected ArmNuclear, got {other:?}"),
    }
    assert_eq!(
        serde_json::from_str::<SessionCommand>(arm).unwrap().weapon(),
        None
    );
}
