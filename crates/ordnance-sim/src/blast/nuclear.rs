//! Nuclear detonations.
//!
//! Unlike conventional blasts there is no travelling wave: after the fuze
//! delay every part inside the thermal radius is heated at once, and parts
//! with a clear line to the device also take the shock impulse and damage.

use std::collections::BTreeSet;

use glam::DVec3;
use tracing::{debug, trace, warn};

use ordnance_core::components::NuclearBlast;
use ordnance_core::config::NuclearConfig;
use ordnance_core::constants::*;
use ordnance_core::enums::ExplosionSourceType;
use ordnance_core::events::CombatEvent;
use ordnance_core::types::SourceInfo;

use crate::host::{Collider, Host, PhysicsQuery, ScoringLedger};

/// Arm a device at `origin`; it fires `config.delay` seconds after `now`.
pub fn arm<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    config: &NuclearConfig,
    origin: DVec3,
    source: SourceInfo,
    now: f64,
) -> NuclearBlast {
    let density = query.atmosphere_density(origin);
    NuclearBlast {
        origin,
        yield_kt: config.yield_kt.max(0.0),
        thermal_radius: config.thermal_radius.max(0.0),
        fluence: config.fluence.max(0.0),
        detonate_at: now + config.delay.max(0.0),
        detonated: false,
        atmospheric_density: if density.is_finite() { density } else { 0.0 },
        source,
    }
}

/// Peak overpressure (kPa) at `distance`.
pub fn overpressure(distance: f64, atmospheric_density: f64, yield_kt: f64) -> f64 {
    let d = distance.max(NUCLEAR_MIN_DISTANCE);
    (NUCLEAR_IMPULSE_REFERENCE / d).powf(NUCLEAR_IMPULSE_EXPONENT)
        * PSI_TO_KPA
        * atmospheric_density
        * yield_kt.cbrt()
}

/// Shock impulse on a part of `area` m².
pub fn impulse(distance: f64, atmospheric_density: f64, yield_kt: f64, area: f64) -> f64 {
    overpressure(distance, atmospheric_density, yield_kt) * area / 3.0
}

fn radiant_flux(magnitude: f64, distance: f64, area: f64) -> f64 {
    let d = distance.max(NUCLEAR_MIN_DISTANCE);
    magnitude * NUCLEAR_ENERGY_PER_KT / (4.0 * std::f64::consts::PI * d * d) * area / 2.0
}

/// Blast damage to a part of `area` m².
pub fn damage(distance: f64, yield_kt: f64, area: f64) -> f64 {
    radiant_flux(yield_kt, distance, area)
}

/// Skin heating (K) of a part of `area` m².
pub fn thermal_heat(distance: f64, fluence: f64, area: f64) -> f64 {
    radiant_flux(fluence, distance, area)
}

/// Fire the device once its timer has run out.
///
/// Returns true on the tick it detonates. Afterwards the blast is inert.
pub fn tick<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    blast: &mut NuclearBlast,
    host: &mut H,
    ledger: &mut L,
    now: f64,
    events_out: &mut Vec<CombatEvent>,
) -> bool {
    if blast.detonated {
        return false;
    }
    let density = host.atmosphere_density(blast.origin);
    if density.is_finite() {
        blast.atmospheric_density = density;
    }
    if now < blast.detonate_at {
        return false;
    }
    blast.detonated = true;
    debug!(origin = ?blast.origin, yield_kt = blast.yield_kt, "nuclear detonation");
    events_out.push(CombatEvent::NuclearDetonation {
        origin: blast.origin,
        yield_kt: blast.yield_kt,
    });

    let mut parts_seen = BTreeSet::new();
    let mut buildings_seen = BTreeSet::new();
    for collider in host.overlap_sphere(blast.origin, blast.thermal_radius) {
        match collider {
            Collider::Part { part, .. } => {
                if !parts_seen.insert(part) {
                    continue;
                }
                let Some(state) = host.part(part) else {
                    continue;
                };
                if !(state.mass > 0.0) {
                    continue;
                }
                let distance = blast.origin.distance(state.position).max(NUCLEAR_MIN_DISTANCE);
                host.add_skin_heat(part, thermal_heat(distance, blast.fluence, state.area));

                let offset = state.position - blast.origin;
                let in_sight = host
                    .raycast(blast.origin, offset, distance, None)
                    .is_some_and(|hit| matches!(hit.collider, Collider::Part { part: p, .. } if p == part));
                if !in_sight {
                    trace!(part = ?part, "nuclear shock blocked");
                    continue;
                }

                let shock = impulse(distance, blast.atmospheric_density, blast.yield_kt, state.area);
                let mut velocity_change = 0.0;
                if !shock.is_finite() {
                    warn!(part = ?part, distance, density = blast.atmospheric_density, "non-finite nuclear impulse, skipped");
                } else {
                    velocity_change = shock / state.mass;
                    host.apply_velocity_change(
                        part,
                        offset.normalize_or_zero() * velocity_change,
                        state.position,
                    );
                }

                let blast_damage = damage(distance, blast.yield_kt, state.area);
                if !blast_damage.is_finite() {
                    warn!(part = ?part, distance, "non-finite nuclear damage, skipped");
                    continue;
                }
                let taken = host.apply_damage(part, blast_damage, ExplosionSourceType::Missile);
                if let Some(vessel) = host.vessel(state.vessel) {
                    if ledger.register_hit(&blast.source.name, &vessel.name, ExplosionSourceType::Missile) {
                        ledger.register_damage(&blast.source.name, &vessel.name, taken, ExplosionSourceType::Missile);
                    }
                }
                events_out.push(CombatEvent::PartHit {
                    part,
                    damage: taken,
                    velocity_change,
                    negative_pressure: false,
                });
            }
            Collider::Building(building) => {
                if !buildings_seen.insert(building) {
                    continue;
                }
                let Some(state) = host.building(building) else {
                    continue;
                };
                if !state.intact {
                    continue;
                }
                let pressure = overpressure(
                    blast.origin.distance(state.position),
                    blast.atmospheric_density,
                    blast.yield_kt,
                );
                if pressure.is_finite() && pressure > NUCLEAR_DEMOLITION_KPA {
                    host.demolish_building(building);
                    events_out.push(CombatEvent::BuildingDemolished { building });
                }
            }
            Collider::Terrain => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::host::{DamageModel, TallyLedger};
    use ordnance_core::types::TeamId;

    fn device(arena: &Arena, delay: f64) -> NuclearBlast {
        let config = NuclearConfig {
            delay,
            ..NuclearConfig::default()
        };
        arm(arena, &config, DVec3::new(0.0, 0.0, 500.0), SourceInfo::default(), 0.0)
    }

    #[test]
    fn overpressure_fit_at_one_kilometer() {
        // (3311 / 1000)^1.25 · 6.894 · 1.225 · 1
        let p = overpressure(1_000.0, 1.225, 1.0);
        let expected = (3.311f64).powf(1.25) * 6.894 * 1.225;
        assert!((p - expected).abs() < 1e-9, "p = {p:.3}");
    }

    #[test]
    fn fits_floor_distance() {
        assert_eq!(damage(0.0, 1.0, 2.0), damage(1.0, 1.0, 2.0));
        assert!(overpressure(0.0, 1.0, 1.0).is_finite());
    }

    #[test]
    fn waits_for_timer() {
        let mut arena = Arena::new();
        let mut blast = device(&arena, 2.5);
        let mut ledger = TallyLedger::default();
        let mut out = Vec::new();
        assert!(!tick(&mut blast, &mut arena, &mut ledger, 2.0, &mut out));
        assert!(out.is_empty());
        assert!(tick(&mut blast, &mut arena, &mut ledger, 2.5, &mut out));
        assert!(!tick(&mut blast, &mut arena, &mut ledger, 3.0, &mut out), "fires once");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn heats_everything_but_shocks_only_in_sight() {
        let mut arena = Arena::new();
        let (_, shield) = arena.add_single_part_vessel("shield", TeamId(2), DVec3::new(100.0, 0.0, 500.0), 5.0, 10.0, 1e12);
        let (_, hidden) = arena.add_single_part_vessel("hidden", TeamId(2), DVec3::new(200.0, 0.0, 500.0), 5.0, 10.0, 1e12);
        let mut blast = device(&arena, 0.0);
        let mut ledger = TallyLedger::default();
        let mut out = Vec::new();
        tick(&mut blast, &mut arena, &mut ledger, 0.0, &mut out);

        let shield_part = arena.arena_part(shield).unwrap();
        let hidden_part = arena.arena_part(hidden).unwrap();
        assert!(shield_part.skin_temperature > 0.0 && hidden_part.skin_temperature > 0.0);
        assert_eq!(shield_part.impulses.len(), 1);
        assert!(hidden_part.impulses.is_empty());
        assert!(arena.part(shield).unwrap().health < 1e12);
        assert_eq!(arena.part(hidden).unwrap().health, 1e12);
    }

    #[test]
    fn demolishes_nearby_buildings() {
        let mut arena = Arena::new();
        let near = arena.add_building(DVec3::new(100.0, 0.0, 500.0), DVec3::splat(10.0), 1e9);
        let far = arena.add_building(DVec3::new(0.0, 700.0, 500.0), DVec3::splat(10.0), 1e9);
        let mut blast = device(&arena, 0.0);
        let mut ledger = TallyLedger::default();
        let mut out = Vec::new();
        tick(&mut blast, &mut arena, &mut ledger, 0.0, &mut out);
        // About 1.12 kg/m³ at 500 m: 140 kPa only inside ~145 m for 0.05 kt.
        assert!(!arena.arena_building(near).unwrap().intact);
        assert!(arena.arena_building(far).unwrap().intact);
    }
}
