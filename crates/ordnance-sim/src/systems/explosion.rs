//! Explosion system: spawns blast entities and drains their event queues.

use glam::DVec3;
use hecs::{Entity, World};

use ordnance_core::components::{Explosion, NuclearBlast};
use ordnance_core::config::{BlastConfig, NuclearConfig};
use ordnance_core::constants::*;
use ordnance_core::enums::ExplosionPhase;
use ordnance_core::events::CombatEvent;
use ordnance_core::types::SourceInfo;

use super::cleanup;
use crate::blast::{self, nuclear, Detonation};
use crate::host::{DamageModel, Host, PhysicsQuery, ScoringLedger};
use crate::pool::Registry;

/// Detonate a charge and spawn its explosion entity.
pub fn spawn<H: PhysicsQuery + DamageModel + ?Sized>(
    world: &mut World,
    host: &H,
    registry: &mut Registry,
    config: &BlastConfig,
    detonation: &Detonation,
    now: f64,
    events: &mut Vec<CombatEvent>,
) -> Entity {
    let explosion = blast::detonate(host, detonation, config, now);
    events.push(CombatEvent::Detonation {
        origin: explosion.origin,
        tnt_mass: explosion.tnt_mass,
        range: explosion.range,
        source_type: explosion.source_type,
        events: explosion.queue.len(),
    });
    let slot = registry.acquire(DEFAULT_EXPLOSION_MODEL, DEFAULT_EXPLOSION_MODEL);
    world.spawn((explosion, slot))
}

/// Arm a nuclear device and spawn its entity.
pub fn spawn_nuclear<Q: PhysicsQuery + ?Sized>(
    world: &mut World,
    query: &Q,
    registry: &mut Registry,
    config: &NuclearConfig,
    origin: DVec3,
    source: SourceInfo,
    now: f64,
) -> Entity {
    let device = nuclear::arm(query, config, origin, source, now);
    let slot = registry.acquire(DEFAULT_EXPLOSION_MODEL, DEFAULT_EXPLOSION_MODEL);
    world.spawn((device, slot))
}

/// Drain due blast events and release finished explosions.
#[allow(clippy::too_many_arguments)]
pub fn run<H: Host + ?Sized, L: ScoringLedger + ?Sized>(
    world: &mut World,
    host: &mut H,
    ledger: &mut L,
    registry: &mut Registry,
    config: &BlastConfig,
    now: f64,
    events: &mut Vec<CombatEvent>,
    despawn_buffer: &mut Vec<Entity>,
) {
    let mut finished = Vec::new();

    for (entity, explosion) in world.query_mut::<&mut Explosion>() {
        let phase = blast::explosion::tick(explosion, host, ledger, config, now, events);
        if phase == ExplosionPhase::Expired {
            explosion.phase = ExplosionPhase::Inactive;
            finished.push(entity);
        }
    }

    for (entity, device) in world.query_mut::<&mut NuclearBlast>() {
        nuclear::tick(device, host, ledger, now, events);
        if device.detonated {
            finished.push(entity);
        }
    }

    for entity in finished {
        cleanup::release_effect(world, registry, entity, despawn_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::host::TallyLedger;
    use ordnance_core::enums::ExplosionSourceType;
    use ordnance_core::types::TeamId;

    #[test]
    fn explosion_lives_until_drained_and_displayed() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        arena.add_single_part_vessel("foe", TeamId(2), DVec3::new(20.0, 0.0, 100.0), 1.0, 2.0, 1e6);
        let config = BlastConfig::default();
        let mut events = Vec::new();
        let detonation = Detonation::new(DVec3::new(0.0, 0.0, 100.0), 10.0, ExplosionSourceType::Other, SourceInfo::default());
        let e = spawn(&mut world, &arena, &mut registry, &config, &detonation, 0.0, &mut events);
        let max_time = world.get::<&Explosion>(e).unwrap().max_time;
        assert_eq!(registry.in_use(), 1);

        let mut ledger = TallyLedger::default();
        let mut despawn = Vec::new();
        let mut now = 0.0;
        while world.contains(e) && now < 10.0 {
            run(&mut world, &mut arena, &mut ledger, &mut registry, &config, now, &mut events, &mut despawn);
            cleanup::run(&mut world, &mut despawn);
            now += DT;
        }
        assert!(!world.contains(e), "explosion never expired");
        assert!(now > max_time, "expired at {now:.2}s before display time {max_time:.2}s");
        assert_eq!(registry.in_use(), 0);
        let hits = events.iter().filter(|e| matches!(e, CombatEvent::PartHit { .. })).count();
        assert_eq!(hits, 2, "positive hit and rebound");
    }

    #[test]
    fn nuclear_device_released_after_firing() {
        let mut world = World::new();
        let mut registry = Registry::new();
        let mut arena = Arena::new();
        let config = NuclearConfig { delay: 0.1, ..NuclearConfig::default() };
        let e = spawn_nuclear(&mut world, &arena, &mut registry, &config, DVec3::new(0.0, 0.0, 1_000.0), SourceInfo::default(), 0.0);
        let mut ledger = TallyLedger::default();
        let mut events = Vec::new();
        let mut despawn = Vec::new();
        run(&mut world, &mut arena, &mut ledger, &mut registry, &BlastConfig::default(), 0.0, &mut events, &mut despawn);
        assert!(despawn.is_empty());
        run(&mut world, &mut arena, &mut ledger, &mut registry, &BlastConfig::default(), 0.1, &mut events, &mut despawn);
        assert_eq!(despawn, vec![e]);
        assert!(matches!(events[0], CombatEvent::NuclearDetonation { .. }));
    }
}
