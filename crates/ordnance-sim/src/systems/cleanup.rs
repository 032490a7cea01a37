//! Cleanup system: returns pool slots and despawns released entities.
//!
//! Every way a projectile stops (impact, timeout, detonation, kill) goes
//! through `release_projectile`, so each slot is returned exactly once.

use glam::DVec3;
use hecs::{Entity, World};
use tracing::{error, trace};

use ordnance_core::components::{PoolSlot, Projectile};
use ordnance_core::enums::ReleaseReason;
use ordnance_core::error::{OrdnanceError, Result};
use ordnance_core::events::CombatEvent;

use crate::pool::Registry;

/// Return a projectile's slot and queue the entity for despawn.
pub fn release_projectile(
    world: &World,
    registry: &mut Registry,
    entity: Entity,
    reason: ReleaseReason,
    position: DVec3,
    events: &mut Vec<CombatEvent>,
    despawn_buffer: &mut Vec<Entity>,
) -> Result<()> {
    let (kind, slot) = match (world.get::<&Projectile>(entity), world.get::<&PoolSlot>(entity)) {
        (Ok(p), Ok(s)) => (p.kind, (*s).clone()),
        _ => {
            return Err(OrdnanceError::UseAfterRelease {
                pool: "projectile".to_string(),
                slot: entity.id() as usize,
            })
        }
    };
    registry.release(&slot)?;
    trace!(entity = ?entity, ?reason, "projectile released");
    events.push(CombatEvent::ProjectileReleased {
        kind,
        reason,
        position,
    });
    despawn_buffer.push(entity);
    Ok(())
}

/// Return an explosion's slot and queue the entity for despawn.
pub fn release_effect(world: &World, registry: &mut Registry, entity: Entity, despawn_buffer: &mut Vec<Entity>) {
    if let Ok(slot) = world.get::<&PoolSlot>(entity) {
        if let Err(err) = registry.release(&slot) {
            error!(%err, entity = ?entity, "effect release failed");
        }
    }
    despawn_buffer.push(entity);
}

/// Despawn everything released this tick.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) {
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}
