//! ECS systems that operate on the session world each tick.
//!
//! Systems are free functions over `&mut World` plus whatever host, ledger
//! or pool state they touch. They hold no state of their own; everything a
//! projectile or explosion knows lives in its components.

pub mod cleanup;
pub mod explosion;
pub mod fuze;
pub mod projectile;
pub mod weapon;

use glam::DVec3;
use hecs::Entity;

use ordnance_core::enums::ReleaseReason;

/// A projectile that stops flying this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Termination {
    pub entity: Entity,
    pub reason: ReleaseReason,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Set off the payload at `position`.
    pub detonate: bool,
}

impl Termination {
    pub fn new(entity: Entity, reason: ReleaseReason, position: DVec3, velocity: DVec3) -> Self {
        Self {
            entity,
            reason,
            position,
            velocity,
            detonate: false,
        }
    }

    pub fn detonating(mut self, detonate: bool) -> Self {
        self.detonate = detonate;
        self
    }
}

/// Whether `entity` already has a termination queued.
pub(crate) fn is_terminated(terminations: &[Termination], entity: Entity) -> bool {
    terminations.iter().any(|t| t.entity == entity)
}
