//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Firing state of a weapon.
///
/// `Disabled ⇄ PoweringUp → Enabled ⇄ PoweringDown`, with `Standby` and
/// `Locked` as overlay states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponState {
    #[default]
    Disabled,
    PoweringUp,
    Enabled,
    PoweringDown,
    /// Held by an external controller; transitions are refused.
    Locked,
    /// Deployed but not firing.
    Standby,
}

/// Detonation trigger policy for an explosive payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuzeType {
    /// Inert; never detonates.
    #[default]
    None,
    /// Detonates on the first hit.
    Impact,
    /// Detonates a short distance past the first hit.
    Delay,
    /// Detonates after penetrating armor.
    Penetrating,
    /// Detonates when its flight timer runs out.
    Timed,
    /// Detonates within detonation range of a non-friendly vessel.
    Proximity,
    /// Proximity fuze with a timed fallback.
    Flak,
}

impl FuzeType {
    /// Whether this fuze checks nearby vessels before each move.
    pub fn is_proximity(self) -> bool {
        matches!(self, FuzeType::Proximity | FuzeType::Flak)
    }

    /// Whether this fuze can fire at end of flight time.
    pub fn is_timed(self) -> bool {
        matches!(self, FuzeType::Timed | FuzeType::Flak)
    }
}

/// Explosive filler of a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillerType {
    #[default]
    Standard,
    Shaped,
}

/// Drag model applied to a bullet in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletDragType {
    None,
    #[default]
    AnalyticEstimate,
    NumericalIntegration,
}

/// Blast shape of a warhead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarheadType {
    /// Spherical blast, cone set by the angle of effect.
    #[default]
    Standard,
    /// Narrow forward cone.
    ShapedCharge,
    /// Ring around the flight axis.
    ContinuousRod,
}

/// What caused an explosion; selects the scoring bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplosionSourceType {
    Bullet,
    Rocket,
    Missile,
    BattleDamage,
    #[default]
    Other,
}

impl ExplosionSourceType {
    /// Casing parts of the firing vessel do not shield their own blast.
    pub fn has_casing(self) -> bool {
        matches!(self, ExplosionSourceType::Missile | ExplosionSourceType::Rocket)
    }
}

/// Lifecycle phase of an explosion instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionPhase {
    #[default]
    Inactive,
    /// Events computed, none executed yet.
    Armed,
    /// Events draining.
    Detonating,
    /// Queue empty and past the display duration.
    Expired,
}

/// Refinement stage of the ballistic integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStage {
    #[default]
    Normal,
    Refining,
    Final,
}

/// Kind of live projectile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Bullet,
    Rocket,
}

impl ProjectileKind {
    pub fn source_type(self) -> ExplosionSourceType {
        match self {
            ProjectileKind::Bullet => ExplosionSourceType::Bullet,
            ProjectileKind::Rocket => ExplosionSourceType::Rocket,
        }
    }
}

/// Why a projectile left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    /// Time to live ran out.
    Expired,
    /// Hit a part, building, terrain or water.
    Impact,
    /// Fuze fired.
    Detonated,
    /// Removed from outside (point defense, scene teardown).
    Killed,
}

/// Result of one firing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireOutcome {
    /// Projectiles spawned.
    Fired { rounds: u32 },
    NotReady,
    Overheated,
    Reloading,
    Charging,
    NoAmmo,
    PointingAtSelf,
    /// Another weapon holds the ripple or exclusivity token.
    NotOurTurn,
    NotEnabled,
    UnsafeFriendly,
}

impl FireOutcome {
    pub fn fired(self) -> bool {
        matches!(self, FireOutcome::Fired { .. })
    }
}
