//! Bullet drag and flight-time bookkeeping.
//!
//! Drag uses the closed-form solution of `dv/dt = -½ ρ v² / BC` rather than
//! per-step integration, so the speed at any time since the last adjustment
//! is `v0 · 2BC / (t v0 ρ + 2BC)`.

use glam::DVec3;

use ordnance_core::components::Projectile;
use ordnance_core::constants::*;
use ordnance_core::enums::BulletDragType;

/// Ballistic coefficient (kg/m²) from round mass (kg) and caliber (mm).
///
/// Never zero or negative.
pub fn ballistic_coefficient(mass_kg: f64, caliber_mm: f64) -> f64 {
    let area_m2 = std::f64::consts::PI * 0.25 * caliber_mm * caliber_mm / 1.0e6;
    let bc = mass_kg / (area_m2 * BULLET_DRAG_COEFFICIENT);
    if bc.is_finite() && bc > MIN_BALLISTIC_COEFFICIENT {
        bc
    } else {
        MIN_BALLISTIC_COEFFICIENT
    }
}

/// Fraction of the reference speed left after `elapsed` seconds in a medium of `density`.
pub fn analytic_drag_factor(
    ballistic_coefficient: f64,
    reference_speed: f64,
    elapsed: f64,
    density: f64,
) -> f64 {
    let bc = ballistic_coefficient.max(MIN_BALLISTIC_COEFFICIENT);
    let factor = 2.0 * bc / (elapsed.max(0.0) * reference_speed.max(0.0) * density.max(0.0) + 2.0 * bc);
    if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// One explicit Euler drag step.
pub fn numerical_drag_step(velocity: DVec3, density: f64, ballistic_coefficient: f64, dt: f64) -> DVec3 {
    let bc = ballistic_coefficient.max(MIN_BALLISTIC_COEFFICIENT);
    let drag = 0.5 * density * velocity.length() * velocity / bc;
    let next = velocity - drag * dt;
    // Drag never reverses the flight direction.
    if next.dot(velocity) <= 0.0 {
        DVec3::ZERO
    } else {
        next
    }
}

/// Density a projectile flies through.
pub fn medium_density(projectile: &Projectile, air_density: f64) -> f64 {
    if projectile.underwater {
        SEA_WATER_DENSITY
    } else {
        air_density
    }
}

/// Velocity corrected for drag accumulated since the last adjustment.
pub fn drag_adjusted_velocity(projectile: &Projectile, velocity: DVec3, air_density: f64) -> DVec3 {
    match projectile.drag_type {
        BulletDragType::None | BulletDragType::NumericalIntegration => velocity,
        BulletDragType::AnalyticEstimate => {
            velocity
                * analytic_drag_factor(
                    projectile.ballistic_coefficient,
                    projectile.reference_speed,
                    projectile.time_since_speed_update,
                    medium_density(projectile, air_density),
                )
        }
    }
}

/// Seconds a round may fly: the longer of targeting and effective range,
/// at muzzle velocity, plus a margin. Always positive and finite.
pub fn time_to_live(max_targeting_range: f64, max_effective_distance: f64, muzzle_velocity: f64) -> f64 {
    let range = max_targeting_range.max(max_effective_distance);
    let ttl = range / muzzle_velocity * TTL_MARGIN;
    if ttl.is_finite() && ttl > 0.0 {
        ttl
    } else {
        DT
    }
}
