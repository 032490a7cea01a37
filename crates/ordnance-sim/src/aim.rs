//! Lead solving and friendly-fire checks.

use glam::DVec3;
use tracing::trace;

use ordnance_core::constants::*;
use ordnance_core::types::{TargetKinematics, VesselId};

use crate::geometry::angle_deg;
use crate::host::PhysicsQuery;
use crate::prediction::{closest_time_to_cpa, predict_position};
use crate::trajectory::{simulate_closest_approach, TrajectoryParams};

/// A firing solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimSolution {
    /// Where to point the barrel.
    pub aim_point: DVec3,
    /// Unit firing direction.
    pub direction: DVec3,
    /// Predicted flight time to the target.
    pub time_to_target: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Shooter state for a lead solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shooter {
    pub muzzle: DVec3,
    pub velocity: DVec3,
    pub muzzle_speed: f64,
    /// Whether the round falls under gravity.
    pub bullet_drop: bool,
    pub max_range: f64,
    pub vessel: Option<VesselId>,
}

/// Iteratively solve for the aim point that puts a round on `target`.
///
/// Each pass points at the latest aim point, finds when a round on that
/// line passes the target, and moves the aim point to where the target will
/// be then, raised by the gravity drop and shifted back by the shooter's own
/// velocity. Stops after the direction settles below a degree. Long, curved
/// shots get a final correction from a simulated trajectory.
pub fn lead_solution<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    shooter: &Shooter,
    target: &TargetKinematics,
) -> AimSolution {
    let gravity = if shooter.bullet_drop {
        query.gravity_at(shooter.muzzle)
    } else {
        DVec3::ZERO
    };
    let speed = shooter.muzzle_speed.max(1.0);
    let max_time = shooter.max_range / speed;

    let mut aim_point = target.position;
    let mut direction = (aim_point - shooter.muzzle).normalize_or_zero();
    let mut time_to_target = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < AIM_MAX_ITERATIONS {
        iterations += 1;
        let round_velocity = shooter.velocity + direction * speed;
        time_to_target = closest_time_to_cpa(
            target.position - shooter.muzzle,
            target.velocity - round_velocity,
            target.acceleration - gravity,
            max_time,
        );
        aim_point = predict_position(target.position, target.velocity, target.acceleration, time_to_target)
            - 0.5 * gravity * time_to_target * time_to_target
            - shooter.velocity * time_to_target;
        let next = (aim_point - shooter.muzzle).normalize_or_zero();
        let change = angle_deg(direction, next);
        direction = next;
        if change < AIM_CONVERGENCE_DEG {
            converged = true;
            break;
        }
    }

    if time_to_target * gravity.length() > AIM_SIM_CORRECTION_THRESHOLD {
        let params = TrajectoryParams {
            ignore_vessel: shooter.vessel,
            ..TrajectoryParams::new(shooter.max_range * 1.5, time_to_target * 2.0, DT * 4.0)
        };
        let approach = simulate_closest_approach(
            query,
            shooter.muzzle,
            shooter.velocity + direction * speed,
            target,
            &params,
        );
        let correction = approach.target_position - approach.position;
        trace!(correction = correction.length(), "aim corrected by simulation");
        aim_point += correction;
        direction = (aim_point - shooter.muzzle).normalize_or_zero();
        time_to_target = approach.elapsed;
    }

    AimSolution {
        aim_point,
        direction,
        time_to_target,
        iterations,
        converged,
    }
}

/// A friendly vessel that a shot must not endanger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FriendlyContact {
    pub kinematics: TargetKinematics,
    pub radius: f64,
}

/// True when a round fired from `muzzle` at `round_velocity` clears every friendly.
///
/// The tolerance around each friendly grows with range by twice the weapon's
/// deviation. Friendlies whose closest approach is now (behind the muzzle or
/// opening) are ignored.
pub fn shot_clears_friendlies(
    muzzle: DVec3,
    round_velocity: DVec3,
    round_acceleration: DVec3,
    max_range: f64,
    max_deviation_deg: f64,
    friendlies: &[FriendlyContact],
) -> bool {
    let speed = round_velocity.length();
    if speed <= 0.0 {
        return true;
    }
    let max_time = max_range / speed;
    friendlies.iter().all(|friendly| {
        let rel_pos = friendly.kinematics.position - muzzle;
        let rel_vel = friendly.kinematics.velocity - round_velocity;
        let rel_acc = friendly.kinematics.acceleration - round_acceleration;
        let t = closest_time_to_cpa(rel_pos, rel_vel, rel_acc, max_time);
        if t == 0.0 {
            return true;
        }
        let miss_sq = predict_position(rel_pos, rel_vel, rel_acc, t).length_squared();
        let tolerance = friendly.radius + rel_pos.length() * max_deviation_deg.to_radians();
        miss_sq >= tolerance * tolerance
    })
}
