//! Unguided rocket flight.
//!
//! A rocket is integrated with the same leap-frog scheme as a bullet, plus
//! thrust along its pointing direction while the motor burns. The pointing
//! direction weathercocks toward the velocity vector, faster in dense air
//! and later in the burn. Once the motor is out the rest of the flight is
//! plain ballistics, handed to `simulate_closest_approach`.

use glam::DVec3;

use ordnance_core::components::{Kinematics, RocketMotor};
use ordnance_core::config::RocketConfig;
use ordnance_core::constants::*;
use ordnance_core::types::{TargetKinematics, VesselId};

use crate::geometry::rotate_towards;
use crate::host::{PhysicsQuery, RayHit};
use crate::trajectory::{simulate_closest_approach, Impact, TrajectoryParams};

/// Weathercocking turn for one step (radians).
pub fn weathercock_rate(atmosphere_density: f64, burn_time: f64, dt: f64) -> f64 {
    let density_factor = (WEATHERCOCK_DENSITY_GAIN * atmosphere_density).clamp(0.0, 1.0);
    (density_factor * 0.5 * burn_time * WEATHERCOCK_RATE * dt).to_radians()
}

/// Advance a live rocket by one step.
///
/// The velocity is assumed half a step ahead of the position (leap-frog).
/// The motor clock advances by `dt` first, so a burn of `thrust_time`
/// delivers thrust on every step that ends inside it.
pub fn rocket_step(
    motor: &mut RocketMotor,
    kinematics: &mut Kinematics,
    mass: f64,
    atmosphere_density: f64,
    gravity: DVec3,
    dt: f64,
) {
    motor.burn_elapsed += dt;
    kinematics.position += kinematics.velocity * dt;

    motor.direction = rotate_towards(
        motor.direction,
        kinematics.velocity,
        weathercock_rate(atmosphere_density, motor.burn_elapsed, dt),
    );

    kinematics.acceleration = if motor.burning() && mass > 0.0 {
        motor.thrust / mass * motor.direction
    } else {
        DVec3::ZERO
    };
    kinematics.velocity += (kinematics.acceleration + gravity) * dt;
}

/// Limits of a rocket prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketSimParams {
    pub dt: f64,
    /// Prediction stops this far from the launcher.
    pub target_distance: f64,
    pub max_range: f64,
    pub ignore_vessel: Option<VesselId>,
}

/// Where a rocket is predicted to end up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketPrediction {
    pub position: DVec3,
    /// Seconds of flight to `position`.
    pub elapsed: f64,
    pub impact: Option<Impact>,
}

/// Predict a rocket's flight from launch.
///
/// `launch_velocity` is the launcher's velocity; `direction` is the launch
/// axis. With a target the burnt-out rocket is followed to its closest
/// approach; without one the prediction ends at the distance limits.
pub fn simulate_rocket<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    start: DVec3,
    launch_velocity: DVec3,
    direction: DVec3,
    rocket: &RocketConfig,
    target: Option<&TargetKinematics>,
    params: &RocketSimParams,
) -> RocketPrediction {
    let dt = params.dt;
    let direction = direction.normalize_or_zero();
    if !(dt > 0.0) || direction == DVec3::ZERO || !start.is_finite() {
        return RocketPrediction {
            position: start,
            elapsed: 0.0,
            impact: None,
        };
    }

    let thrust_accel = if rocket.mass > 0.0 {
        rocket.thrust / rocket.mass
    } else {
        0.0
    };
    let mut motor = RocketMotor {
        thrust: rocket.thrust,
        thrust_time: rocket.thrust_time,
        burn_elapsed: 0.0,
        direction,
    };
    let gravity = query.gravity_at(start);
    let mut kinematics = Kinematics {
        position: start,
        velocity: launch_velocity + 0.5 * dt * gravity + 0.5 * dt * thrust_accel * direction,
        acceleration: DVec3::ZERO,
    };
    let limit = params.target_distance.min(params.max_range);
    let limit_sq = limit * limit;
    let mut steps = 0usize;

    while steps < MAX_SIMULATION_STEPS {
        steps += 1;

        if !motor.burning() {
            if let Some(target) = target {
                let remaining_time = (limit / kinematics.velocity.length().max(1.0)).max(dt);
                let gravity = query.gravity_at(kinematics.position);
                let ballistic = TrajectoryParams {
                    ignore_vessel: params.ignore_vessel,
                    ..TrajectoryParams::new(limit, remaining_time, dt)
                };
                let target_now = crate::prediction::predict(target, motor.burn_elapsed);
                let approach = simulate_closest_approach(
                    query,
                    kinematics.position,
                    kinematics.velocity - 0.5 * dt * gravity,
                    &target_now,
                    &ballistic,
                );
                return RocketPrediction {
                    position: approach.position,
                    elapsed: motor.burn_elapsed + approach.elapsed,
                    impact: approach.impact,
                };
            }
        }

        let speed = kinematics.velocity.length();
        if speed > 0.0 {
            if let Some(hit) =
                query.raycast(kinematics.position, kinematics.velocity, speed * dt, params.ignore_vessel)
            {
                return RocketPrediction {
                    position: hit.point,
                    elapsed: motor.burn_elapsed + hit.distance / speed,
                    impact: Some(Impact::Surface(hit)),
                };
            }
        }

        let gravity = query.gravity_at(kinematics.position);
        let density = query.atmosphere_density(kinematics.position);
        rocket_step(&mut motor, &mut kinematics, rocket.mass, density, gravity, dt);

        let offset = kinematics.position - start;
        if offset.length_squared() > limit_sq {
            return RocketPrediction {
                position: start + offset.normalize_or_zero() * limit,
                elapsed: motor.burn_elapsed,
                impact: None,
            };
        }
    }

    RocketPrediction {
        position: kinematics.position,
        elapsed: motor.burn_elapsed,
        impact: None,
    }
}

/// Where the first hit along a rocket prediction landed, if it hit something.
pub fn predicted_hit(prediction: &RocketPrediction) -> Option<RayHit> {
    match prediction.impact {
        Some(Impact::Surface(hit)) => Some(hit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use ordnance_core::types::TeamId;

    fn params(distance: f64) -> RocketSimParams {
        RocketSimParams {
            dt: DT,
            target_distance: distance,
            max_range: 10_000.0,
            ignore_vessel: None,
        }
    }

    #[test]
    fn weathercock_needs_air() {
        assert_eq!(weathercock_rate(0.0, 1.0, DT), 0.0);
        assert!(weathercock_rate(AIR_DENSITY_SEA_LEVEL, 1.0, DT) > 0.0);
        // Saturates above 0.4 kg/m³.
        assert_eq!(weathercock_rate(0.5, 1.0, DT), weathercock_rate(1.0, 1.0, DT));
    }

    #[test]
    fn step_thrusts_only_while_burning() {
        let mut motor = RocketMotor {
            thrust: 4.0,
            thrust_time: 0.05,
            burn_elapsed: 0.0,
            direction: DVec3::X,
        };
        let mut kin = Kinematics::default();
        rocket_step(&mut motor, &mut kin, 0.02, 0.0, DVec3::ZERO, 0.02);
        assert!((kin.velocity.x - 4.0).abs() < 1e-9, "v = {:.3}", kin.velocity.x);
        rocket_step(&mut motor, &mut kin, 0.02, 0.0, DVec3::ZERO, 0.02);
        rocket_step(&mut motor, &mut kin, 0.02, 0.0, DVec3::ZERO, 0.02);
        // Third step ends past 0.05 s: coasting.
        assert!((kin.velocity.x - 8.0).abs() < 1e-9, "v = {:.3}", kin.velocity.x);
        assert_eq!(kin.acceleration, DVec3::ZERO);
    }

    #[test]
    fn vacuum_burn_matches_rocket_equation() {
        let arena = Arena::vacuum();
        let rocket = RocketConfig {
            mass: 0.02,
            thrust: 4.0,
            thrust_time: 1.0,
        };
        // 200 m/s² for 1 s: 100 m during the burn.
        let out = simulate_rocket(&arena, DVec3::ZERO, DVec3::ZERO, DVec3::X, &rocket, None, &params(100.0));
        assert!((out.elapsed - 1.0).abs() < 2.0 * DT, "reached 100 m at {:.3}s", out.elapsed);
        assert!((out.position.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rocket_hits_wall() {
        let mut arena = Arena::vacuum();
        let (_, part) = arena.add_single_part_vessel("wall", TeamId(2), DVec3::new(300.0, 0.0, 100.0), 5.0, 10.0, 500.0);
        let rocket = RocketConfig::default();
        let out = simulate_rocket(
            &arena,
            DVec3::new(0.0, 0.0, 100.0),
            DVec3::ZERO,
            DVec3::X,
            &rocket,
            None,
            &params(2_000.0),
        );
        let hit = predicted_hit(&out).expect("rocket should hit the wall");
        assert!(matches!(hit.collider, crate::host::Collider::Part { part: p, .. } if p == part));
        assert!((out.position.x - 295.0).abs() < 1e-6, "hit at x = {:.3}", out.position.x);
    }

    #[test]
    fn coasting_rocket_passes_target() {
        let arena = Arena::vacuum();
        let rocket = RocketConfig {
            mass: 0.02,
            thrust: 4.0,
            thrust_time: 0.5,
        };
        let target = TargetKinematics::stationary(DVec3::new(1_000.0, 0.0, 0.0));
        let out = simulate_rocket(
            &arena,
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::X,
            &rocket,
            Some(&target),
            &params(1_200.0),
        );
        assert!((out.position.x - 1_000.0).abs() < 1.0, "closest approach at x = {:.2}", out.position.x);
    }
}
