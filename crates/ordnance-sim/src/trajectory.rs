//! Leap-frog ballistic integration with collision refinement.
//!
//! Velocity is kept half a step ahead of position: a half kick bootstraps
//! the scheme, then each step drifts the position by a full step and kicks
//! the velocity by a full step of local gravity. When a step would cross a
//! collider or the water surface, the final segment is re-simulated with a
//! quarter of the step until the step is small enough, then the crossing is
//! interpolated inside that last step.
//!
//! No state outside the arguments is read, so identical inputs give
//! bit-identical outputs.

use glam::DVec3;

use ordnance_core::constants::*;
use ordnance_core::enums::SimulationStage;
use ordnance_core::types::{TargetKinematics, VesselId};

use crate::host::{PhysicsQuery, RayHit};
use crate::prediction::{closest_time_to_cpa, predict_position};

/// Limits and options of one trajectory simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryParams {
    pub max_distance: f64,
    pub max_time: f64,
    /// Integration step (seconds).
    pub dt: f64,
    /// Physics tick; refinement stops once `dt` is within a few ticks.
    pub fixed_dt: f64,
    /// Fly through the water surface instead of stopping at it.
    pub ignore_water: bool,
    pub stage: SimulationStage,
    /// Parts of this vessel are invisible to the collision rays.
    pub ignore_vessel: Option<VesselId>,
}

impl TrajectoryParams {
    pub fn new(max_distance: f64, max_time: f64, dt: f64) -> Self {
        Self {
            max_distance,
            max_time,
            dt,
            fixed_dt: DT,
            ignore_water: false,
            stage: SimulationStage::Normal,
            ignore_vessel: None,
        }
    }

    pub fn ignoring(mut self, vessel: VesselId) -> Self {
        self.ignore_vessel = Some(vessel);
        self
    }

    pub fn ignore_water(mut self, ignore: bool) -> Self {
        self.ignore_water = ignore;
        self
    }

    /// Parameters for re-simulating one step of length `dt` at speed `speed`.
    fn refined(&self, speed: f64, ignore_water: bool) -> Self {
        let stage = if self.dt > REFINEMENT_FINAL_FACTOR * self.fixed_dt {
            SimulationStage::Refining
        } else {
            SimulationStage::Final
        };
        Self {
            max_distance: speed * self.dt,
            max_time: self.dt,
            dt: self.dt / REFINEMENT_DIVISOR,
            stage,
            ignore_water,
            ..*self
        }
    }
}

/// What stopped a trajectory early.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Impact {
    Surface(RayHit),
    Water,
}

/// Result of a trajectory simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryOutcome {
    /// Simulated seconds.
    pub elapsed: f64,
    pub position: DVec3,
    /// Velocity synchronized with `position`.
    pub velocity: DVec3,
    pub impact: Option<Impact>,
}

/// What one drift step would run into.
enum Crossing {
    Hit(RayHit),
    Water,
}

/// Earliest obstacle along the segment `position → position + dt·velocity`.
fn find_crossing<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    position: DVec3,
    velocity: DVec3,
    dt: f64,
    ignore_water: bool,
    ignore_vessel: Option<VesselId>,
) -> Option<Crossing> {
    let step = dt * velocity.length();
    let hit = if step > 0.0 {
        query.raycast(position, velocity, step, ignore_vessel)
    } else {
        None
    };
    let water_fraction = if ignore_water {
        None
    } else {
        let alt = query.altitude(position);
        let next_alt = query.altitude(position + dt * velocity);
        (next_alt < 0.0 && alt >= 0.0).then(|| alt / (alt - next_alt))
    };
    match (hit, water_fraction) {
        (Some(h), Some(f)) if f * step < h.distance => Some(Crossing::Water),
        (Some(h), _) => Some(Crossing::Hit(h)),
        (None, Some(_)) => Some(Crossing::Water),
        (None, None) => None,
    }
}

/// Integrate a ballistic trajectory under local gravity.
///
/// Stops at the first collision or water crossing, after `max_time`, or once
/// farther than `max_distance` from the start.
pub fn simulate_ballistic<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    start: DVec3,
    velocity: DVec3,
    params: &TrajectoryParams,
) -> TrajectoryOutcome {
    simulate_ballistic_at_depth(query, start, velocity, params, 0)
}

fn simulate_ballistic_at_depth<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    start: DVec3,
    velocity: DVec3,
    params: &TrajectoryParams,
    depth: u32,
) -> TrajectoryOutcome {
    let dt = params.dt;
    if !(dt > 0.0) || !(params.max_time > 0.0) || !start.is_finite() || !velocity.is_finite() {
        return TrajectoryOutcome {
            elapsed: 0.0,
            position: start,
            velocity,
            impact: None,
        };
    }

    // Starting submerged: the surface is not an obstacle.
    let ignore_water = params.ignore_water || query.altitude(start) < 0.0;
    let max_distance_sq = params.max_distance * params.max_distance;

    let mut position = start;
    let mut gravity = query.gravity_at(position);
    let mut velocity = velocity + 0.5 * dt * gravity;
    let mut elapsed = 0.0;
    let mut steps = 0usize;

    while elapsed < params.max_time && steps < MAX_SIMULATION_STEPS {
        steps += 1;
        if let Some(crossing) =
            find_crossing(query, position, velocity, dt, ignore_water, params.ignore_vessel)
        {
            let speed = velocity.length();
            match params.stage {
                SimulationStage::Normal | SimulationStage::Refining
                    if depth < MAX_REFINEMENT_DEPTH =>
                {
                    // Undo the half kick and redo this step finer.
                    let synced = velocity - 0.5 * dt * gravity;
                    let sub = simulate_ballistic_at_depth(
                        query,
                        position,
                        synced,
                        &params.refined(speed, ignore_water),
                        depth + 1,
                    );
                    return TrajectoryOutcome {
                        elapsed: elapsed + sub.elapsed,
                        ..sub
                    };
                }
                _ => {
                    let (time, point, impact) = match crossing {
                        Crossing::Hit(hit) => {
                            let time = if speed > 0.0 { hit.distance / speed } else { 0.0 };
                            (time, hit.point, Impact::Surface(hit))
                        }
                        Crossing::Water => {
                            let alt = query.altitude(position);
                            let next_alt = query.altitude(position + dt * velocity);
                            let time = dt * alt / (alt - next_alt);
                            (time, position + time * velocity, Impact::Water)
                        }
                    };
                    return TrajectoryOutcome {
                        elapsed: elapsed + time,
                        position: point,
                        velocity: velocity - 0.5 * dt * gravity + time * gravity,
                        impact: Some(impact),
                    };
                }
            }
        }

        position += dt * velocity;
        gravity = query.gravity_at(position);
        velocity += dt * gravity;
        elapsed += dt;

        if (position - start).length_squared() > max_distance_sq {
            break;
        }
    }

    TrajectoryOutcome {
        elapsed,
        position,
        velocity: velocity - 0.5 * dt * gravity,
        impact: None,
    }
}

/// Result of a closest-approach simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachOutcome {
    /// Seconds until closest approach (or impact).
    pub elapsed: f64,
    /// Projectile position at that time.
    pub position: DVec3,
    pub velocity: DVec3,
    /// Target position at that time.
    pub target_position: DVec3,
    pub impact: Option<Impact>,
}

impl ApproachOutcome {
    pub fn miss_distance(&self) -> f64 {
        self.position.distance(self.target_position)
    }
}

/// Integrate a ballistic trajectory until it passes a moving target.
///
/// The step that overshoots is repeated with quartered steps until the step
/// is within a few physics ticks, then the closest point inside that step is
/// solved for directly.
pub fn simulate_closest_approach<Q: PhysicsQuery + ?Sized>(
    query: &Q,
    start: DVec3,
    velocity: DVec3,
    target: &TargetKinematics,
    params: &TrajectoryParams,
) -> ApproachOutcome {
    let mut dt = params.dt;
    let target_at = |t: f64| predict_position(target.position, target.velocity, target.acceleration, t);
    if !(dt > 0.0) || !(params.max_time > 0.0) || !start.is_finite() || !velocity.is_finite() {
        return ApproachOutcome {
            elapsed: 0.0,
            position: start,
            velocity,
            target_position: target.position,
            impact: None,
        };
    }

    let ignore_water = params.ignore_water || query.altitude(start) < 0.0;
    let max_distance_sq = params.max_distance * params.max_distance;
    let mut stage = params.stage;
    let mut depth = 0u32;

    let mut position = start;
    let mut gravity = query.gravity_at(position);
    let mut velocity = velocity + 0.5 * dt * gravity;
    let mut elapsed = 0.0;
    let mut steps = 0usize;

    while elapsed < params.max_time && steps < MAX_SIMULATION_STEPS {
        steps += 1;
        let next = position + dt * velocity;
        let target_now = target_at(elapsed);
        let target_next = target_at(elapsed + dt);

        if (target_next - next).dot(velocity) < 0.0 {
            // The target will be behind us after this step.
            if stage != SimulationStage::Final && depth < MAX_REFINEMENT_DEPTH {
                stage = if dt > REFINEMENT_FINAL_FACTOR * params.fixed_dt {
                    SimulationStage::Refining
                } else {
                    SimulationStage::Final
                };
                velocity -= 0.5 * dt * gravity;
                dt /= REFINEMENT_DIVISOR;
                velocity += 0.5 * dt * gravity;
                depth += 1;
                continue;
            }
            let relative_velocity = velocity - (target_next - target_now) / dt;
            let t = closest_time_to_cpa(position - target_now, relative_velocity, DVec3::ZERO, dt);
            return ApproachOutcome {
                elapsed: elapsed + t,
                position: position + t * velocity,
                velocity: velocity - 0.5 * dt * gravity + t * gravity,
                target_position: target_at(elapsed + t),
                impact: None,
            };
        }

        if let Some(crossing) =
            find_crossing(query, position, velocity, dt, ignore_water, params.ignore_vessel)
        {
            let sub_params = TrajectoryParams {
                max_distance: velocity.length() * dt * 2.0,
                max_time: dt * 2.0,
                dt,
                stage,
                ignore_water,
                ..*params
            };
            let synced = velocity - 0.5 * dt * gravity;
            let sub = simulate_ballistic(query, position, synced, &sub_params);
            let impact = sub.impact.or(match crossing {
                Crossing::Hit(hit) => Some(Impact::Surface(hit)),
                Crossing::Water => Some(Impact::Water),
            });
            return ApproachOutcome {
                elapsed: elapsed + sub.elapsed,
                position: sub.position,
                velocity: sub.velocity,
                target_position: target_at(elapsed + sub.elapsed),
                impact,
            };
        }

        position = next;
        gravity = query.gravity_at(position);
        velocity += dt * gravity;
        elapsed += dt;

        if (position - start).length_squared() > max_distance_sq {
            break;
        }
    }

    ApproachOutcome {
        elapsed,
        position,
        velocity: velocity - 0.5 * dt * gravity,
        target_position: target_at(elapsed),
        impact: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use ordnance_core::types::TeamId;

    #[test]
    fn vacuum_flight_is_straight() {
        let arena = Arena::vacuum();
        let params = TrajectoryParams::new(10_000.0, 2.0, 0.02);
        let out = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, 100.0), DVec3::new(500.0, 0.0, 0.0), &params);
        assert!(out.impact.is_none());
        assert!(out.elapsed >= 2.0 - 1e-9 && out.elapsed <= 2.02 + 1e-9, "elapsed {:.4}", out.elapsed);
        assert!((out.position.x - 500.0 * out.elapsed).abs() < 1e-6);
        assert!((out.position.z - 100.0).abs() < 1e-12);
    }

    #[test]
    fn leapfrog_matches_parabola() {
        let arena = Arena::new();
        let params = TrajectoryParams::new(1.0e6, 1.0, 0.01).ignore_water(true);
        let v0 = DVec3::new(100.0, 0.0, 50.0);
        let out = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, 1000.0), v0, &params);
        let expected = predict_position(DVec3::new(0.0, 0.0, 1000.0), v0, arena.gravity_at(DVec3::ZERO), out.elapsed);
        assert!((out.position - expected).length() < 1e-6, "error {:.3e}", (out.position - expected).length());
    }

    #[test]
    fn water_impact_is_refined_below_step_size() {
        let arena = Arena::new();
        // Coarse 0.5 s steps falling from 100 m.
        let params = TrajectoryParams::new(1.0e6, 20.0, 0.5);
        let out = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, 100.0), DVec3::new(50.0, 0.0, 0.0), &params);
        assert_eq!(out.impact, Some(Impact::Water));
        assert!(out.position.z.abs() < 0.05, "impact altitude {:.4}", out.position.z);
        let exact = (2.0 * 100.0 / arena.gravity).sqrt();
        assert!((out.elapsed - exact).abs() < 0.01, "impact at {:.4}s, exact {exact:.4}s", out.elapsed);
    }

    #[test]
    fn collision_reports_hit_point() {
        let mut arena = Arena::vacuum();
        let (_, part) = arena.add_single_part_vessel("wall", TeamId(1), DVec3::new(1000.0, 0.0, 0.0), 2.0, 1.0, 100.0);
        let params = TrajectoryParams::new(5_000.0, 10.0, 0.5);
        let out = simulate_ballistic(&arena, DVec3::ZERO, DVec3::new(400.0, 0.0, 0.0), &params);
        match out.impact {
            Some(Impact::Surface(hit)) => {
                assert!(matches!(hit.collider, crate::host::Collider::Part { part: p, .. } if p == part));
                assert!((out.position.x - 998.0).abs() < 1e-6);
                assert!((out.elapsed - 998.0 / 400.0).abs() < 1e-9, "elapsed {:.5}", out.elapsed);
            }
            other => panic!("expected part hit, got {other:?}"),
        }
    }

    #[test]
    fn ignored_vessel_is_transparent() {
        let mut arena = Arena::vacuum();
        let (own, _) = arena.add_single_part_vessel("own", TeamId(1), DVec3::new(10.0, 0.0, 0.0), 2.0, 1.0, 100.0);
        let params = TrajectoryParams::new(100.0, 1.0, 0.02).ignoring(own);
        let out = simulate_ballistic(&arena, DVec3::ZERO, DVec3::new(400.0, 0.0, 0.0), &params);
        assert!(out.impact.is_none());
    }

    #[test]
    fn submerged_start_ignores_surface() {
        let arena = Arena::new();
        let params = TrajectoryParams::new(1.0e6, 1.0, 0.02);
        let out = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, -5.0), DVec3::new(10.0, 0.0, 30.0), &params);
        assert!(out.impact.is_none());
    }

    #[test]
    fn deterministic_bit_for_bit() {
        let arena = Arena::new();
        let params = TrajectoryParams::new(1.0e5, 30.0, 0.02);
        let a = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, 10.0), DVec3::new(300.0, 20.0, 150.0), &params);
        let b = simulate_ballistic(&arena, DVec3::new(0.0, 0.0, 10.0), DVec3::new(300.0, 20.0, 150.0), &params);
        assert_eq!(a.position.to_array().map(f64::to_bits), b.position.to_array().map(f64::to_bits));
        assert_eq!(a.elapsed.to_bits(), b.elapsed.to_bits());
    }

    #[test]
    fn closest_approach_to_stationary_target() {
        let arena = Arena::vacuum();
        let target = TargetKinematics::stationary(DVec3::new(1000.0, 20.0, 0.0));
        let params = TrajectoryParams::new(1.0e5, 10.0, 0.2);
        let out = simulate_closest_approach(&arena, DVec3::ZERO, DVec3::new(500.0, 0.0, 0.0), &target, &params);
        assert!((out.elapsed - 2.0).abs() < 1e-6, "cpa at {:.5}s", out.elapsed);
        assert!((out.miss_distance() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn closest_approach_to_moving_target() {
        let arena = Arena::vacuum();
        // Target crosses the line of fire at x = 1000 at t = 2.
        let target = TargetKinematics::new(DVec3::new(1000.0, -200.0, 0.0), DVec3::new(0.0, 100.0, 0.0), DVec3::ZERO);
        let params = TrajectoryParams::new(1.0e5, 10.0, 0.1);
        let out = simulate_closest_approach(&arena, DVec3::ZERO, DVec3::new(500.0, 0.0, 0.0), &target, &params);
        assert!(out.miss_distance() < 1.0, "miss {:.3} m", out.miss_distance());
    }
}
