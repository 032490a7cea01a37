//! Closest-approach solving and kinematic extrapolation.
//!
//! Pure, stateless functions. Every aim point, proximity fuze and friendly
//! fire check is built on `closest_time_to_cpa` and `predict_position`.

use glam::DVec3;
use tracing::warn;

use ordnance_core::types::TargetKinematics;

/// Position after `t` seconds of constant acceleration.
pub fn predict_position(position: DVec3, velocity: DVec3, acceleration: DVec3, t: f64) -> DVec3 {
    position + velocity * t + 0.5 * acceleration * t * t
}

/// Velocity after `t` seconds of constant acceleration.
pub fn predict_velocity(velocity: DVec3, acceleration: DVec3, t: f64) -> DVec3 {
    velocity + acceleration * t
}

/// Extrapolate a kinematic snapshot by `t` seconds.
pub fn predict(target: &TargetKinematics, t: f64) -> TargetKinematics {
    TargetKinematics {
        position: predict_position(target.position, target.velocity, target.acceleration, t),
        velocity: predict_velocity(target.velocity, target.acceleration, t),
        acceleration: target.acceleration,
    }
}

/// Squared separation at time `t`.
fn separation_sq(rel_pos: DVec3, rel_vel: DVec3, rel_acc: DVec3, t: f64) -> f64 {
    predict_position(rel_pos, rel_vel, rel_acc, t).length_squared()
}

/// Time in `[0, max_time]` at which `|r + v t + ½ a t²|` is smallest.
///
/// The stationary points satisfy
/// `½|a|² t³ + 1.5 (a·v) t² + (|v|² + a·r) t + r·v = 0`; the admissible real
/// roots are compared with both interval ends. Returns `0.0` for degenerate
/// or non-finite input.
pub fn closest_time_to_cpa(rel_pos: DVec3, rel_vel: DVec3, rel_acc: DVec3, max_time: f64) -> f64 {
    if !(rel_pos.is_finite() && rel_vel.is_finite() && rel_acc.is_finite()) {
        warn!(?rel_pos, ?rel_vel, ?rel_acc, "non-finite input to closest-approach solver");
        return 0.0;
    }
    if max_time.is_nan() || max_time <= 0.0 {
        return 0.0;
    }

    let c3 = 0.5 * rel_acc.length_squared();
    let c2 = 1.5 * rel_acc.dot(rel_vel);
    let c1 = rel_vel.length_squared() + rel_acc.dot(rel_pos);
    let c0 = rel_pos.dot(rel_vel);

    let mut best_t = 0.0;
    let mut best_d = separation_sq(rel_pos, rel_vel, rel_acc, 0.0);
    let mut consider = |t: f64| {
        if !t.is_finite() || t <= 0.0 || t > max_time {
            return;
        }
        let d = separation_sq(rel_pos, rel_vel, rel_acc, t);
        if d < best_d {
            best_d = d;
            best_t = t;
        }
    };

    for root in solve_cubic(c3, c2, c1, c0) {
        consider(polish_root(c3, c2, c1, c0, root));
    }
    if max_time.is_finite() {
        consider(max_time);
    }
    best_t
}

/// Result of propagating two bodies to their closest approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub time: f64,
    pub own_position: DVec3,
    pub target_position: DVec3,
    pub miss_distance: f64,
}

/// Closest approach between two bodies under constant acceleration.
pub fn closest_approach(
    own: &TargetKinematics,
    target: &TargetKinematics,
    max_time: f64,
) -> ClosestApproach {
    let time = closest_time_to_cpa(
        target.position - own.position,
        target.velocity - own.velocity,
        target.acceleration - own.acceleration,
        max_time,
    );
    let own_position = predict_position(own.position, own.velocity, own.acceleration, time);
    let target_position = predict_position(target.position, target.velocity, target.acceleration, time);
    ClosestApproach {
        time,
        own_position,
        target_position,
        miss_distance: own_position.distance(target_position),
    }
}

/// Miss distance at the closest approach within `max_time`.
pub fn cpa_distance(rel_pos: DVec3, rel_vel: DVec3, rel_acc: DVec3, max_time: f64) -> f64 {
    let t = closest_time_to_cpa(rel_pos, rel_vel, rel_acc, max_time);
    predict_position(rel_pos, rel_vel, rel_acc, t).length()
}

/// One Newton step keeps roots from the closed forms accurate near multiplicities.
fn polish_root(c3: f64, c2: f64, c1: f64, c0: f64, t: f64) -> f64 {
    let f = ((c3 * t + c2) * t + c1) * t + c0;
    let df = (3.0 * c3 * t + 2.0 * c2) * t + c1;
    if df.abs() > f64::EPSILON {
        let next = t - f / df;
        if next.is_finite() {
            return next;
        }
    }
    t
}

/// Real roots of `a t³ + b t² + c t + d`.
pub(crate) fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let scale = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    let eps = 1e-12 * scale;
    if a.abs() <= eps {
        return solve_quadratic(b, c, d, eps);
    }

    // Depressed cubic x³ + p x + q with t = x - b/(3a).
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let disc = q * q / 4.0 + p * p * p / 27.0;

    if disc > 0.0 {
        let sq = disc.sqrt();
        let u = (-q / 2.0 + sq).cbrt();
        let w = (-q / 2.0 - sq).cbrt();
        vec![u + w - shift]
    } else if p.abs() < 1e-15 {
        vec![-shift]
    } else {
        let r = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (p * r)).clamp(-1.0, 1.0);
        let phi = arg.acos() / 3.0;
        (0..3)
            .map(|k| r * (phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos() - shift)
            .collect()
    }
}

fn solve_quadratic(a: f64, b: f64, c: f64, eps: f64) -> Vec<f64> {
    if a.abs() <= eps {
        if b.abs() <= eps {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    // Citardauq form avoids cancellation.
    let q = -0.5 * (b + b.signum() * sq);
    let mut roots = vec![q / a];
    if q != 0.0 {
        roots.push(c / q);
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_closing_cpa() {
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::new(-10.0, 0.0, 0.0), DVec3::ZERO, 60.0);
        assert!((t - 10.0).abs() < 1e-9, "cpa at {t:.6}s");
    }

    #[test]
    fn linear_offset_cpa() {
        // Passing 50 m abeam: closest at the along-track crossing.
        let t = closest_time_to_cpa(DVec3::new(200.0, 50.0, 0.0), DVec3::new(-20.0, 0.0, 0.0), DVec3::ZERO, 60.0);
        assert!((t - 10.0).abs() < 1e-9);
        let d = cpa_distance(DVec3::new(200.0, 50.0, 0.0), DVec3::new(-20.0, 0.0, 0.0), DVec3::ZERO, 60.0);
        assert!((d - 50.0).abs() < 1e-9);
    }

    #[test]
    fn receding_target_is_closest_now() {
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::new(10.0, 0.0, 0.0), DVec3::ZERO, 60.0);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn clamped_to_bound() {
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::new(-10.0, 0.0, 0.0), DVec3::ZERO, 4.0);
        assert!((t - 4.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_return_zero() {
        assert_eq!(closest_time_to_cpa(DVec3::new(5.0, 0.0, 0.0), DVec3::ZERO, DVec3::ZERO, 10.0), 0.0);
        assert_eq!(closest_time_to_cpa(DVec3::ZERO, DVec3::ZERO, DVec3::ZERO, 10.0), 0.0);
        assert_eq!(closest_time_to_cpa(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::X, DVec3::ZERO, 10.0), 0.0);
        assert_eq!(closest_time_to_cpa(DVec3::X, DVec3::NEG_X, DVec3::ZERO, -1.0), 0.0);
    }

    #[test]
    fn accelerating_closure() {
        // Starts at rest 100 m away, accelerating toward us at 2 m/s²: arrives at t = 10.
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO, DVec3::new(-2.0, 0.0, 0.0), 60.0);
        assert!((t - 10.0).abs() < 1e-6, "cpa at {t:.6}s");
    }

    #[test]
    fn decelerating_pass_has_interior_minimum() {
        // v = -20, a = +2: separation 100 - 20t + t², minimum at t = 10 (touches zero).
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::new(-20.0, 0.0, 0.0), DVec3::new(2.0, 0.0, 0.0), 60.0);
        assert!((t - 10.0).abs() < 1e-4, "cpa at {t:.6}s");
    }

    #[test]
    fn infinite_bound_is_accepted() {
        let t = closest_time_to_cpa(DVec3::new(100.0, 0.0, 0.0), DVec3::new(-10.0, 0.0, 0.0), DVec3::ZERO, f64::INFINITY);
        assert!((t - 10.0).abs() < 1e-9);
    }

    #[test]
    fn predict_position_constant_acceleration() {
        let p = predict_position(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -10.0), 2.0);
        assert_eq!(p, DVec3::new(20.0, 0.0, -20.0));
    }

    #[test]
    fn cubic_three_roots() {
        // (t-1)(t-2)(t-3) = t³ - 6t² + 11t - 6
        let mut roots = solve_cubic(1.0, -6.0, 11.0, -6.0);
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 3);
        for (r, e) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((r - e).abs() < 1e-9, "root {r} vs {e}");
        }
    }

    #[test]
    fn closest_approach_reports_miss_distance() {
        let own = TargetKinematics::new(DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO);
        let target = TargetKinematics::new(DVec3::new(1000.0, 30.0, 0.0), DVec3::ZERO, DVec3::ZERO);
        let cpa = closest_approach(&own, &target, 60.0);
        assert!((cpa.time - 10.0).abs() < 1e-9);
        assert!((cpa.miss_distance - 30.0).abs() < 1e-9);
    }
}
