//! Double exponential smoothing of target kinematics.
//!
//! Raw target velocity and acceleration samples are noisy (finite-difference
//! acceleration especially). Every targeting consumer reads them through a
//! `KinematicSmoother`, whose gain shrinks with range so distant targets
//! are smoothed harder.

use glam::DVec3;

use ordnance_core::constants::*;
use ordnance_core::types::{TargetKinematics, VesselId};

/// Smoothed output of one update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedKinematics {
    pub velocity: DVec3,
    pub acceleration: DVec3,
}

/// Smoothing gain for a target at `distance` meters.
///
/// `alpha = max(1 - sqrt(d)/512, 0.1)`; the acceleration gain is `alpha²`.
pub fn smoothing_alpha(distance: f64) -> f64 {
    let d = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
    (1.0 - d.sqrt() / SMOOTHING_DISTANCE_SCALE).max(SMOOTHING_ALPHA_MIN)
}

/// Brown's double exponential smoother for velocity and acceleration.
#[derive(Debug, Clone, Default)]
pub struct KinematicSmoother {
    velocity_s1: DVec3,
    velocity_s2: DVec3,
    acceleration_s1: DVec3,
    acceleration_s2: DVec3,
    output: SmoothedKinematics,
    primed: bool,
}

impl KinematicSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw sample.
    ///
    /// With `reset` (or on the first sample) the state collapses to the raw
    /// sample and the raw values are returned unchanged.
    pub fn update(
        &mut self,
        sample: &TargetKinematics,
        distance: f64,
        altitude: f64,
        up: DVec3,
        reset: bool,
    ) -> SmoothedKinematics {
        let mut acceleration = sample.acceleration;
        if altitude > GROUND_BAND_MIN && altitude < GROUND_BAND_MAX {
            // Ground contact makes vertical acceleration pure noise.
            let up = up.normalize_or_zero();
            acceleration -= up * acceleration.dot(up);
        }

        if reset || !self.primed {
            self.velocity_s1 = sample.velocity;
            self.velocity_s2 = sample.velocity;
            self.acceleration_s1 = acceleration;
            self.acceleration_s2 = acceleration;
            self.output = SmoothedKinematics {
                velocity: sample.velocity,
                acceleration,
            };
            self.primed = true;
            return self.output;
        }

        let alpha = smoothing_alpha(distance);
        let beta = alpha * alpha;

        self.velocity_s1 = alpha * sample.velocity + (1.0 - alpha) * self.velocity_s1;
        self.velocity_s2 = alpha * self.velocity_s1 + (1.0 - alpha) * self.velocity_s2;
        self.acceleration_s1 = beta * acceleration + (1.0 - beta) * self.acceleration_s1;
        self.acceleration_s2 = beta * self.acceleration_s1 + (1.0 - beta) * self.acceleration_s2;

        self.output = SmoothedKinematics {
            velocity: 2.0 * self.velocity_s1 - self.velocity_s2,
            acceleration: 2.0 * self.acceleration_s1 - self.acceleration_s2,
        };
        self.output
    }

    /// Last output.
    pub fn current(&self) -> SmoothedKinematics {
        self.output
    }
}

/// Smoother that resets itself whenever the tracked vessel changes.
#[derive(Debug, Clone, Default)]
pub struct TargetTracker {
    target: Option<VesselId>,
    smoother: KinematicSmoother,
    last: TargetKinematics,
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<VesselId> {
        self.target
    }

    /// Feed a sample for `target`, returning smoothed kinematics.
    pub fn observe(
        &mut self,
        target: VesselId,
        sample: &TargetKinematics,
        distance: f64,
        altitude: f64,
        up: DVec3,
    ) -> TargetKinematics {
        let reset = self.target != Some(target);
        self.target = Some(target);
        let smoothed = self.smoother.update(sample, distance, altitude, up, reset);
        self.last = TargetKinematics {
            position: sample.position,
            velocity: smoothed.velocity,
            acceleration: smoothed.acceleration,
        };
        self.last
    }

    pub fn last(&self) -> TargetKinematics {
        self.last
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Brown's smoothing of a single vector with a fixed factor and look-ahead.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedVector {
    s1: DVec3,
    s2: DVec3,
    alpha: f64,
    beta: f64,
    /// Sample interval (seconds).
    rate: f64,
}

impl SmoothedVector {
    /// `beta` is the retention factor in `[0, 1)`; `rate` the sample interval.
    pub fn new(beta: f64, initial: DVec3, rate: f64) -> Self {
        let beta = beta.clamp(0.0, 0.999);
        Self {
            s1: initial,
            s2: initial,
            alpha: 1.0 - beta,
            beta,
            rate: if rate > 0.0 { rate } else { DT },
        }
    }

    pub fn update(&mut self, value: DVec3) {
        self.s1 = self.alpha * value + self.beta * self.s1;
        self.s2 = self.alpha * self.s1 + self.beta * self.s2;
    }

    pub fn reset(&mut self, value: DVec3) {
        self.s1 = value;
        self.s2 = value;
    }

    pub fn value(&self) -> DVec3 {
        2.0 * self.s1 - self.s2
    }

    /// Estimate `delta` seconds past the latest sample.
    pub fn at(&self, delta: f64) -> DVec3 {
        if self.beta <= 0.0 {
            return self.value();
        }
        let trend = self.alpha / self.beta * (self.s1 - self.s2);
        self.value() + delta / self.rate * trend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(v: DVec3, a: DVec3) -> TargetKinematics {
        TargetKinematics::new(DVec3::ZERO, v, a)
    }

    #[test]
    fn reset_returns_raw_sample() {
        let mut smoother = KinematicSmoother::new();
        smoother.update(&sample(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO), 500.0, 1000.0, DVec3::Z, false);
        smoother.update(&sample(DVec3::new(90.0, 3.0, 0.0), DVec3::ONE), 500.0, 1000.0, DVec3::Z, false);
        let out = smoother.update(
            &sample(DVec3::new(5.0, 0.0, 0.0), DVec3::new(1.0, 2.0, 3.0)),
            500.0,
            1000.0,
            DVec3::Z,
            true,
        );
        assert_eq!(out.velocity, DVec3::new(5.0, 0.0, 0.0));
        assert_eq!(out.acceleration, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn alpha_floor_and_ceiling() {
        assert!((smoothing_alpha(0.0) - 1.0).abs() < 1e-12);
        assert!((smoothing_alpha(1.0e9) - SMOOTHING_ALPHA_MIN).abs() < 1e-12);
        assert!((smoothing_alpha(f64::NAN) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn near_ground_acceleration_is_flattened() {
        let mut smoother = KinematicSmoother::new();
        let out = smoother.update(&sample(DVec3::ZERO, DVec3::new(1.0, 0.0, -9.0)), 100.0, 2.0, DVec3::Z, true);
        assert_eq!(out.acceleration, DVec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn constant_input_is_a_fixed_point() {
        let mut smoother = KinematicSmoother::new();
        let v = DVec3::new(30.0, -4.0, 2.0);
        for _ in 0..20 {
            let out = smoother.update(&sample(v, DVec3::ZERO), 2_000.0, 500.0, DVec3::Z, false);
            assert!((out.velocity - v).length() < 1e-9);
        }
    }

    #[test]
    fn step_change_is_damped() {
        let mut smoother = KinematicSmoother::new();
        smoother.update(&sample(DVec3::ZERO, DVec3::ZERO), 10_000.0, 500.0, DVec3::Z, true);
        let out = smoother.update(&sample(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO), 10_000.0, 500.0, DVec3::Z, false);
        assert!(
            out.velocity.x > 0.0 && out.velocity.x < 100.0,
            "smoothed velocity {:.1} should lag the step",
            out.velocity.x
        );
    }

    #[test]
    fn tracker_resets_on_new_target() {
        let mut tracker = TargetTracker::new();
        tracker.observe(VesselId(1), &sample(DVec3::new(50.0, 0.0, 0.0), DVec3::ZERO), 5_000.0, 500.0, DVec3::Z);
        tracker.observe(VesselId(1), &sample(DVec3::new(60.0, 0.0, 0.0), DVec3::ZERO), 5_000.0, 500.0, DVec3::Z);
        let switched = tracker.observe(VesselId(2), &sample(DVec3::new(-7.0, 0.0, 0.0), DVec3::ZERO), 5_000.0, 500.0, DVec3::Z);
        assert_eq!(switched.velocity, DVec3::new(-7.0, 0.0, 0.0));
        assert_eq!(tracker.target(), Some(VesselId(2)));
    }

    #[test]
    fn smoothed_vector_extrapolates_trend() {
        let mut s = SmoothedVector::new(0.5, DVec3::ZERO, 1.0);
        for i in 1..=50 {
            s.update(DVec3::new(i as f64, 0.0, 0.0));
        }
        // Linear ramp: the estimate one sample ahead sits about one unit above the value.
        let ahead = s.at(1.0).x - s.value().x;
        assert!((ahead - 1.0).abs() < 0.05, "trend {ahead:.3}");
    }
}
