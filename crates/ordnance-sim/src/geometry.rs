//! Small vector helpers shared by the flight and aim code.

use glam::{DQuat, DVec3};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Rotate the unit vector `from` toward `to` by at most `max_radians`.
pub fn rotate_towards(from: DVec3, to: DVec3, max_radians: f64) -> DVec3 {
    let from = from.normalize_or_zero();
    let to_dir = to.normalize_or_zero();
    if from == DVec3::ZERO {
        return to_dir;
    }
    if to_dir == DVec3::ZERO || max_radians <= 0.0 {
        return from;
    }
    let angle = from.angle_between(to_dir);
    if angle <= max_radians {
        return to_dir;
    }
    let axis = from.cross(to_dir);
    let axis = if axis.length_squared() > 1e-18 {
        axis.normalize()
    } else {
        // Antiparallel: any perpendicular works.
        from.any_orthonormal_vector()
    };
    (DQuat::from_axis_angle(axis, max_radians) * from).normalize()
}

/// Angle between two vectors in degrees; zero if either is degenerate.
pub fn angle_deg(a: DVec3, b: DVec3) -> f64 {
    if a.length_squared() < 1e-18 || b.length_squared() < 1e-18 {
        return 0.0;
    }
    a.angle_between(b).to_degrees()
}

/// Perturb `direction` by a Gaussian angle with standard deviation `sigma_deg`,
/// rolled uniformly about the direction.
pub fn gaussian_direction_deviation<R: Rng>(direction: DVec3, sigma_deg: f64, rng: &mut R) -> DVec3 {
    let dir = direction.normalize_or_zero();
    if dir == DVec3::ZERO || sigma_deg <= 0.0 {
        return dir;
    }
    let normal = match Normal::new(0.0, sigma_deg) {
        Ok(n) => n,
        Err(_) => return dir,
    };
    let pitch = normal.sample(rng).to_radians();
    let roll = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
    let perpendicular = dir.any_orthonormal_vector();
    let tilted = DQuat::from_axis_angle(perpendicular, pitch) * dir;
    (DQuat::from_axis_angle(dir, roll) * tilted).normalize()
}

/// Tilt `direction` by a uniform angle in `[0, max_deg]` about a random axis.
pub fn random_tilt<R: Rng>(direction: DVec3, max_deg: f64, rng: &mut R) -> DVec3 {
    if max_deg <= 0.0 || direction.length_squared() < 1e-18 {
        return direction;
    }
    let tilt = rng.gen_range(0.0..=max_deg).to_radians();
    let roll = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
    let dir = direction.normalize();
    let axis = DQuat::from_axis_angle(dir, roll) * dir.any_orthonormal_vector();
    DQuat::from_axis_angle(axis, tilt) * direction
}

/// Mirror `velocity` about the plane with unit normal `normal`.
pub fn reflect(velocity: DVec3, normal: DVec3) -> DVec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rotate_towards_limits_step() {
        let out = rotate_towards(DVec3::X, DVec3::Y, 10f64.to_radians());
        assert!((angle_deg(DVec3::X, out) - 10.0).abs() < 1e-9);
        assert!((out.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotate_towards_snaps_when_close() {
        let out = rotate_towards(DVec3::X, DVec3::new(1.0, 0.01, 0.0), 1.0);
        assert!((out - DVec3::new(1.0, 0.01, 0.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn deviation_is_seeded_and_bounded() {
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            let da = gaussian_direction_deviation(DVec3::X, 0.5, &mut a);
            let db = gaussian_direction_deviation(DVec3::X, 0.5, &mut b);
            assert_eq!(da, db);
            assert!(angle_deg(DVec3::X, da) < 5.0, "6-sigma excursion {:.2}", angle_deg(DVec3::X, da));
        }
    }

    #[test]
    fn tilt_keeps_speed_and_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let v = DVec3::new(300.0, 0.0, 40.0);
        for _ in 0..50 {
            let t = random_tilt(v, 5.0, &mut rng);
            assert!((t.length() - v.length()).abs() < 1e-9);
            assert!(angle_deg(v, t) <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn reflect_flips_normal_component() {
        let r = reflect(DVec3::new(100.0, 0.0, -30.0), DVec3::Z);
        assert_eq!(r, DVec3::new(100.0, 0.0, 30.0));
    }

    #[test]
    fn zero_sigma_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let d = gaussian_direction_deviation(DVec3::new(0.0, 3.0, 4.0), 0.0, &mut rng);
        assert!((d - DVec3::new(0.0, 0.6, 0.8)).length() < 1e-12);
    }
}
