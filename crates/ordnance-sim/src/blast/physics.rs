//! Air-blast scaling laws.
//!
//! Hopkinson–Cranz cube-root scaling for range and the Kingery–Bulmash
//! polynomial fits (AASTP-1) for incident impulse and positive phase
//! duration. Distances are in meters, charge masses in kg of TNT, impulses
//! in kPa·ms and durations in ms unless stated otherwise. The coefficients
//! are calibrated and reproduced as-is.

use ordnance_core::constants::*;

/// Blast range (m) of a TNT-equivalent charge.
pub fn blast_range(tnt_mass: f64) -> f64 {
    BLAST_RANGE_COEFFICIENT * tnt_mass.max(0.0).cbrt()
}

/// TNT-equivalent mass (kg) whose blast range is `range`.
pub fn explosive_mass_for_range(range: f64) -> f64 {
    (range.max(0.0) / BLAST_RANGE_COEFFICIENT).powi(3)
}

/// Distance clamped into the validity band of the impulse fits.
pub fn clamp_range(tnt_mass: f64, distance: f64) -> f64 {
    let cbrt = tnt_mass.cbrt();
    distance.clamp(SCALED_DISTANCE_MIN * cbrt, SCALED_DISTANCE_MAX * cbrt)
}

/// Scaled distance `Z = d / W^⅓`.
pub fn scaled_distance(tnt_mass: f64, distance: f64) -> f64 {
    distance / tnt_mass.cbrt()
}

fn polynomial(coefficients: &[f64], u: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * u + c)
}

/// Incident impulse (kPa·ms) at scaled distance `z`.
pub fn incident_impulse(z: f64, tnt_mass: f64) -> f64 {
    let t = z.log10();
    let exponent = if z <= 0.955 {
        let u = 2.06761908721 + 3.0760329666 * t;
        polynomial(
            &[
                2.52455620925,
                -0.502992763686,
                0.171335645235,
                0.0450176963051,
                -0.0118964626402,
            ],
            u,
        )
    } else {
        let u = -1.94708846747 + 2.40697745406 * t;
        polynomial(
            &[
                1.67281645863,
                -0.384519026965,
                -0.0260816706301,
                0.00595798753822,
                0.014544526107,
                -0.00663289334734,
                -0.00284189327204,
                0.0013644816227,
            ],
            u,
        )
    };
    10f64.powf(exponent) * tnt_mass.cbrt()
}

/// Positive phase duration (ms) at scaled distance `z`.
pub fn positive_phase_time(z: f64, tnt_mass: f64) -> f64 {
    let z = z.clamp(POSITIVE_PHASE_Z_MIN, SCALED_DISTANCE_MAX);
    let t = z.log10();
    let exponent = if z <= 1.01 {
        let u = 1.92946154068 + 5.25099193925 * t;
        polynomial(
            &[
                -0.614227603559,
                0.130143717675,
                0.134872511954,
                0.0391574276906,
                -0.00475933664702,
                -0.00428144598008,
            ],
            u,
        )
    } else if z <= 2.78 {
        let u = -2.12492525216 + 9.2996288611 * t;
        polynomial(
            &[
                0.315409245784,
                -0.0297944268976,
                0.030632954288,
                0.0183405574086,
                -0.0173964666211,
                -0.00106321963633,
                0.00562060030977,
                0.0001618217499,
                -0.0006860188944,
            ],
            u,
        )
    } else {
        let u = -3.53626218091 + 3.46349745571 * t;
        polynomial(
            &[
                0.686906642409,
                0.0933035304009,
                -0.0005849420883,
                -0.00226884995013,
                -0.00295908591505,
                0.00148029868929,
            ],
            u,
        )
    };
    10f64.powf(exponent) * tnt_mass.cbrt()
}

/// Arrival time (s) of the blast front at the edge of the blast range.
pub fn blast_max_time(tnt_mass: f64) -> f64 {
    let range = clamp_range(tnt_mass, blast_range(tnt_mass));
    let t = scaled_distance(tnt_mass, range).log10();
    let u = -0.202425716178 + 1.37784223635 * t;
    let exponent = polynomial(
        &[
            -0.0591634288046,
            1.35706496258,
            0.052492798645,
            -0.196563954086,
            -0.0601770052288,
            0.0696360270981,
            0.0215297490092,
            -0.0161658930785,
            -0.00232531970294,
            0.00147752067524,
        ],
        u,
    );
    10f64.powf(exponent) * tnt_mass.cbrt() / 1000.0
}

/// Force (N) from an impulse per unit area (kPa·ms) over `area` (m²) and a
/// duration (ms).
pub fn force_from_pressure(pressure: f64, area: f64, duration_ms: f64) -> f64 {
    pressure * 1000.0 * area * (duration_ms / 1000.0)
}

/// Area of a part loaded by the blast (m²).
pub fn effective_blast_area(range: f64, part_area: f64) -> f64 {
    let circular = std::f64::consts::PI * range * range;
    circular.clamp(0.0, (part_area * BLAST_AREA_FRACTION).max(0.0))
}

/// Effects of a blast on one part.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlastInfo {
    /// Peak incident impulse on the near face.
    pub total_pressure: f64,
    pub effective_area: f64,
    /// Mean positive phase over the part (ms).
    pub positive_phase: f64,
    /// Velocity change of the vessel (m/s).
    pub velocity_change: f64,
    pub damage: f64,
}

/// Impulse and damage delivered to a part `distance` meters from a charge.
///
/// The near face takes the impulse at `distance`, the far face (one bounding
/// size further) the impulse there if it is still inside the blast range.
/// `vessel_mass` is in kilograms.
pub fn part_blast_effects(
    part_area: f64,
    part_bounds_size: f64,
    distance: f64,
    vessel_mass: f64,
    tnt_mass: f64,
    range: f64,
) -> BlastInfo {
    if !(tnt_mass > 0.0) {
        return BlastInfo::default();
    }
    let near_distance = clamp_range(tnt_mass, distance);
    let far_distance_raw = distance + part_bounds_size;
    let far_distance = clamp_range(tnt_mass, far_distance_raw);

    let far_z = scaled_distance(tnt_mass, far_distance);
    let far_phase = positive_phase_time(far_z, tnt_mass);
    let far_pressure = if far_distance_raw <= range {
        incident_impulse(far_z, tnt_mass)
    } else {
        0.0
    };

    let near_z = scaled_distance(tnt_mass, near_distance);
    let near_pressure = incident_impulse(near_z, tnt_mass);
    let near_phase = positive_phase_time(near_z, tnt_mass);

    let area = effective_blast_area(range, part_area);
    let near_force = force_from_pressure(near_pressure, area, near_phase);
    let far_force = force_from_pressure(far_pressure, area, far_phase);
    let force = 0.5 * (near_force + far_force);

    BlastInfo {
        total_pressure: near_pressure,
        effective_area: area,
        positive_phase: 0.5 * (near_phase + far_phase),
        velocity_change: if vessel_mass > 0.0 { force / vessel_mass } else { 0.0 },
        damage: near_pressure + far_pressure,
    }
}
