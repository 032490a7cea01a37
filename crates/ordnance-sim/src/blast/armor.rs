//! Armor against blasts, penetrators and casing fragments.
//!
//! Thicknesses are in millimeters, masses in kg and speeds in m/s.

use std::f64::consts::PI;

use ordnance_core::constants::*;

use crate::systems::projectile::kinetic_damage;

/// Incidence cosines below this count as grazing.
const GRAZING_COS: f64 = 1e-3;

/// Krupp penetration (mm) of a penetrator of `caliber_mm` and `mass_kg` at `speed`.
pub fn penetration(caliber_mm: f64, mass_kg: f64, speed: f64) -> f64 {
    if caliber_mm <= KRUPP_MIN_CALIBER || !(mass_kg > 0.0) || !(speed > 0.0) {
        return 0.0;
    }
    KRUPP_COEFFICIENT * speed * (mass_kg / 1000.0).sqrt() / caliber_mm.sqrt()
}

/// Plate thickness along the line of travel.
pub fn effective_thickness(armor: f64, cos_incidence: f64) -> f64 {
    (armor / cos_incidence.max(GRAZING_COS)).max(MIN_ARMOR_THICKNESS)
}

/// Share of blast damage that gets past a part's plate.
///
/// A plate the impulse blows through passes all of it. A plate that holds
/// still sheds spall in proportion to how close the impulse came.
pub fn blast_through_fraction(total_pressure: f64, armor: f64) -> f64 {
    if armor <= 0.0 {
        return 1.0;
    }
    let resistance = ARMOR_BLAST_RESISTANCE * armor.max(MIN_ARMOR_THICKNESS);
    (total_pressure / resistance).clamp(0.0, 1.0)
}

/// Thickness (mm) a part's plate loses to a hole `caliber_mm` wide.
///
/// The hole volume is spread over the part's area. Stopped penetrators
/// only gouge the plate.
pub fn armor_erosion(caliber_mm: f64, penetration: f64, armor: f64, part_area: f64, penetrated: bool) -> f64 {
    if armor <= 0.0 || !(part_area > 0.0) || !(penetration > 0.0) {
        return 0.0;
    }
    let radius = caliber_mm / 2_000.0;
    let hole_share = (PI * radius * radius / part_area).min(1.0);
    let depth = if penetrated {
        armor
    } else {
        penetration.min(armor) * ARMOR_STOPPED_EROSION
    };
    (hole_share * depth).min(armor)
}

/// How a cased charge breaks up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragmentation {
    /// Fragments thrown.
    pub count: f64,
    pub mass_kg: f64,
    /// Gurney velocity of the casing (m/s).
    pub speed: f64,
    /// Diameter of an equivalent steel sphere (mm).
    pub caliber_mm: f64,
}

impl Fragmentation {
    /// `None` for a bare charge.
    pub fn of(tnt_mass: f64, casing_mass: f64) -> Option<Self> {
        if !(tnt_mass > 0.0 && casing_mass > 0.0) {
            return None;
        }
        let filler_ratio = tnt_mass / (tnt_mass + casing_mass);
        let count = (FRAGMENT_FRANGIBILITY * filler_ratio).max(1.0);
        let mass_kg = casing_mass / count;
        Some(Self {
            count,
            mass_kg,
            speed: GURNEY_VELOCITY / (casing_mass / tnt_mass + 0.6).sqrt(),
            caliber_mm: (6.0 * mass_kg / (PI * CASING_DENSITY)).cbrt() * 1000.0,
        })
    }

    /// Expected strikes on `area` (m²) at `distance` meters.
    pub fn strikes(&self, area: f64, distance: f64) -> f64 {
        let shell = 4.0 * PI * distance.max(1.0).powi(2);
        self.count * (area.max(0.0) / shell).min(1.0)
    }

    pub fn penetration(&self) -> f64 {
        penetration(self.caliber_mm, self.mass_kg, self.speed)
    }

    /// Damage of `strikes` fragments against `armor` mm of plate; none when
    /// the plate stops them.
    pub fn damage(&self, strikes: f64, armor: f64) -> f64 {
        if armor > 0.0 && self.penetration() <= armor {
            return 0.0;
        }
        strikes * kinetic_damage(self.mass_kg, self.speed)
    }
}
