//! Session and weapon configuration.
//!
//! Every struct deserializes from partial JSON (`#[serde(default)]`), and
//! `validated()` clamps values the models cannot accept, logging each fix.
//! Bad values never abort a session; they degrade to safe defaults.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::components::Submunition;
use crate::constants::*;
use crate::enums::*;
use crate::error::Result;

/// Configuration for a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same session.
    pub seed: u64,
    /// Physics step (seconds).
    pub fixed_dt: f64,
    pub blast: BlastConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            fixed_dt: DT,
            blast: BlastConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a session config from JSON, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    pub fn validated(mut self) -> Self {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            warn!(fixed_dt = self.fixed_dt, "invalid physics step, using default");
            self.fixed_dt = DT;
        }
        self.blast = self.blast.validated();
        self
    }
}

/// Tuning of the conventional blast model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlastConfig {
    /// Blast wave speed (m/s).
    pub propagation_velocity: f64,
    /// Occluders nearer than `fraction * range` are spalled through.
    pub spall_radius_fraction: f64,
    pub rebound_force_fraction: f64,
    pub building_damage_multiplier: f64,
    pub intermediate_health_factor: f64,
    /// CASE limit on damage per part hit, if any.
    pub damage_cap: Option<f64>,
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            propagation_velocity: EXPLOSION_VELOCITY,
            spall_radius_fraction: SPALL_RADIUS_FRACTION,
            rebound_force_fraction: REBOUND_FORCE_FRACTION,
            building_damage_multiplier: BUILDING_DAMAGE_MULTIPLIER,
            intermediate_health_factor: INTERMEDIATE_HEALTH_FACTOR,
            damage_cap: None,
        }
    }
}

impl BlastConfig {
    pub fn validated(mut self) -> Self {
        if !(self.propagation_velocity.is_finite() && self.propagation_velocity > 0.0) {
            warn!(
                velocity = self.propagation_velocity,
                "invalid blast propagation velocity, using default"
            );
            self.propagation_velocity = EXPLOSION_VELOCITY;
        }
        self.spall_radius_fraction = self.spall_radius_fraction.clamp(0.0, 1.0);
        self.rebound_force_fraction = self.rebound_force_fraction.max(0.0);
        self.building_damage_multiplier = self.building_damage_multiplier.max(0.0);
        self.intermediate_health_factor = self.intermediate_health_factor.max(0.0);
        if let Some(cap) = self.damage_cap {
            if !(cap.is_finite() && cap > 0.0) {
                warn!(cap, "ignoring non-positive damage cap");
                self.damage_cap = None;
            }
        }
        self
    }
}

/// Explosive filling of a round or rocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosiveConfig {
    pub tnt_mass: f64,
    pub fuze: FuzeType,
    pub filler: FillerType,
    pub warhead: WarheadType,
    pub detonation_range: f64,
    pub arming_time: f64,
    /// Timed fuze setting; zero derives it from the weapon's range.
    pub detonation_time: f64,
    pub blast_power: f64,
    pub angle_of_effect: Option<f64>,
    pub beehive: Option<Submunition>,
}

impl Default for ExplosiveConfig {
    fn default() -> Self {
        Self {
            tnt_mass: 0.0,
            fuze: FuzeType::Impact,
            filler: FillerType::Standard,
            warhead: WarheadType::Standard,
            detonation_range: 5.0,
            arming_time: 0.0,
            detonation_time: 0.0,
            blast_power: DEFAULT_BLAST_POWER,
            angle_of_effect: None,
            beehive: None,
        }
    }
}

/// A round definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmoConfig {
    pub name: String,
    /// Prototype path for the projectile pool.
    pub model: String,
    pub caliber_mm: f64,
    pub mass_kg: f64,
    pub drag_type: BulletDragType,
    pub bullet_drop: bool,
    /// Projectiles per barrel per shot (shotguns, flak).
    pub projectiles_per_shot: u32,
    pub explosive: Option<ExplosiveConfig>,
}

impl Default for AmmoConfig {
    fn default() -> Self {
        Self {
            name: "30x173Ammo".to_string(),
            model: DEFAULT_BULLET_MODEL.to_string(),
            caliber_mm: 30.0,
            mass_kg: 0.388,
            drag_type: BulletDragType::AnalyticEstimate,
            bullet_drop: true,
            projectiles_per_shot: 1,
            explosive: None,
        }
    }
}

/// Rocket motor definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    /// Mass (tonnes).
    pub mass: f64,
    /// Thrust (kN).
    pub thrust: f64,
    pub thrust_time: f64,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            mass: 0.0162,
            thrust: 4.0,
            thrust_time: 1.1,
        }
    }
}

/// A weapon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    pub rounds_per_minute: f64,
    pub barrels: u32,
    /// Full spread cone (degrees); shots deviate with sigma = half of it.
    pub max_deviation_deg: f64,
    /// Muzzle velocity (m/s).
    pub muzzle_velocity: f64,
    pub max_heat: f64,
    pub heat_per_shot: f64,
    /// Heat lost per second.
    pub heat_loss: f64,
    /// Shots per burst; zero disables burst fire.
    pub burst_length: u32,
    /// Magazine size; zero means no reload cycle.
    pub shots_per_reload: u32,
    pub reload_time: f64,
    /// Spin-up before the first shot of a trigger pull.
    pub charge_time: f64,
    /// Delay before handing the ripple token on.
    pub initial_fire_delay: f64,
    /// Deploy animation length.
    pub deploy_time: f64,
    pub max_targeting_range: f64,
    pub max_effective_distance: f64,
    /// Ammo units consumed per projectile.
    pub ammo_per_shot: u32,
    pub ammo: AmmoConfig,
    pub rocket: Option<RocketConfig>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "autocannon".to_string(),
            rounds_per_minute: 600.0,
            barrels: 1,
            max_deviation_deg: 0.2,
            muzzle_velocity: 1_030.0,
            max_heat: 3_600.0,
            heat_per_shot: 75.0,
            heat_loss: 900.0,
            burst_length: 0,
            shots_per_reload: 0,
            reload_time: 0.0,
            charge_time: 0.0,
            initial_fire_delay: 0.0,
            deploy_time: 0.0,
            max_targeting_range: 2_000.0,
            max_effective_distance: 2_500.0,
            ammo_per_shot: 1,
            ammo: AmmoConfig::default(),
            rocket: None,
        }
    }
}

impl WeaponConfig {
    /// Parse a weapon definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WeaponConfig = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Seconds between trigger cycles.
    pub fn time_between_shots(&self) -> f64 {
        60.0 / self.rounds_per_minute * self.barrels as f64
    }

    /// Projectiles spawned per trigger cycle.
    pub fn rounds_per_shot(&self) -> u32 {
        self.barrels * self.ammo.projectiles_per_shot
    }

    pub fn validated(mut self) -> Self {
        if !(self.rounds_per_minute.is_finite() && self.rounds_per_minute > 0.0) {
            warn!(weapon = %self.name, rpm = self.rounds_per_minute, "invalid fire rate, using 60 rpm");
            self.rounds_per_minute = 60.0;
        }
        if self.barrels == 0 {
            warn!(weapon = %self.name, "weapon has no barrels, assuming one");
            self.barrels = 1;
        }
        if !(self.muzzle_velocity.is_finite() && self.muzzle_velocity > 0.0) {
            warn!(weapon = %self.name, velocity = self.muzzle_velocity, "invalid muzzle velocity, using 1000 m/s");
            self.muzzle_velocity = 1_000.0;
        }
        if self.max_heat.is_nan() || self.max_heat <= 0.0 {
            // No heat model.
            self.max_heat = f64::INFINITY;
        }
        self.max_deviation_deg = self.max_deviation_deg.clamp(0.0, 180.0);
        self.heat_per_shot = self.heat_per_shot.max(0.0);
        self.heat_loss = self.heat_loss.max(0.0);
        self.reload_time = self.reload_time.max(0.0);
        self.charge_time = self.charge_time.max(0.0);
        self.initial_fire_delay = self.initial_fire_delay.max(0.0);
        self.deploy_time = self.deploy_time.max(0.0);
        self.max_targeting_range = self.max_targeting_range.max(1.0);
        self.max_effective_distance = self.max_effective_distance.max(1.0);
        self.ammo = self.ammo.validated();
        if let Some(rocket) = self.rocket.take() {
            self.rocket = Some(rocket.validated(&self.name));
        }
        self
    }
}

impl AmmoConfig {
    pub fn validated(mut self) -> Self {
        if !(self.caliber_mm.is_finite() && self.caliber_mm > 0.0) {
            warn!(ammo = %self.name, caliber = self.caliber_mm, "invalid caliber, using 1 mm");
            self.caliber_mm = 1.0;
        }
        if !(self.mass_kg.is_finite() && self.mass_kg > 0.0) {
            warn!(ammo = %self.name, mass = self.mass_kg, "invalid round mass, using 1 g");
            self.mass_kg = 0.001;
        }
        if self.projectiles_per_shot == 0 {
            self.projectiles_per_shot = 1;
        }
        if self.model.is_empty() {
            self.model = DEFAULT_BULLET_MODEL.to_string();
        }
        if let Some(explosive) = self.explosive.as_mut() {
            explosive.tnt_mass = explosive.tnt_mass.max(0.0);
            explosive.detonation_range = explosive.detonation_range.max(0.0);
            explosive.arming_time = explosive.arming_time.max(0.0);
            explosive.detonation_time = explosive.detonation_time.max(0.0);
            explosive.angle_of_effect = explosive.angle_of_effect.map(|a| a.clamp(0.0, 180.0));
        }
        self
    }
}

impl RocketConfig {
    pub fn validated(mut self, weapon: &str) -> Self {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            warn!(weapon, mass = self.mass, "invalid rocket mass, using default");
            self.mass = RocketConfig::default().mass;
        }
        self.thrust = self.thrust.max(0.0);
        self.thrust_time = self.thrust_time.max(0.0);
        self
    }
}

/// A nuclear device definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NuclearConfig {
    pub yield_kt: f64,
    pub thermal_radius: f64,
    pub fluence: f64,
    pub delay: f64,
}

impl Default for NuclearConfig {
    fn default() -> Self {
        Self {
            yield_kt: 0.05,
            thermal_radius: 750.0,
            fluence: 0.05,
            delay: NUCLEAR_DEFAULT_DELAY,
        }
    }
}
