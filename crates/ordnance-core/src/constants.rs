//! Simulation constants and calibrated model coefficients.

/// Physics tick rate (Hz).
pub const TICK_RATE: u32 = 50;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Environment ---

/// Surface gravity (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Air density at sea level (kg/m³).
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225;

/// Scale height for exponential density falloff (meters).
pub const ATMOSPHERE_SCALE_HEIGHT: f64 = 5_600.0;

/// Sea water density, used for drag below the surface (kg/m³).
pub const SEA_WATER_DENSITY: f64 = 1_030.0;

// --- Blast scaling ---

/// Blast range per cube root of TNT mass (m / kg^⅓).
pub const BLAST_RANGE_COEFFICIENT: f64 = 14.8;

/// Lower bound of scaled distance accepted by the impulse fits (m / kg^⅓).
pub const SCALED_DISTANCE_MIN: f64 = 0.0674;

/// Upper bound of scaled distance accepted by the impulse fits (m / kg^⅓).
pub const SCALED_DISTANCE_MAX: f64 = 40.0;

/// Lower bound of scaled distance for the positive phase duration fit.
pub const POSITIVE_PHASE_Z_MIN: f64 = 0.178;

/// Fraction of a part's area that can be loaded by a blast.
pub const BLAST_AREA_FRACTION: f64 = 0.40;

/// Default blast wave propagation speed (m/s).
pub const EXPLOSION_VELOCITY: f64 = 422.75;

/// Occluding parts closer to the origin than this fraction of the blast range
/// do not shield anything behind them.
pub const SPALL_RADIUS_FRACTION: f64 = 0.10;

/// Rebound impulse relative to the positive impulse.
pub const REBOUND_FORCE_FRACTION: f64 = 0.25;

/// Share of an intermediate part's health subtracted from blast damage.
pub const INTERMEDIATE_HEALTH_FACTOR: f64 = 0.5;

/// Scale on building damage from conventional blasts.
pub const BUILDING_DAMAGE_MULTIPLIER: f64 = 1.0;

/// Default blast power for building damage when none is configured.
pub const DEFAULT_BLAST_POWER: f64 = 8.0;

// --- Warheads ---

/// Default half-angle of effect for standard warheads (degrees).
pub const DEFAULT_ANGLE_OF_EFFECT: f64 = 100.0;

/// Half-angle of effect for shaped charges (degrees).
pub const SHAPED_CHARGE_ANGLE: f64 = 10.0;

/// Inner edge of the continuous-rod band (degrees off axis).
pub const CONTINUOUS_ROD_MIN_ANGLE: f64 = 75.0;

/// Outer edge of the continuous-rod band (degrees off axis).
pub const CONTINUOUS_ROD_MAX_ANGLE: f64 = 105.0;

// --- Damage limits ---

/// Caps below this also limit a hit to a share of the part's max health.
pub const CASE_PART_LIMIT_THRESHOLD: f64 = 1_000.0;

/// Share of max health a capped hit may take.
pub const CASE_MAX_HEALTH_FRACTION: f64 = 0.9;

// --- Armor ---

/// Krupp penetration coefficient (mm from m/s, kg and mm).
pub const KRUPP_COEFFICIENT: f64 = 16.0;

/// Penetrators at or below this caliber (mm) do not defeat armor.
pub const KRUPP_MIN_CALIBER: f64 = 5.0;

/// Floor on effective plate thickness (mm).
pub const MIN_ARMOR_THICKNESS: f64 = 1.0;

/// Incident impulse a millimeter of plate withstands (kPa·ms).
pub const ARMOR_BLAST_RESISTANCE: f64 = 20.0;

/// Share of the hole volume removed when a penetrator is stopped.
pub const ARMOR_STOPPED_EROSION: f64 = 0.125;

// --- Fragments ---

/// Fragments reach this multiple of the blast range.
pub const FRAGMENT_REACH_FACTOR: f64 = 2.0;

/// Gurney constant of TNT (m/s).
pub const GURNEY_VELOCITY: f64 = 2_440.0;

/// Fragments per unit of filler-to-total mass ratio.
pub const FRAGMENT_FRANGIBILITY: f64 = 5_000.0;

/// Density of casing steel (kg/m³).
pub const CASING_DENSITY: f64 = 7_850.0;

// --- Nuclear ---

/// Energy released per kiloton used by the thermal and damage fits.
pub const NUCLEAR_ENERGY_PER_KT: f64 = 3.37e9;

/// Reference distance term of the nuclear overpressure fit.
pub const NUCLEAR_IMPULSE_REFERENCE: f64 = 3.01 * 1100.0;

/// Exponent of the nuclear overpressure fit.
pub const NUCLEAR_IMPULSE_EXPONENT: f64 = 1.25;

/// psi to kPa.
pub const PSI_TO_KPA: f64 = 6.894;

/// Overpressure that demolishes reinforced concrete (kPa).
pub const NUCLEAR_DEMOLITION_KPA: f64 = 140.0;

/// Distances are floored to this before evaluating nuclear fits (meters).
pub const NUCLEAR_MIN_DISTANCE: f64 = 1.0;

/// Default delay between nuclear arming and detonation (seconds).
pub const NUCLEAR_DEFAULT_DELAY: f64 = 2.5;

// --- Smoothing ---

/// Distance scale of the smoothing factor: `alpha = 1 - sqrt(d) / scale`.
pub const SMOOTHING_DISTANCE_SCALE: f64 = 512.0;

/// Floor of the smoothing factor.
pub const SMOOTHING_ALPHA_MIN: f64 = 0.1;

/// Altitude band (meters) in which acceleration is flattened to the horizontal.
pub const GROUND_BAND_MIN: f64 = -10.0;
pub const GROUND_BAND_MAX: f64 = 12.0;

// --- Trajectory ---

/// Step divisor when refining a colliding segment.
pub const REFINEMENT_DIVISOR: f64 = 4.0;

/// Refinement stays in `Refining` while `dt > factor * fixed_dt`.
pub const REFINEMENT_FINAL_FACTOR: f64 = 5.0;

/// Hard cap on nested refinements.
pub const MAX_REFINEMENT_DEPTH: u32 = 8;

/// Step cap for closest-approach simulations.
pub const MAX_SIMULATION_STEPS: usize = 100_000;

// --- Drag ---

/// Drag coefficient folded into the ballistic coefficient.
pub const BULLET_DRAG_COEFFICIENT: f64 = 0.295;

/// Floor of any ballistic coefficient (kg/m²).
pub const MIN_BALLISTIC_COEFFICIENT: f64 = 1e-3;

/// Time-to-live margin over the nominal flight time.
pub const TTL_MARGIN: f64 = 1.1;

/// Largest caliber that can skip off water (mm).
pub const WATER_RICOCHET_MAX_CALIBER: f64 = 30.0;

/// Speed retained per degree of grazing angle after a water skip.
pub const WATER_RICOCHET_SPEED_FACTOR: f64 = 0.65 / 150.0;

// --- Rockets ---

/// Weathercocking rate (degrees per second per second of burn).
pub const WEATHERCOCK_RATE: f64 = 50.0;

/// Density gain for the weathercocking multiplier.
pub const WEATHERCOCK_DENSITY_GAIN: f64 = 2.5;

// --- Aim ---

/// Iteration cap of the lead solver.
pub const AIM_MAX_ITERATIONS: usize = 10;

/// Lead solver stops once the firing direction moves less than this (degrees).
pub const AIM_CONVERGENCE_DEG: f64 = 1.0;

/// Gravity drop (m/s) above which the aim point is corrected by simulation.
pub const AIM_SIM_CORRECTION_THRESHOLD: f64 = 100.0;

// --- Weapons ---

/// Heat fraction below which an overheated weapon recovers.
pub const HEAT_RECOVERY_FRACTION: f64 = 1.0 / 3.0;

/// Fixed delay before a weapon finishes powering down (seconds).
pub const POWER_DOWN_DELAY: f64 = 0.2;

/// Length of the self-aim check ray (meters).
pub const SELF_AIM_CHECK_DISTANCE: f64 = 1_000.0;

// --- Pools ---

/// Default explosion model prototype.
pub const DEFAULT_EXPLOSION_MODEL: &str = "ordnance/models/explosion";

/// Default explosion sound prototype.
pub const DEFAULT_EXPLOSION_SOUND: &str = "ordnance/sounds/explode1";

/// Default projectile prototype.
pub const DEFAULT_BULLET_MODEL: &str = "ordnance/models/bullet";

/// Initial slot count of a freshly created pool.
pub const POOL_INITIAL_SIZE: usize = 16;
