//! Error type for programming errors and configuration failures.
//!
//! Expected outcomes (no ammo, stale targets, skipped NaN forces) are not
//! errors; they are reported through enums and logs.

use crate::types::WeaponId;

/// Errors surfaced by the ordnance crates.
#[derive(Debug, thiserror::Error)]
pub enum OrdnanceError {
    #[error("pool `{pool}`: slot {slot} released twice or never acquired")]
    PoolMisuse { pool: String, slot: usize },

    #[error("pool `{pool}`: slot {slot} used after release")]
    UseAfterRelease { pool: String, slot: usize },

    #[error("unknown weapon {0:?}")]
    UnknownWeapon(WeaponId),

    #[error("unknown ripple group {0}")]
    UnknownRippleGroup(u32),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrdnanceError>;
