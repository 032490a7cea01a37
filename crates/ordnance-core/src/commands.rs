//! Commands sent to a combat session.
//!
//! Commands are queued and processed at the next tick boundary, in order.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::NuclearConfig;
use crate::types::*;

/// Every external request a session accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionCommand {
    // --- Weapon state ---
    EnableWeapon { weapon: WeaponId },
    DisableWeapon { weapon: WeaponId },
    /// Deploy without firing.
    StandbyWeapon { weapon: WeaponId },
    /// Hand the weapon to an external controller.
    LockWeapon { weapon: WeaponId },
    UnlockWeapon { weapon: WeaponId },

    // --- Fire control ---
    SetTrigger { weapon: WeaponId, held: bool },
    /// Point the weapon; ignored while a target is tracked.
    AimAt { weapon: WeaponId, direction: DVec3 },
    /// Track a vessel and lead it, or stop tracking with `None`.
    TrackTarget { weapon: WeaponId, target: Option<VesselId> },

    // --- Special ---
    ArmNuclear {
        origin: DVec3,
        config: NuclearConfig,
        source: SourceInfo,
    },
}

impl SessionCommand {
    /// The weapon this command addresses, if any.
    pub fn weapon(&self) -> Option<WeaponId> {
        match self {
            SessionCommand::EnableWeapon { weapon }
            | SessionCommand::DisableWeapon { weapon }
            | SessionCommand::StandbyWeapon { weapon }
            | SessionCommand::LockWeapon { weapon }
            | SessionCommand::UnlockWeapon { weapon }
            | SessionCommand::SetTrigger { weapon, .. }
            | SessionCommand::AimAt { weapon, .. }
            | SessionCommand::TrackTarget { weapon, .. } => Some(*weapon),
            SessionCommand::ArmNuclear { .. } => None,
        }
    }
}
