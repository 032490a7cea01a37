//! Weapon state machine, heat, bursts, magazines and ammunition.
//!
//! A `Weapon` knows its own timers and counters. Anything that needs the
//! host world (self-aim, friendlies, spawning) is done by the weapon system,
//! which asks `blocking_outcome` first and calls `record_shot` once rounds
//! are granted.

use glam::DVec3;
use tracing::debug;

use ordnance_core::config::WeaponConfig;
use ordnance_core::constants::*;
use ordnance_core::enums::{FireOutcome, WeaponState};
use ordnance_core::events::CombatEvent;
use ordnance_core::types::{RippleGroupId, VesselId, WeaponId};

use crate::aim::AimSolution;
use crate::scheduler::{TimerHandle, TimerQueue, TimerTask};
use crate::smoothing::TargetTracker;

/// Ammunition available to a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmoStore {
    remaining: u64,
    unlimited: bool,
}

impl AmmoStore {
    pub fn new(rounds: u64) -> Self {
        Self {
            remaining: rounds,
            unlimited: false,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            remaining: 0,
            unlimited: true,
        }
    }

    /// Take exactly `amount` units or none. Returns the amount granted.
    pub fn request(&mut self, amount: u64) -> u64 {
        if self.unlimited {
            return amount;
        }
        if self.remaining >= amount {
            self.remaining -= amount;
            amount
        } else {
            0
        }
    }

    pub fn add(&mut self, amount: u64) {
        self.remaining = self.remaining.saturating_add(amount);
    }

    /// `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        (!self.unlimited).then_some(self.remaining)
    }
}

/// A weapon mounted on a host vessel.
#[derive(Debug, Clone)]
pub struct Weapon {
    pub id: WeaponId,
    pub config: WeaponConfig,
    pub state: WeaponState,
    pub vessel: VesselId,
    /// Muzzle position relative to the vessel's center of mass.
    pub mount_offset: DVec3,
    /// Unit aim direction, used when no target is tracked.
    pub aim_direction: DVec3,
    pub trigger: bool,
    pub target: Option<VesselId>,
    pub tracker: TargetTracker,
    /// Latest lead solution against `target`.
    pub solution: Option<AimSolution>,
    pub heat: f64,
    pub overheated: bool,
    pub time_since_last_shot: f64,
    pub burst_count: u32,
    pub shots_in_magazine: u32,
    pub reloading: bool,
    pub charge_elapsed: f64,
    pub ripple: Option<(RippleGroupId, u32)>,
    pub ammo: AmmoStore,
    pub shots_fired: u64,
    pending: Option<TimerHandle>,
    locked_from: Option<WeaponState>,
}

impl Weapon {
    pub fn new(id: WeaponId, config: WeaponConfig, vessel: VesselId, mount_offset: DVec3) -> Self {
        let config = config.validated();
        Self {
            id,
            shots_in_magazine: config.shots_per_reload,
            config,
            state: WeaponState::Disabled,
            vessel,
            mount_offset,
            aim_direction: DVec3::X,
            trigger: false,
            target: None,
            tracker: TargetTracker::new(),
            solution: None,
            heat: 0.0,
            overheated: false,
            time_since_last_shot: f64::INFINITY,
            burst_count: 0,
            reloading: false,
            charge_elapsed: 0.0,
            ripple: None,
            ammo: AmmoStore::unlimited(),
            shots_fired: 0,
            pending: None,
            locked_from: None,
        }
    }

    fn set_state(&mut self, to: WeaponState, events: &mut Vec<CombatEvent>) {
        if self.state == to {
            return;
        }
        debug!(weapon = ?self.id, from = ?self.state, to = ?to, "weapon state");
        events.push(CombatEvent::WeaponStateChanged {
            weapon: self.id,
            from: self.state,
            to,
        });
        self.state = to;
    }

    fn cancel_pending(&mut self, timers: &mut TimerQueue) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
    }

    /// Begin powering up. Returns false when the request is ignored.
    pub fn enable(&mut self, timers: &mut TimerQueue, now: f64, events: &mut Vec<CombatEvent>) -> bool {
        if matches!(
            self.state,
            WeaponState::Enabled | WeaponState::PoweringUp | WeaponState::Locked
        ) {
            return false;
        }
        self.cancel_pending(timers);
        self.set_state(WeaponState::PoweringUp, events);
        self.pending = Some(timers.schedule(
            now + self.config.deploy_time,
            TimerTask::FinishPowerUp(self.id),
        ));
        true
    }

    /// Begin powering down.
    pub fn disable(&mut self, timers: &mut TimerQueue, now: f64, events: &mut Vec<CombatEvent>) -> bool {
        if matches!(self.state, WeaponState::Disabled | WeaponState::PoweringDown) {
            return false;
        }
        self.cancel_pending(timers);
        self.locked_from = None;
        self.trigger = false;
        self.set_state(WeaponState::PoweringDown, events);
        self.pending = Some(timers.schedule(
            now + POWER_DOWN_DELAY + self.config.deploy_time,
            TimerTask::FinishPowerDown(self.id),
        ));
        true
    }

    /// Deploy without firing. From `Disabled` this waits for the deploy time.
    pub fn standby(&mut self, timers: &mut TimerQueue, now: f64, events: &mut Vec<CombatEvent>) -> bool {
        if matches!(
            self.state,
            WeaponState::Standby | WeaponState::PoweringUp | WeaponState::Locked
        ) {
            return false;
        }
        self.cancel_pending(timers);
        self.trigger = false;
        if self.state == WeaponState::Disabled {
            self.set_state(WeaponState::PoweringUp, events);
            self.pending = Some(timers.schedule(
                now + self.config.deploy_time,
                TimerTask::FinishStandby(self.id),
            ));
        } else {
            self.set_state(WeaponState::Standby, events);
        }
        true
    }

    /// Hand control to an external controller.
    pub fn lock(&mut self, timers: &mut TimerQueue, events: &mut Vec<CombatEvent>) -> bool {
        if self.state == WeaponState::Locked {
            return false;
        }
        self.cancel_pending(timers);
        self.locked_from = Some(match self.state {
            WeaponState::PoweringUp => WeaponState::Enabled,
            WeaponState::PoweringDown => WeaponState::Disabled,
            other => other,
        });
        self.set_state(WeaponState::Locked, events);
        true
    }

    /// Return to the state held before `lock`.
    pub fn unlock(&mut self, events: &mut Vec<CombatEvent>) -> bool {
        if self.state != WeaponState::Locked {
            return false;
        }
        let to = self.locked_from.take().unwrap_or(WeaponState::Disabled);
        self.set_state(to, events);
        true
    }

    /// Finish a transition scheduled on the timer queue.
    pub fn complete(
        &mut self,
        handle: TimerHandle,
        task: TimerTask,
        events: &mut Vec<CombatEvent>,
    ) {
        if task == TimerTask::FinishReload(self.id) {
            self.reloading = false;
            self.shots_in_magazine = self.config.shots_per_reload;
            debug!(weapon = ?self.id, "reloaded");
            return;
        }
        if self.pending != Some(handle) {
            return;
        }
        self.pending = None;
        match task {
            TimerTask::FinishPowerUp(_) => self.set_state(WeaponState::Enabled, events),
            TimerTask::FinishPowerDown(_) => {
                self.charge_elapsed = 0.0;
                self.burst_count = 0;
                self.set_state(WeaponState::Disabled, events);
            }
            TimerTask::FinishStandby(_) => self.set_state(WeaponState::Standby, events),
            TimerTask::FinishReload(_) | TimerTask::AdvanceRipple(_) => {}
        }
    }

    /// Per-tick clocks: shot timer, cooling, charge-up.
    pub fn update(&mut self, dt: f64) {
        self.time_since_last_shot += dt;
        self.heat = (self.heat - self.config.heat_loss * dt).max(0.0);
        if self.overheated && self.heat < self.config.max_heat * HEAT_RECOVERY_FRACTION {
            self.overheated = false;
            self.burst_count = 0;
        }
        if self.trigger && self.state == WeaponState::Enabled {
            self.charge_elapsed += dt;
        } else {
            self.charge_elapsed = 0.0;
        }
    }

    pub fn ready(&self) -> bool {
        self.time_since_last_shot > self.config.time_between_shots()
    }

    pub fn charged(&self) -> bool {
        self.config.charge_time <= 0.0 || self.charge_elapsed >= self.config.charge_time
    }

    /// The first reason this weapon cannot fire right now, if any, among
    /// the checks it can answer alone.
    pub fn blocking_outcome(&self, our_turn: bool, latch_free: bool) -> Option<FireOutcome> {
        if self.state != WeaponState::Enabled {
            return Some(FireOutcome::NotEnabled);
        }
        if !self.ready() {
            return Some(FireOutcome::NotReady);
        }
        if self.overheated {
            return Some(FireOutcome::Overheated);
        }
        if self.reloading {
            return Some(FireOutcome::Reloading);
        }
        if !self.charged() {
            return Some(FireOutcome::Charging);
        }
        if !our_turn || !latch_free {
            return Some(FireOutcome::NotOurTurn);
        }
        None
    }

    /// Ammo units one trigger cycle needs.
    pub fn ammo_per_cycle(&self) -> u64 {
        self.config.rounds_per_shot() as u64 * self.config.ammo_per_shot as u64
    }

    /// Book a fired cycle. Returns true when this shot ends a burst (always
    /// true without burst fire).
    pub fn record_shot(&mut self, timers: &mut TimerQueue, now: f64) -> bool {
        self.time_since_last_shot = 0.0;
        self.shots_fired += 1;
        self.heat += self.config.heat_per_shot;
        if self.heat > self.config.max_heat {
            self.overheated = true;
            debug!(weapon = ?self.id, heat = self.heat, "overheated");
        }

        if self.config.shots_per_reload > 0 {
            self.shots_in_magazine = self.shots_in_magazine.saturating_sub(1);
            if self.shots_in_magazine == 0 {
                self.reloading = true;
                timers.schedule(now + self.config.reload_time, TimerTask::FinishReload(self.id));
            }
        }

        if self.config.burst_length == 0 {
            return true;
        }
        self.burst_count += 1;
        if self.burst_count >= self.config.burst_length {
            self.burst_count = 0;
            true
        } else {
            false
        }
    }

    /// Track `target`, or stop tracking.
    pub fn track(&mut self, target: Option<VesselId>) {
        if target != self.target {
            self.tracker.clear();
            self.solution = None;
        }
        self.target = target;
    }

    /// Muzzle position given the vessel's center.
    pub fn muzzle(&self, vessel_position: DVec3) -> DVec3 {
        vessel_position + self.mount_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon(config: WeaponConfig) -> (Weapon, TimerQueue, Vec<CombatEvent>) {
        (Weapon::new(WeaponId(0), config, VesselId(1), DVec3::ZERO), TimerQueue::new(), Vec::new())
    }

    fn drain(w: &mut Weapon, timers: &mut TimerQueue, now: f64, events: &mut Vec<CombatEvent>) {
        while let Some((handle, task)) = timers.pop_due(now) {
            w.complete(handle, task, events);
        }
    }

    #[test]
    fn enable_powers_up_after_deploy() {
        let (mut w, mut timers, mut events) = weapon(WeaponConfig {
            deploy_time: 0.5,
            ..WeaponConfig::default()
        });
        assert!(w.enable(&mut timers, 0.0, &mut events));
        assert_eq!(w.state, WeaponState::PoweringUp);
        assert!(!w.enable(&mut timers, 0.1, &mut events), "enable while powering up is ignored");
        drain(&mut w, &mut timers, 0.4, &mut events);
        assert_eq!(w.state, WeaponState::PoweringUp);
        drain(&mut w, &mut timers, 0.5, &mut events);
        assert_eq!(w.state, WeaponState::Enabled);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn disable_cancels_pending_power_up() {
        let (mut w, mut timers, mut events) = weapon(WeaponConfig {
            deploy_time: 1.0,
            ..WeaponConfig::default()
        });
        w.enable(&mut timers, 0.0, &mut events);
        assert!(w.disable(&mut timers, 0.2, &mut events));
        drain(&mut w, &mut timers, 5.0, &mut events);
        assert_eq!(w.state, WeaponState::Disabled, "stale power-up must not re-enable");
        assert!(!w.disable(&mut timers, 6.0, &mut events));
    }

    #[test]
    fn locked_weapon_refuses_enable_and_standby() {
        let (mut w, mut timers, mut events) = weapon(WeaponConfig::default());
        w.enable(&mut timers, 0.0, &mut events);
        drain(&mut w, &mut timers, 0.0, &mut events);
        assert!(w.lock(&mut timers, &mut events));
        assert!(!w.enable(&mut timers, 0.0, &mut events));
        assert!(!w.standby(&mut timers, 0.0, &mut events));
        assert!(w.unlock(&mut events));
        assert_eq!(w.state, WeaponState::Enabled);
    }

    #[test]
    fn standby_from_enabled_is_immediate() {
        let (mut w, mut timers, mut events) = weapon(WeaponConfig::default());
        w.enable(&mut timers, 0.0, &mut events);
        drain(&mut w, &mut timers, 0.0, &mut events);
        assert!(w.standby(&mut timers, 0.0, &mut events));
        assert_eq!(w.state, WeaponState::Standby);
        assert!(!w.standby(&mut timers, 0.0, &mut events));
    }

    #[test]
    fn fire_gate_spacing() {
        let (mut w, mut timers, _) = weapon(WeaponConfig {
            rounds_per_minute: 600.0,
            barrels: 2,
            ..WeaponConfig::default()
        });
        w.state = WeaponState::Enabled;
        assert!((w.config.time_between_shots() - 0.2).abs() < 1e-12);
        assert_eq!(w.blocking_outcome(true, true), None);
        w.record_shot(&mut timers, 0.0);
        assert_eq!(w.blocking_outcome(true, true), Some(FireOutcome::NotReady));
        for _ in 0..9 {
            w.update(DT);
        }
        assert_eq!(w.blocking_outcome(true, true), Some(FireOutcome::NotReady));
        w.update(2.0 * DT);
        assert_eq!(w.blocking_outcome(true, true), None);
        assert_eq!(w.blocking_outcome(false, true), Some(FireOutcome::NotOurTurn));
    }

    #[test]
    fn overheat_and_recovery() {
        let (mut w, mut timers, _) = weapon(WeaponConfig {
            max_heat: 100.0,
            heat_per_shot: 40.0,
            heat_loss: 50.0,
            burst_length: 5,
            ..WeaponConfig::default()
        });
        for _ in 0..3 {
            w.record_shot(&mut timers, 0.0);
        }
        assert!(w.overheated);
        assert_eq!(w.burst_count, 3);
        w.update(1.0);
        assert!(w.overheated, "70 is above a third of max heat");
        w.update(1.0);
        assert!(!w.overheated);
        assert_eq!(w.burst_count, 0, "recovery resets the burst");
    }

    #[test]
    fn burst_ends_after_length() {
        let (mut w, mut timers, _) = weapon(WeaponConfig {
            burst_length: 3,
            max_heat: 0.0,
            ..WeaponConfig::default()
        });
        let ends: Vec<bool> = (0..6).map(|_| w.record_shot(&mut timers, 0.0)).collect();
        assert_eq!(ends, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn empty_magazine_reloads() {
        let (mut w, mut timers, mut events) = weapon(WeaponConfig {
            shots_per_reload: 2,
            reload_time: 3.0,
            ..WeaponConfig::default()
        });
        w.state = WeaponState::Enabled;
        w.record_shot(&mut timers, 0.0);
        assert!(!w.reloading);
        w.record_shot(&mut timers, 0.5);
        assert!(w.reloading);
        w.time_since_last_shot = 10.0;
        assert_eq!(w.blocking_outcome(true, true), Some(FireOutcome::Reloading));
        drain(&mut w, &mut timers, 3.5, &mut events);
        assert!(!w.reloading);
        assert_eq!(w.shots_in_magazine, 2);
    }

    #[test]
    fn charge_time_delays_first_shot() {
        let (mut w, _, _) = weapon(WeaponConfig {
            charge_time: 0.1,
            ..WeaponConfig::default()
        });
        w.state = WeaponState::Enabled;
        w.trigger = true;
        assert_eq!(w.blocking_outcome(true, true), Some(FireOutcome::Charging));
        for _ in 0..6 {
            w.update(DT);
        }
        assert_eq!(w.blocking_outcome(true, true), None);
        w.trigger = false;
        w.update(DT);
        assert!(!w.charged(), "releasing the trigger drops the charge");
    }

    #[test]
    fn ammo_is_all_or_nothing() {
        let mut store = AmmoStore::new(5);
        assert_eq!(store.request(3), 3);
        assert_eq!(store.request(3), 0);
        assert_eq!(store.remaining(), Some(2));
        assert_eq!(AmmoStore::unlimited().request(1_000), 1_000);
    }
}
