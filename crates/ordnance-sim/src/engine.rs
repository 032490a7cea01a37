//! Combat session: the fixed-tick driver of weapons, projectiles and blasts.
//!
//! `CombatSession` owns the hecs world of projectiles and explosions, the
//! mounted weapons, ripple groups, timer queue and pools. The host world is
//! borrowed through the `Host` traits and owned by the session so tests and
//! tools can drive everything from one value. Completely headless and
//! deterministic for a given seed.

use std::collections::VecDeque;

use glam::DVec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, trace};

use ordnance_core::commands::SessionCommand;
use ordnance_core::components::Kinematics;
use ordnance_core::config::{NuclearConfig, SimConfig, WeaponConfig};
use ordnance_core::enums::{FireOutcome, ReleaseReason};
use ordnance_core::error::{OrdnanceError, Result};
use ordnance_core::events::CombatEvent;
use ordnance_core::types::{RippleGroupId, SimTime, SourceInfo, VesselId, WeaponId};

use crate::blast::Detonation;
use crate::host::{Host, ScoringLedger};
use crate::pool::Registry;
use crate::ripple::RippleGroup;
use crate::scheduler::{TimerQueue, TimerTask};
use crate::systems;
use crate::systems::projectile::ProjectileSpawn;
use crate::systems::Termination;
use crate::weapon::Weapon;

/// A running engagement over one host world.
pub struct CombatSession<H: Host, L: ScoringLedger> {
    config: SimConfig,
    world: World,
    host: H,
    ledger: L,
    time: SimTime,
    rng: ChaCha8Rng,
    timers: TimerQueue,
    registry: Registry,
    weapons: Vec<Weapon>,
    ripple_groups: Vec<RippleGroup>,
    command_queue: VecDeque<SessionCommand>,
    terminations: Vec<Termination>,
    despawn_buffer: Vec<Entity>,
    events: Vec<CombatEvent>,
}

impl<H: Host, L: ScoringLedger> CombatSession<H, L> {
    /// Create a session over `host`, scoring into `ledger`.
    pub fn new(config: SimConfig, host: H, ledger: L) -> Self {
        let config = config.validated();
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            world: World::new(),
            host,
            ledger,
            time: SimTime::default(),
            timers: TimerQueue::new(),
            registry: Registry::new(),
            weapons: Vec::new(),
            ripple_groups: Vec::new(),
            command_queue: VecDeque::new(),
            terminations: Vec::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Mount a weapon on `vessel`. It starts disabled with unlimited ammo.
    pub fn add_weapon(&mut self, config: WeaponConfig, vessel: VesselId, mount_offset: DVec3) -> WeaponId {
        let id = WeaponId(self.weapons.len() as u32);
        if !config.ammo.model.is_empty() {
            self.registry.register_prototype(config.ammo.model.clone());
        }
        self.weapons.push(Weapon::new(id, config, vessel, mount_offset));
        id
    }

    pub fn weapon(&self, id: WeaponId) -> Result<&Weapon> {
        self.weapons
            .get(id.0 as usize)
            .ok_or(OrdnanceError::UnknownWeapon(id))
    }

    pub fn weapon_mut(&mut self, id: WeaponId) -> Result<&mut Weapon> {
        self.weapons
            .get_mut(id.0 as usize)
            .ok_or(OrdnanceError::UnknownWeapon(id))
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn create_ripple_group(&mut self) -> RippleGroupId {
        let id = RippleGroupId(self.ripple_groups.len() as u32);
        self.ripple_groups.push(RippleGroup::new(id));
        id
    }

    /// Add a weapon to a ripple group and return its ripple index.
    pub fn join_ripple_group(&mut self, group: RippleGroupId, weapon: WeaponId) -> Result<u32> {
        let ripple = self
            .ripple_groups
            .get_mut(group.0 as usize)
            .ok_or(OrdnanceError::UnknownRippleGroup(group.0))?;
        let weapon = self
            .weapons
            .get_mut(weapon.0 as usize)
            .ok_or(OrdnanceError::UnknownWeapon(weapon))?;
        let index = ripple.join(weapon.id);
        weapon.ripple = Some((group, index));
        Ok(index)
    }

    pub fn ripple_group(&self, group: RippleGroupId) -> Result<&RippleGroup> {
        self.ripple_groups
            .get(group.0 as usize)
            .ok_or(OrdnanceError::UnknownRippleGroup(group.0))
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SessionCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SessionCommand>) {
        self.command_queue.extend(commands);
    }

    /// Set off a charge now, outside any projectile.
    pub fn detonate(&mut self, detonation: &Detonation) -> Entity {
        systems::explosion::spawn(
            &mut self.world,
            &self.host,
            &mut self.registry,
            &self.config.blast,
            detonation,
            self.time.elapsed_secs,
            &mut self.events,
        )
    }

    /// Put a projectile in flight directly.
    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Entity {
        systems::projectile::spawn(&mut self.world, &mut self.registry, &self.host, spawn)
    }

    /// Remove a projectile from flight without detonating it.
    pub fn kill_projectile(&mut self, entity: Entity) -> Result<()> {
        let position = self
            .world
            .get::<&Kinematics>(entity)
            .map(|k| k.position)
            .unwrap_or(DVec3::ZERO);
        let released = systems::cleanup::release_projectile(
            &self.world,
            &mut self.registry,
            entity,
            ReleaseReason::Killed,
            position,
            &mut self.events,
            &mut self.despawn_buffer,
        );
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
        released
    }

    /// Attempt one trigger cycle now, outside the tick loop.
    pub fn fire(&mut self, id: WeaponId) -> Result<FireOutcome> {
        let index = id.0 as usize;
        let weapon = self
            .weapons
            .get_mut(index)
            .ok_or(OrdnanceError::UnknownWeapon(id))?;
        let group = weapon
            .ripple
            .and_then(|(g, _)| self.ripple_groups.get_mut(g.0 as usize));
        Ok(systems::weapon::try_fire(
            &mut self.world,
            &self.host,
            &mut self.ledger,
            weapon,
            group,
            &mut self.timers,
            &mut self.registry,
            &mut self.rng,
            self.time.elapsed_secs,
            &mut self.events,
        ))
    }

    /// Advance the session by one tick and return the events it produced.
    pub fn tick(&mut self) -> Vec<CombatEvent> {
        self.process_commands();
        self.run_timers();
        self.run_systems();
        self.time.advance(self.config.fixed_dt);
        std::mem::take(&mut self.events)
    }

    /// Tick until `seconds` of session time have passed, collecting events.
    pub fn run_for(&mut self, seconds: f64) -> Vec<CombatEvent> {
        let end = self.time.elapsed_secs + seconds;
        let mut events = Vec::new();
        while self.time.elapsed_secs < end {
            events.extend(self.tick());
        }
        events
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read-only view of the projectile and explosion entities.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Return every pool slot. Returns how many were still held.
    pub fn teardown(&mut self) -> usize {
        self.world.clear();
        self.registry.teardown()
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single command.
    fn handle_command(&mut self, command: SessionCommand) {
        let now = self.time.elapsed_secs;
        if let SessionCommand::ArmNuclear { origin, config, source } = command {
            self.arm_nuclear(&config, origin, source);
            return;
        }
        let Some(id) = command.weapon() else {
            return;
        };
        let Some(weapon) = self.weapons.get_mut(id.0 as usize) else {
            error!(weapon = ?id, "command for unknown weapon");
            return;
        };
        let timers = &mut self.timers;
        let events = &mut self.events;
        match command {
            SessionCommand::EnableWeapon { .. } => {
                weapon.enable(timers, now, events);
            }
            SessionCommand::DisableWeapon { .. } => {
                weapon.disable(timers, now, events);
            }
            SessionCommand::StandbyWeapon { .. } => {
                weapon.standby(timers, now, events);
            }
            SessionCommand::LockWeapon { .. } => {
                weapon.lock(timers, events);
            }
            SessionCommand::UnlockWeapon { .. } => {
                weapon.unlock(events);
            }
            SessionCommand::SetTrigger { held, .. } => {
                weapon.trigger = held;
            }
            SessionCommand::AimAt { direction, .. } => {
                let direction = direction.normalize_or_zero();
                if weapon.target.is_none() && direction != DVec3::ZERO {
                    weapon.aim_direction = direction;
                }
            }
            SessionCommand::TrackTarget { target, .. } => {
                weapon.track(target);
            }
            SessionCommand::ArmNuclear { .. } => {}
        }
    }

    /// Arm a nuclear device at `origin`.
    pub fn arm_nuclear(&mut self, config: &NuclearConfig, origin: DVec3, source: SourceInfo) -> Entity {
        debug!(?origin, yield_kt = config.yield_kt, delay = config.delay, "nuclear device armed");
        systems::explosion::spawn_nuclear(
            &mut self.world,
            &self.host,
            &mut self.registry,
            config,
            origin,
            source,
            self.time.elapsed_secs,
        )
    }

    /// Run every deferred task that has come due.
    fn run_timers(&mut self) {
        let now = self.time.elapsed_secs;
        while let Some((handle, task)) = self.timers.pop_due(now) {
            trace!(?task, now, "timer due");
            match task {
                TimerTask::FinishPowerUp(id)
                | TimerTask::FinishPowerDown(id)
                | TimerTask::FinishStandby(id)
                | TimerTask::FinishReload(id) => {
                    if let Some(weapon) = self.weapons.get_mut(id.0 as usize) {
                        weapon.complete(handle, task, &mut self.events);
                    }
                }
                TimerTask::AdvanceRipple(id) => {
                    if let Some(group) = self.ripple_groups.get_mut(id.0 as usize) {
                        group.pending_advance = None;
                        let index = group.advance();
                        self.events.push(CombatEvent::RippleAdvanced { group: id, index });
                    }
                }
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let now = self.time.elapsed_secs;
        let dt = self.config.fixed_dt;
        // 1. Weapons (aim, gate, spawn)
        systems::weapon::run(
            &mut self.world,
            &self.host,
            &mut self.ledger,
            &mut self.weapons,
            &mut self.ripple_groups,
            &mut self.timers,
            &mut self.registry,
            &mut self.rng,
            now,
            dt,
            &mut self.events,
        );
        // 2. Proximity and timed fuzes
        systems::fuze::run(&mut self.world, &self.host, dt, &mut self.terminations);
        // 3. Projectile flight and collisions
        systems::projectile::run(
            &mut self.world,
            &mut self.host,
            &mut self.ledger,
            &mut self.rng,
            dt,
            &mut self.terminations,
            &mut self.events,
        );
        // 4. Detonate and release terminated projectiles
        systems::fuze::resolve(
            &mut self.world,
            &self.host,
            &mut self.registry,
            &self.config.blast,
            &mut self.rng,
            now,
            &mut self.terminations,
            &mut self.events,
            &mut self.despawn_buffer,
        );
        // 5. Blast event queues
        systems::explosion::run(
            &mut self.world,
            &mut self.host,
            &mut self.ledger,
            &mut self.registry,
            &self.config.blast,
            now,
            &mut self.events,
            &mut self.despawn_buffer,
        );
        // 6. Cleanup
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
    }
}

impl<H: Host + Default, L: ScoringLedger + Default> Default for CombatSession<H, L> {
    fn default() -> Self {
        Self::new(SimConfig::default(), H::default(), L::default())
    }
}
