//! Reusable slots for projectiles and explosions.
//!
//! Every spawned projectile or explosion holds a `PoolSlot` from the pool of
//! its prototype. Slots are released exactly once; a second release or a
//! stale generation is reported as an error instead of corrupting the pool.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{error, warn};

use ordnance_core::components::PoolSlot;
use ordnance_core::constants::*;
use ordnance_core::error::{OrdnanceError, Result};

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    generation: u32,
    in_use: bool,
}

/// Growable free list of slots for one prototype.
#[derive(Debug, Clone)]
pub struct ObjectPool {
    name: String,
    slots: Vec<SlotState>,
    free: Vec<usize>,
}

impl ObjectPool {
    pub fn new(name: impl Into<String>, initial_size: usize) -> Self {
        Self {
            name: name.into(),
            slots: vec![SlotState::default(); initial_size],
            // Pop from the back so slot 0 is handed out first.
            free: (0..initial_size).rev().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acquire(&mut self) -> PoolSlot {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                // Double the pool when it runs dry.
                let old = self.slots.len();
                let grow = old.max(1);
                self.slots.resize(old + grow, SlotState::default());
                self.free.extend((old + 1..old + grow).rev());
                old
            }
        };
        let state = &mut self.slots[slot];
        state.in_use = true;
        PoolSlot {
            pool: self.name.clone(),
            slot,
            generation: state.generation,
        }
    }

    /// Check that `slot` is still the live holder of its slot.
    pub fn check(&self, slot: &PoolSlot) -> Result<()> {
        match self.slots.get(slot.slot) {
            Some(state) if state.in_use && state.generation == slot.generation => Ok(()),
            _ => Err(OrdnanceError::UseAfterRelease {
                pool: self.name.clone(),
                slot: slot.slot,
            }),
        }
    }

    pub fn release(&mut self, slot: &PoolSlot) -> Result<()> {
        let live = self
            .slots
            .get(slot.slot)
            .is_some_and(|s| s.in_use && s.generation == slot.generation);
        if !live {
            return Err(OrdnanceError::PoolMisuse {
                pool: self.name.clone(),
                slot: slot.slot,
            });
        }
        let state = &mut self.slots[slot.slot];
        state.in_use = false;
        state.generation = state.generation.wrapping_add(1);
        self.free.push(slot.slot);
        Ok(())
    }

    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Pools keyed by prototype path, created on first use.
#[derive(Debug, Clone)]
pub struct Registry {
    prototypes: BTreeSet<String>,
    pools: BTreeMap<String, ObjectPool>,
}

impl Default for Registry {
    fn default() -> Self {
        let prototypes = [DEFAULT_BULLET_MODEL, DEFAULT_EXPLOSION_MODEL, DEFAULT_EXPLOSION_SOUND]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            prototypes,
            pools: BTreeMap::new(),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a prototype path known to the registry.
    pub fn register_prototype(&mut self, path: impl Into<String>) {
        self.prototypes.insert(path.into());
    }

    pub fn is_registered(&self, path: &str) -> bool {
        self.prototypes.contains(path)
    }

    /// `path` if registered, otherwise `fallback` (logged).
    pub fn resolve<'a>(&self, path: &'a str, fallback: &'a str) -> &'a str {
        if self.is_registered(path) {
            path
        } else {
            error!(path, fallback, "unknown prototype, using default");
            fallback
        }
    }

    /// Acquire from the pool for `path`, falling back to `fallback` when
    /// the prototype is unknown.
    pub fn acquire(&mut self, path: &str, fallback: &str) -> PoolSlot {
        let path = self.resolve(path, fallback).to_string();
        self.pools
            .entry(path.clone())
            .or_insert_with(|| ObjectPool::new(path, POOL_INITIAL_SIZE))
            .acquire()
    }

    pub fn release(&mut self, slot: &PoolSlot) -> Result<()> {
        match self.pools.get_mut(&slot.pool) {
            Some(pool) => pool.release(slot),
            None => Err(OrdnanceError::PoolMisuse {
                pool: slot.pool.clone(),
                slot: slot.slot,
            }),
        }
    }

    pub fn check(&self, slot: &PoolSlot) -> Result<()> {
        match self.pools.get(&slot.pool) {
            Some(pool) => pool.check(slot),
            None => Err(OrdnanceError::UseAfterRelease {
                pool: slot.pool.clone(),
                slot: slot.slot,
            }),
        }
    }

    pub fn pool(&self, path: &str) -> Option<&ObjectPool> {
        self.pools.get(path)
    }

    /// Slots held across all pools.
    pub fn in_use(&self) -> usize {
        self.pools.values().map(ObjectPool::in_use).sum()
    }

    /// Drop every pool. Returns how many slots were still held.
    pub fn teardown(&mut self) -> usize {
        let leaked = self.in_use();
        if leaked > 0 {
            warn!(leaked, "tearing down pools with live slots");
        }
        self.pools.clear();
        leaked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_reuses_slot() {
        let mut pool = ObjectPool::new("p", 2);
        let a = pool.acquire();
        pool.release(&a).unwrap();
        let b = pool.acquire();
        assert_eq!(a.slot, b.slot);
        assert_ne!(a.generation, b.generation);
        assert!(pool.check(&a).is_err(), "stale handle must not pass");
        assert!(pool.check(&b).is_ok());
    }

    #[test]
    fn double_release_is_misuse() {
        let mut pool = ObjectPool::new("p", 1);
        let a = pool.acquire();
        pool.release(&a).unwrap();
        assert!(matches!(pool.release(&a), Err(OrdnanceError::PoolMisuse { .. })));
    }

    #[test]
    fn pool_grows_when_empty() {
        let mut pool = ObjectPool::new("p", 1);
        let slots: Vec<PoolSlot> = (0..5).map(|_| pool.acquire()).collect();
        assert_eq!(pool.in_use(), 5);
        assert!(pool.capacity() >= 5);
        let mut ids: Vec<usize> = slots.iter().map(|s| s.slot).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5, "slots handed out twice");
    }

    #[test]
    fn unknown_prototype_falls_back() {
        let mut registry = Registry::new();
        let slot = registry.acquire("mods/missing/model", DEFAULT_BULLET_MODEL);
        assert_eq!(slot.pool, DEFAULT_BULLET_MODEL);
        registry.register_prototype("mods/flak");
        let slot = registry.acquire("mods/flak", DEFAULT_BULLET_MODEL);
        assert_eq!(slot.pool, "mods/flak");
        assert_eq!(registry.in_use(), 2);
        assert_eq!(registry.teardown(), 2);
        assert!(registry.pool("mods/flak").is_none());
    }

    #[test]
    fn release_into_unknown_pool_is_misuse() {
        let mut registry = Registry::new();
        let stray = PoolSlot {
            pool: "nowhere".into(),
            slot: 0,
            generation: 0,
        };
        assert!(matches!(registry.release(&stray), Err(OrdnanceError::PoolMisuse { .. })));
    }
}
