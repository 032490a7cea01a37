//! Ripple fire: weapons in a group take turns.
//!
//! Each member gets an index `0..N` when it joins. Only the member whose
//! index matches the shared counter may fire; after its shot (or burst) the
//! counter moves on, wrapping to 0 at N. A member holding the exclusivity
//! latch (mid-burst) keeps the turn until it lets go.

use ordnance_core::types::{RippleGroupId, WeaponId};

use crate::scheduler::TimerHandle;

#[derive(Debug, Clone)]
pub struct RippleGroup {
    pub id: RippleGroupId,
    members: Vec<WeaponId>,
    index: u32,
    latch: Option<WeaponId>,
    /// Set once the group has fired; later hand-offs skip the initial delay.
    pub ripple_firing: bool,
    /// Hand-off already waiting on the timer queue.
    pub pending_advance: Option<TimerHandle>,
}

impl RippleGroup {
    pub fn new(id: RippleGroupId) -> Self {
        Self {
            id,
            members: Vec::new(),
            index: 0,
            latch: None,
            ripple_firing: false,
            pending_advance: None,
        }
    }

    /// Add a weapon and return its ripple index.
    pub fn join(&mut self, weapon: WeaponId) -> u32 {
        if let Some(existing) = self.members.iter().position(|w| *w == weapon) {
            return existing as u32;
        }
        self.members.push(weapon);
        (self.members.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[WeaponId] {
        &self.members
    }

    /// Index whose turn it is.
    pub fn current(&self) -> u32 {
        self.index
    }

    pub fn is_turn(&self, ripple_index: u32) -> bool {
        self.index == ripple_index
    }

    /// Free, or held by `weapon` itself.
    pub fn latch_free_for(&self, weapon: WeaponId) -> bool {
        self.latch.map_or(true, |holder| holder == weapon)
    }

    pub fn acquire_latch(&mut self, weapon: WeaponId) -> bool {
        if self.latch_free_for(weapon) {
            self.latch = Some(weapon);
            true
        } else {
            false
        }
    }

    pub fn release_latch(&mut self, weapon: WeaponId) {
        if self.latch == Some(weapon) {
            self.latch = None;
        }
    }

    /// Move the turn to the next member and return the new index.
    pub fn advance(&mut self) -> u32 {
        let n = self.members.len() as u32;
        self.index += 1;
        if self.index >= n {
            self.index = 0;
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_assigned_in_join_order() {
        let mut group = RippleGroup::new(RippleGroupId(0));
        assert_eq!(group.join(WeaponId(7)), 0);
        assert_eq!(group.join(WeaponId(3)), 1);
        assert_eq!(group.join(WeaponId(7)), 0, "rejoining keeps the index");
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn advance_wraps_at_group_size() {
        let mut group = RippleGroup::new(RippleGroupId(0));
        for w in 0..3 {
            group.join(WeaponId(w));
        }
        let visited: Vec<u32> = (0..4).map(|_| group.advance()).collect();
        assert_eq!(visited, vec![1, 2, 0, 1]);
    }

    #[test]
    fn latch_excludes_other_members() {
        let mut group = RippleGroup::new(RippleGroupId(0));
        group.join(WeaponId(0));
        group.join(WeaponId(1));
        assert!(group.acquire_latch(WeaponId(0)));
        assert!(!group.latch_free_for(WeaponId(1)));
        assert!(group.latch_free_for(WeaponId(0)));
        group.release_latch(WeaponId(1));
        assert!(!group.latch_free_for(WeaponId(1)), "only the holder releases");
        group.release_latch(WeaponId(0));
        assert!(group.latch_free_for(WeaponId(1)));
    }
}
