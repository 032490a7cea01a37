//! Deferred work on the session clock.
//!
//! Weapon transitions and ripple hand-offs that complete "later" are entries
//! here rather than anything asynchronous. The session pops due entries at
//! the start of each tick, in due-time order.

use ordnance_core::types::{RippleGroupId, WeaponId};

/// Continuations the session knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    FinishPowerUp(WeaponId),
    FinishPowerDown(WeaponId),
    FinishStandby(WeaponId),
    FinishReload(WeaponId),
    AdvanceRipple(RippleGroupId),
}

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry {
    due: f64,
    handle: TimerHandle,
    task: TimerTask,
}

/// Tasks ordered by due time; ties run in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
    next_handle: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let index = self.entries.partition_point(|e| e.due <= due);
        self.entries.insert(index, TimerEntry { due, handle, task });
        handle
    }

    /// Remove a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.handle == handle) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Next task due at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerHandle, TimerTask)> {
        if self.entries.first().is_some_and(|e| e.due <= now) {
            let entry = self.entries.remove(0);
            Some((entry.handle, entry.task))
        } else {
            None
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(2.0, TimerTask::FinishReload(WeaponId(0)));
        q.schedule(1.0, TimerTask::FinishPowerUp(WeaponId(1)));
        q.schedule(1.0, TimerTask::FinishPowerUp(WeaponId(2)));
        assert_eq!(q.pop_due(0.5), None);
        assert_eq!(q.pop_due(1.5).map(|(_, t)| t), Some(TimerTask::FinishPowerUp(WeaponId(1))));
        assert_eq!(q.pop_due(1.5).map(|(_, t)| t), Some(TimerTask::FinishPowerUp(WeaponId(2))));
        assert_eq!(q.pop_due(1.5), None);
        assert_eq!(q.pop_due(2.0).map(|(_, t)| t), Some(TimerTask::FinishReload(WeaponId(0))));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_task_never_runs() {
        let mut q = TimerQueue::new();
        let h = q.schedule(1.0, TimerTask::FinishPowerDown(WeaponId(0)));
        assert!(q.is_pending(h));
        assert!(q.cancel(h));
        assert!(!q.cancel(h), "second cancel is a no-op");
        assert_eq!(q.pop_due(10.0), None);
    }
}
