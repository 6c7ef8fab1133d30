//! Virtual clock for deterministic runs.
//!
//! Time only moves when the caller asks for the next due timer. Timers due
//! at the same instant fire in the order they were scheduled, and a
//! repeating timer is rescheduled one interval after its own deadline.

use std::collections::BTreeMap;

use super::{CancelToken, Fired, Scheduler, TimerTask};

#[derive(Debug, Clone)]
struct Entry {
    task: TimerTask,
    due_ms: u64,
    interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<CancelToken, Entry>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the earliest live timer due at or before `until_ms`, moving the
    /// clock to its deadline. Returns `None` once nothing else is due.
    pub fn next_due(&mut self, until_ms: u64) -> Option<Fired> {
        let (&token, entry) = self
            .timers
            .iter()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by_key(|(token, e)| (e.due_ms, **token))?;

        let (task, due_ms, interval_ms) = (entry.task, entry.due_ms, entry.interval_ms);
        match interval_ms {
            Some(interval) => {
                if let Some(e) = self.timers.get_mut(&token) {
                    e.due_ms = due_ms.saturating_add(interval.max(1));
                }
            }
            None => {
                self.timers.remove(&token);
            }
        }
        self.now_ms = self.now_ms.max(due_ms);
        Some(Fired { token, task })
    }

    /// Move the clock forward without firing anything.
    ///
    /// Timers that fall due in between stay pending and fire on the next
    /// `next_due` call, late but exactly once.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn insert(&mut self, due_ms: u64, interval_ms: Option<u64>, task: TimerTask) -> CancelToken {
        self.next_id += 1;
        let token = CancelToken::new(self.next_id);
        self.timers.insert(
            token,
            Entry {
                task,
                due_ms,
                interval_ms,
            },
        );
        token
    }
}

impl Scheduler for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule_repeating(&mut self, interval_ms: u64, task: TimerTask) -> CancelToken {
        let due = self.now_ms.saturating_add(interval_ms);
        self.insert(due, Some(interval_ms), task)
    }

    fn schedule_once(&mut self, delay_ms: u64, task: TimerTask) -> CancelToken {
        let due = self.now_ms.saturating_add(delay_ms);
        self.insert(due, None, task)
    }

    fn cancel(&mut self, token: CancelToken) {
        self.timers.remove(&token);
    }

    fn is_live(&self, token: CancelToken) -> bool {
        self.timers.contains_key(&token)
    }

    fn live_count(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_timer_fires_every_interval() {
        let mut clock = ManualClock::new();
        let token = clock.schedule_repeating(1_000, TimerTask::SessionTick);

        let mut fired = 0;
        while let Some(f) = clock.next_due(3_500) {
            assert_eq!(f.token, token);
            fired += 1;
        }
        assert_eq!(fired, 3);
        assert_eq!(clock.now_ms(), 3_000);
        assert!(clock.is_live(token));
    }

    #[test]
    fn once_timer_fires_a_single_time() {
        let mut clock = ManualClock::new();
        let token = clock.schedule_once(250, TimerTask::SessionTick);
        assert!(clock.next_due(100).is_none());
        assert_eq!(clock.next_due(1_000).map(|f| f.token), Some(token));
        assert!(clock.next_due(10_000).is_none());
        assert!(!clock.is_live(token));
    }

    #[test]
    fn cancel_is_idempotent_and_immediate() {
        let mut clock = ManualClock::new();
        let token = clock.schedule_repeating(1_000, TimerTask::SessionTick);
        clock.set_now(5_000);
        clock.cancel(token);
        clock.cancel(token);
        assert!(clock.next_due(10_000).is_none());
        assert_eq!(clock.live_count(), 0);
    }

    #[test]
    fn late_ticks_are_not_duplicated() {
        let mut clock = ManualClock::new();
        clock.schedule_repeating(1_000, TimerTask::SessionTick);
        clock.set_now(2_500);
        // Two deadlines passed while nobody polled: both fire once, in order.
        assert!(clock.next_due(2_500).is_some());
        assert!(clock.next_due(2_500).is_some());
        assert!(clock.next_due(2_500).is_none());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut clock = ManualClock::new();
        let first = clock.schedule_once(500, TimerTask::SessionTick);
        let second = clock.schedule_once(500, TimerTask::SessionTick);
        assert_eq!(clock.next_due(500).map(|f| f.token), Some(first));
        assert_eq!(clock.next_due(500).map(|f| f.token), Some(second));
    }
}
