use serde::{Deserialize, Serialize};

/// Interval of the session countdown timers.
pub const TICK_INTERVAL_MS: u64 = 1_000;

/// Handle to a scheduled timer. Cancelling is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CancelToken(u64);

impl CancelToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerTask {
    /// One second of the active session countdown.
    SessionTick,
}

/// A timer delivery, handed to the controller in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub token: CancelToken,
    pub task: TimerTask,
}

/// Source of timer deliveries.
///
/// Implementations must drop deliveries for a token once `cancel` returned,
/// including deliveries that were already due or queued.
pub trait Scheduler {
    /// Milliseconds on this scheduler's own timeline.
    fn now_ms(&self) -> u64;

    fn schedule_repeating(&mut self, interval_ms: u64, task: TimerTask) -> CancelToken;

    fn schedule_once(&mut self, delay_ms: u64, task: TimerTask) -> CancelToken;

    fn cancel(&mut self, token: CancelToken);

    fn is_live(&self, token: CancelToken) -> bool;

    /// Number of timers that can still fire.
    fn live_count(&self) -> usize;
}
