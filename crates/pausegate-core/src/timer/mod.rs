mod clock;
mod manual;
mod realtime;

pub use clock::{CancelToken, Fired, Scheduler, TimerTask, TICK_INTERVAL_MS};
pub use manual::ManualClock;
pub use realtime::TokioScheduler;
