//! Wall-clock scheduler backed by tokio.
//!
//! Each timer is a spawned task that sends its deliveries into one
//! channel. `cancel` aborts the task and forgets the token, and `recv`
//! discards anything still queued for a forgotten token, so a cancelled
//! timer can never be observed after `cancel` returns.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{CancelToken, Fired, Scheduler, TimerTask};

struct Running {
    handle: JoinHandle<()>,
    repeating: bool,
}

pub struct TokioScheduler {
    started: Instant,
    next_id: u64,
    timers: HashMap<CancelToken, Running>,
    tx: mpsc::UnboundedSender<Fired>,
    rx: mpsc::UnboundedReceiver<Fired>,
}

impl TokioScheduler {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            started: Instant::now(),
            next_id: 0,
            timers: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Wait for the next delivery from a live timer.
    pub async fn recv(&mut self) -> Option<Fired> {
        loop {
            let fired = self.rx.recv().await?;
            let Some(running) = self.timers.get(&fired.token) else {
                continue;
            };
            if !running.repeating {
                self.timers.remove(&fired.token);
            }
            return Some(fired);
        }
    }

    fn next_token(&mut self) -> CancelToken {
        self.next_id += 1;
        CancelToken::new(self.next_id)
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn schedule_repeating(&mut self, interval_ms: u64, task: TimerTask) -> CancelToken {
        let token = self.next_token();
        let tx = self.tx.clone();
        let period = Duration::from_millis(interval_ms.max(1));

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // A late tick is delivered late, never twice.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Fired { token, task }).is_err() {
                    break;
                }
            }
        });

        self.timers.insert(
            token,
            Running {
                handle,
                repeating: true,
            },
        );
        token
    }

    fn schedule_once(&mut self, delay_ms: u64, task: TimerTask) -> CancelToken {
        let token = self.next_token();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = tx.send(Fired { token, task });
        });

        self.timers.insert(
            token,
            Running {
                handle,
                repeating: false,
            },
        );
        token
    }

    fn cancel(&mut self, token: CancelToken) {
        if let Some(running) = self.timers.remove(&token) {
            running.handle.abort();
        }
    }

    fn is_live(&self, token: CancelToken) -> bool {
        self.timers.contains_key(&token)
    }

    fn live_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, running) in self.timers.drain() {
            running.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn repeating_timer_delivers_ticks() {
        let mut scheduler = TokioScheduler::new();
        let token = scheduler.schedule_repeating(1_000, TimerTask::SessionTick);
        for _ in 0..3 {
            let fired = scheduler.recv().await.unwrap();
            assert_eq!(fired.token, token);
        }
        assert!(scheduler.is_live(token));
    }

    #[tokio::test(start_paused = true)]
    async fn once_timer_is_forgotten_after_delivery() {
        let mut scheduler = TokioScheduler::new();
        let token = scheduler.schedule_once(500, TimerTask::SessionTick);
        assert_eq!(scheduler.recv().await.map(|f| f.token), Some(token));
        assert!(!scheduler.is_live(token));
        assert_eq!(scheduler.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_queued_deliveries() {
        let mut scheduler = TokioScheduler::new();
        let token = scheduler.schedule_repeating(1_000, TimerTask::SessionTick);
        scheduler.recv().await.unwrap();

        time::advance(Duration::from_millis(3_500)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        scheduler.cancel(token);
        scheduler.cancel(token);

        let next = time::timeout(Duration::from_secs(10), scheduler.recv()).await;
        assert!(next.is_err(), "no delivery may follow cancel");
        assert_eq!(scheduler.live_count(), 0);
    }
}
