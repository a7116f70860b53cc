// src/scheduler.rs
//
// Repeating tasks for the single-threaded event loop.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A periodic timer that can be started and stopped.
///
/// `stop` drops the underlying interval, so once it returns the task cannot
/// fire again. `tick` never resolves while stopped.
pub struct RepeatingTask {
    name: &'static str,
    period: Duration,
    interval: Option<Interval>,
}

impl RepeatingTask {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            interval: None,
        }
    }

    /// First tick fires one period from now. No-op if already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tlog!("[scheduler] {} task started ({:?})", self.name, self.period);
    }

    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            tlog!("[scheduler] {} task stopped", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
