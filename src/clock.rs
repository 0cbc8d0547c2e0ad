//! Wall clock and sleep behind one seam, so the scheduler and the poll loop
//! can run against virtual time in tests.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Local wall-clock time; release instants are local too.
    fn now(&self) -> NaiveDateTime;
    async fn sleep(&self, d: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// Virtual clock: `sleep` returns immediately, advances `now` and records the delay.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, t: NaiveDateTime) {
        *self.now.lock().expect("clock mutex poisoned") = t;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock mutex poisoned").clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("clock mutex poisoned")
    }

    async fn sleep(&self, d: Duration) {
        self.sleeps.lock().expect("clock mutex poisoned").push(d);
        let step = TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = now.checked_add_signed(step).unwrap_or(NaiveDateTime::MAX);
    }
}
