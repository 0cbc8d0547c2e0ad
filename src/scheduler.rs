//! # Release Scheduler
//! Where the release sits on the local clock, and how long to sleep before
//! polling starts.

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::time::Duration;

use crate::clock::Clock;

/// A release instant plus how early polling should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePlan {
    pub release_at: NaiveDateTime,
    pub buffer_secs: u64,
}

impl ReleasePlan {
    /// `time_of_day` is `HH:MM` or `HH:MM:SS`; `date` falls back to `today`.
    pub fn from_parts(
        date: Option<NaiveDate>,
        time_of_day: &str,
        buffer_secs: u64,
        today: NaiveDate,
    ) -> Result<Self> {
        Ok(Self {
            release_at: date.unwrap_or(today).and_time(parse_time_of_day(time_of_day)?),
            buffer_secs,
        })
    }

    pub fn wait_from(&self, now: NaiveDateTime) -> Duration {
        compute_wait(self.release_at, self.buffer_secs, now)
    }
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow!("invalid release time {s:?}, expected HH:MM or HH:MM:SS"))
}

/// `release_at - now - buffer`, clamped at zero.
pub fn compute_wait(release_at: NaiveDateTime, buffer_secs: u64, now: NaiveDateTime) -> Duration {
    let buffer = TimeDelta::try_seconds(i64::try_from(buffer_secs).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    let diff = (release_at - now)
        .checked_sub(&buffer)
        .unwrap_or(TimeDelta::MIN);
    if diff <= TimeDelta::zero() {
        return Duration::ZERO;
    }
    diff.to_std().unwrap_or(Duration::ZERO)
}

/// Block until `buffer_secs` before the release (returns at once if that's past).
pub async fn wait_for_release(clock: &dyn Clock, plan: &ReleasePlan) {
    let wait = plan.wait_from(clock.now());
    if !wait.is_zero() {
        tracing::info!(
            target: "watch",
            secs = wait.as_secs_f64(),
            buffer_secs = plan.buffer_secs,
            release_at = %plan.release_at,
            "sleeping until release buffer"
        );
        clock.sleep(wait).await;
    }
    tracing::info!(target: "watch", now = %clock.now(), "awake");
}
