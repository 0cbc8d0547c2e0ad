//! # Poll-and-Match Engine
//! Polls the live feed after the scheduler wakes up, matches every catalog
//! event to a feed entry and stops once all of them carry an actual value.
//!
//! There is no failure exit: fetch errors and unparsable markup both just mean
//! "not published yet" and the loop keeps going, at the coarse interval until
//! the release instant and at the fine interval from then on.

use anyhow::Result;
use chrono::NaiveDateTime;
use metrics::{counter, gauge};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::extract::extract_actual;
use crate::ingest::fetch_or_empty;
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::scheduler::{wait_for_release, ReleasePlan};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_FINAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A catalog event as seen in one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    pub title: String,
    pub previous: Option<String>,
    pub consensus: Option<String>,
    pub actual: Option<String>,
    pub invert_statistic: bool,
    pub total_event_count: usize,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("gave up after {polls} polls without all actual values")]
    PollLimitReached { polls: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub final_interval: Duration,
    /// `None` polls until the data shows up.
    pub max_polls: Option<u64>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            final_interval: DEFAULT_FINAL_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

/// Polling interval that drops to the fine value once the release instant is
/// reached and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    current: Duration,
    fine: Duration,
}

impl Cadence {
    pub fn new(coarse: Duration, fine: Duration) -> Self {
        Self {
            current: coarse,
            fine,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn is_fine(&self) -> bool {
        self.current == self.fine
    }

    /// Interval for the next sleep, given the time now.
    pub fn next(&mut self, now: NaiveDateTime, release_at: NaiveDateTime) -> Duration {
        if now >= release_at {
            self.current = self.fine;
        }
        self.current
    }
}

/// First entry whose title contains `title`, ignoring case.
pub fn find_entry<'a>(entries: &'a [FeedEntry], title: &str) -> Option<&'a FeedEntry> {
    let needle = title.to_lowercase();
    entries
        .iter()
        .find(|e| e.title.to_lowercase().contains(&needle))
}

/// One `ObservedEvent` per catalog event, in catalog order.
pub fn match_events(entries: &[FeedEntry], catalog: &Catalog) -> Vec<ObservedEvent> {
    let total = catalog.len();
    catalog
        .iter()
        .map(|ev| {
            let actual = find_entry(entries, &ev.title).and_then(|e| extract_actual(&e.body));
            ObservedEvent {
                title: ev.title.clone(),
                previous: ev.previous.clone(),
                consensus: ev.consensus.clone(),
                actual,
                invert_statistic: ev.invert_statistic,
                total_event_count: total,
            }
        })
        .collect()
}

pub fn all_observed(events: &[ObservedEvent]) -> bool {
    events.iter().all(|e| e.actual.is_some())
}

/// Poll `feed` until every catalog event has an actual value.
pub async fn poll_until_observed(
    feed: &dyn FeedSource,
    clock: &dyn Clock,
    catalog: &Catalog,
    release_at: NaiveDateTime,
    opts: &PollOptions,
) -> Result<Vec<ObservedEvent>, MonitorError> {
    crate::metrics::ensure_metrics_described();

    let mut cadence = Cadence::new(opts.interval, opts.final_interval);
    let mut polls: u64 = 0;

    loop {
        if opts.max_polls.is_some_and(|max| polls >= max) {
            tracing::warn!(target: "watch", polls, "poll limit reached");
            return Err(MonitorError::PollLimitReached { polls });
        }
        polls += 1;
        counter!("watch_polls_total").increment(1);

        let entries = fetch_or_empty(feed).await;
        if entries.is_empty() {
            tracing::info!(target: "watch", poll = polls, "no data fetched from feed, retrying");
            clock.sleep(cadence.current()).await;
            continue;
        }

        let observed = match_events(&entries, catalog);
        let pending = observed.iter().filter(|e| e.actual.is_none()).count();
        gauge!("watch_events_pending").set(pending as f64);

        if all_observed(&observed) {
            tracing::info!(target: "watch", poll = polls, events = observed.len(), "all actual values available");
            return Ok(observed);
        }

        let wait = cadence.next(clock.now(), release_at);
        tracing::info!(
            target: "watch",
            poll = polls,
            pending,
            interval_ms = wait.as_millis() as u64,
            "not all actual values are available yet, retrying"
        );
        clock.sleep(wait).await;
    }
}

/// Whole run: sleep to the buffer, poll, then write the rows to `out`.
pub async fn run_watch(
    feed: &dyn FeedSource,
    clock: &dyn Clock,
    catalog: &Catalog,
    plan: &ReleasePlan,
    opts: &PollOptions,
    out: &Path,
) -> Result<Vec<ObservedEvent>> {
    wait_for_release(clock, plan).await;
    let observed = poll_until_observed(feed, clock, catalog, plan.release_at, opts).await?;
    crate::sink::write_results(&observed, out).await?;
    tracing::info!(
        target: "watch",
        at = %clock.now(),
        path = %out.display(),
        "data written to file"
    );
    Ok(observed)
}
