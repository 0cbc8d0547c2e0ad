// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod scheduler;
pub mod sink;

// ---- Re-exports for stable public API ----
pub use crate::catalog::{build_catalog, fetch_snapshot, Catalog, CatalogError, Snapshot};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::ingest::types::{FeedEntry, FeedSource};
pub use crate::monitor::{run_watch, ObservedEvent, PollOptions};
pub use crate::scheduler::{compute_wait, ReleasePlan};
