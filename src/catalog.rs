//! # Event Catalog
//! A bulk snapshot of the calendar feed, and the fixed set of events a run
//! watches, picked from that snapshot by index.

use anyhow::Result;
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

use crate::extract::{extract_row, sanitize_numeric, ExtractedRow};
use crate::ingest::types::{FeedEntry, FeedSource};

/// One row of the bulk snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub title: String,
    pub row: ExtractedRow,
}

/// Feed state at one point in time; indices into it select catalog events.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    rows: Vec<SnapshotRow>,
}

impl Snapshot {
    /// Entries whose data row doesn't have exactly five cells are dropped.
    pub fn from_entries(entries: &[FeedEntry]) -> Self {
        let rows = entries
            .iter()
            .filter_map(|e| {
                extract_row(&e.body).map(|row| SnapshotRow {
                    title: e.title.clone(),
                    row,
                })
            })
            .collect();
        Self { rows }
    }

    pub fn from_rows(rows: Vec<SnapshotRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain-text table with row indices, for picking events to watch.
    pub fn render_table(&self) -> String {
        const NA: &str = "N/A";
        let headers = [
            "#", "Title", "Time Left", "Impact", "Previous", "Consensus", "Actual",
        ];
        let lines: Vec<[String; 7]> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let cell = |v: &Option<String>| v.clone().unwrap_or_else(|| NA.to_string());
                [
                    i.to_string(),
                    r.title.clone(),
                    cell(&r.row.time_left),
                    cell(&r.row.impact),
                    cell(&r.row.previous),
                    cell(&r.row.consensus),
                    cell(&r.row.actual),
                ]
            })
            .collect();

        let mut widths = headers.map(|h| h.chars().count());
        for line in &lines {
            for (w, c) in widths.iter_mut().zip(line.iter()) {
                *w = (*w).max(c.chars().count());
            }
        }

        let mut out = String::new();
        let fmt_line = |out: &mut String, cells: &[&str]| {
            let parts: Vec<String> = cells
                .iter()
                .zip(widths.iter())
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect();
            let _ = writeln!(out, "{}", parts.join(" | ").trim_end());
        };
        fmt_line(&mut out, &headers);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", rule.join("-+-"));
        for line in &lines {
            let cells: Vec<&str> = line.iter().map(String::as_str).collect();
            fmt_line(&mut out, &cells);
        }
        out
    }
}

/// Fetch the feed once and build a snapshot. Unlike the poll loop, a failure
/// here is returned: there is nothing to select events from.
pub async fn fetch_snapshot(feed: &dyn FeedSource) -> Result<Snapshot> {
    let entries = feed.fetch_entries().await?;
    let snapshot = Snapshot::from_entries(&entries);
    tracing::info!(
        target: "watch",
        entries = entries.len(),
        rows = snapshot.len(),
        provider = feed.name(),
        "snapshot fetched"
    );
    Ok(snapshot)
}

/// Snapshot columns a caller may request (names are case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Previous,
    Consensus,
    Actual,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Previous => "Previous",
            Field::Consensus => "Consensus",
            Field::Actual => "Actual",
        }
    }
}

impl FromStr for Field {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Previous" => Ok(Field::Previous),
            "Consensus" => Ok(Field::Consensus),
            "Actual" => Ok(Field::Actual),
            other => Err(CatalogError::InvalidField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Index {index} is out of bounds (snapshot has {len} rows).")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Invalid data type requested: {0}. Choose from 'Previous', 'Consensus', or 'Actual'.")]
    InvalidField(String),
}

/// A watched event. Unrequested fields stay `None`; requested ones hold
/// sanitized numeric strings (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEvent {
    pub title: String,
    pub previous: Option<String>,
    pub consensus: Option<String>,
    pub actual: Option<String>,
    /// Higher readings are bad news (unemployment).
    pub invert_statistic: bool,
}

impl CatalogEvent {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Previous => self.previous = Some(value),
            Field::Consensus => self.consensus = Some(value),
            Field::Actual => self.actual = Some(value),
        }
    }
}

/// Ordered, read-only set of events for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    events: Vec<CatalogEvent>,
}

impl Catalog {
    pub fn events(&self) -> &[CatalogEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&CatalogEvent> {
        self.events.iter().find(|e| e.title == title)
    }
}

pub fn is_inverted_statistic(title: &str) -> bool {
    title.to_lowercase().contains("unemployment")
}

/// Pick `indices` out of `snapshot`, keeping the requested `fields`.
///
/// Indices are validated in order, each one's fields after it. An index whose
/// title is already in the catalog updates that event in place, so it keeps
/// its first position.
pub fn build_catalog<S: AsRef<str>>(
    snapshot: &Snapshot,
    indices: &[usize],
    fields: &[S],
) -> Result<Catalog, CatalogError> {
    let mut events: Vec<CatalogEvent> = Vec::with_capacity(indices.len());

    for &index in indices {
        let src = snapshot
            .rows
            .get(index)
            .ok_or(CatalogError::IndexOutOfBounds {
                index,
                len: snapshot.len(),
            })?;

        let pos = match events.iter().position(|e| e.title == src.title) {
            Some(pos) => pos,
            None => {
                events.push(CatalogEvent {
                    title: src.title.clone(),
                    previous: None,
                    consensus: None,
                    actual: None,
                    invert_statistic: false,
                });
                events.len() - 1
            }
        };

        for name in fields {
            let field: Field = name.as_ref().parse()?;
            let raw = match field {
                Field::Previous => &src.row.previous,
                Field::Consensus => &src.row.consensus,
                Field::Actual => &src.row.actual,
            };
            let value = sanitize_numeric(raw.as_deref().unwrap_or_default());
            events[pos].set(field, value);
        }
        events[pos].invert_statistic = is_inverted_statistic(&src.title);
    }

    Ok(Catalog { events })
}
