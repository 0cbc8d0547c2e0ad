// src/ingest/providers/scripted.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ingest::types::{FeedEntry, FeedSource};

/// In-memory feed that replays queued responses in order.
/// Once the queue is drained every fetch returns an empty list.
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    queue: Mutex<VecDeque<std::result::Result<Vec<FeedEntry>, String>>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_entries(&self, entries: Vec<FeedEntry>) {
        self.queue
            .lock()
            .expect("scripted feed mutex poisoned")
            .push_back(Ok(entries));
    }

    pub fn push_failure(&self, msg: impl Into<String>) {
        self.queue
            .lock()
            .expect("scripted feed mutex poisoned")
            .push_back(Err(msg.into()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .queue
            .lock()
            .expect("scripted feed mutex poisoned")
            .pop_front();
        match next {
            Some(Ok(entries)) => Ok(entries),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}
