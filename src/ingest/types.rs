// src/ingest/types.rs
use anyhow::Result;

/// One `<item>` of the calendar feed as handed to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    /// HTML carried in `<description>`, usually a small table.
    pub body: String,
    pub published_at: Option<u64>, // unix seconds
}

impl FeedEntry {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            published_at: None,
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}
