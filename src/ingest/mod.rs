// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{FeedEntry, FeedSource};
use metrics::{counter, histogram};

/// Normalize a feed title: decode entities, strip stray tags, collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Fetch once and fold every failure into an empty result.
///
/// The poll loop treats "transport down" and "nothing published yet" the same
/// way, so the error only surfaces in logs and `watch_fetch_errors_total`.
pub async fn fetch_or_empty(feed: &dyn FeedSource) -> Vec<FeedEntry> {
    crate::metrics::ensure_metrics_described();

    let t0 = std::time::Instant::now();
    let out = match feed.fetch_entries().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(target: "watch", error = ?e, provider = feed.name(), "feed fetch failed");
            counter!("watch_fetch_errors_total").increment(1);
            Vec::new()
        }
    };
    histogram!("watch_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::scripted::ScriptedFeed;

    #[test]
    fn normalize_title_decodes_and_collapses() {
        let s = "  Non-Farm&nbsp;Employment   Change &amp; <b>Rate</b> ";
        assert_eq!(normalize_title(s), "Non-Farm Employment Change & Rate");
    }

    #[tokio::test]
    async fn failures_become_empty() {
        let feed = ScriptedFeed::new();
        feed.push_failure("connection reset");
        feed.push_entries(vec![FeedEntry::new("CPI m/m", "")]);

        assert!(fetch_or_empty(&feed).await.is_empty());
        let second = fetch_or_empty(&feed).await;
        assert_eq!(second.len(), 1);
        assert_eq!(feed.calls(), 2);
    }
}
