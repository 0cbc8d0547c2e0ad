// tests/metrics_watch.rs
#![cfg(feature = "strict-metrics")]
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusBuilder;
use release_watch::catalog::{build_catalog, Snapshot, SnapshotRow};
use release_watch::extract::ExtractedRow;
use release_watch::ingest::providers::scripted::ScriptedFeed;
use release_watch::monitor::poll_until_observed;
use release_watch::{FeedEntry, ManualClock, PollOptions};

#[tokio::test]
async fn metrics_exposed_after_polling() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let snapshot = Snapshot::from_rows(vec![SnapshotRow {
        title: "CPI m/m".into(),
        row: ExtractedRow::not_available(),
    }]);
    let catalog = build_catalog(&snapshot, &[0], &["Previous"]).unwrap();

    let feed = ScriptedFeed::new();
    feed.push_failure("timeout");
    feed.push_entries(vec![FeedEntry::new(
        "CPI m/m",
        "<table><tr><th>h</th></tr><tr><td>0</td><td>High</td><td>0.2%</td><td>0.2%</td><td>0.3%</td></tr></table>",
    )]);

    let t0 = NaiveDate::from_ymd_opt(2024, 9, 11)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let clock = ManualClock::new(t0);
    poll_until_observed(&feed, &clock, &catalog, t0, &PollOptions::default())
        .await
        .unwrap();

    let out = handle.render();
    assert!(out.contains("watch_polls_total"));
    assert!(out.contains("watch_fetch_errors_total"));
    assert!(out.contains("watch_fetch_ms"));
    assert!(out.contains("watch_events_pending"));
}
