use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_polls_total", "Feed polls made by the monitor.");
        describe_counter!(
            "watch_fetch_errors_total",
            "Feed fetches that failed and were treated as empty."
        );
        describe_histogram!("watch_fetch_ms", "Feed fetch + parse time in milliseconds.");
        describe_gauge!(
            "watch_events_pending",
            "Catalog events still missing an actual value."
        );
        describe_counter!(
            "watch_results_written_total",
            "Result files written after all actual values arrived."
        );
    });
}
