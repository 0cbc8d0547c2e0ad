//! # Result Sink
//! Comma-separated rows, no header, `\r\n` line endings, one row per event:
//! `title,previous,consensus,actual,invert_statistic,total_event_count`.

use anyhow::{Context, Result};
use metrics::counter;
use std::borrow::Cow;
use std::path::Path;
use tokio::fs;

use crate::monitor::ObservedEvent;

/// Overwrites `path`. Unlike feed errors this one is fatal: losing the file
/// means losing the release.
pub async fn write_results(events: &[ObservedEvent], path: &Path) -> Result<()> {
    fs::write(path, render_rows(events))
        .await
        .with_context(|| format!("writing results to {}", path.display()))?;
    counter!("watch_results_written_total").increment(1);
    Ok(())
}

pub fn render_rows(events: &[ObservedEvent]) -> String {
    let mut out = String::new();
    for ev in events {
        let fields = [
            field(&ev.title),
            field(ev.previous.as_deref().unwrap_or_default()),
            field(ev.consensus.as_deref().unwrap_or_default()),
            field(ev.actual.as_deref().unwrap_or_default()),
            Cow::Borrowed(if ev.invert_statistic { "True" } else { "False" }),
            Cow::Owned(ev.total_event_count.to_string()),
        ];
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

// Quote only when needed; embedded quotes are doubled.
fn field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(title: &str, actual: Option<&str>) -> ObservedEvent {
        ObservedEvent {
            title: title.into(),
            previous: Some("3.5".into()),
            consensus: Some("3.6".into()),
            actual: actual.map(Into::into),
            invert_statistic: title.to_lowercase().contains("unemployment"),
            total_event_count: 2,
        }
    }

    #[test]
    fn rows_in_order_without_header() {
        let out = render_rows(&[ev("Unemployment Rate", Some("3.7")), ev("CPI m/m", None)]);
        assert_eq!(
            out,
            "Unemployment Rate,3.5,3.6,3.7,True,2\r\nCPI m/m,3.5,3.6,,False,2\r\n"
        );
    }

    #[test]
    fn commas_and_quotes_are_quoted() {
        let out = render_rows(&[ev("Retail Sales, \"core\"", Some("1"))]);
        assert!(out.starts_with("\"Retail Sales, \"\"core\"\"\",3.5"));
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale\r\nstale\r\nstale\r\n").unwrap();
        write_results(&[ev("GDP q/q", Some("1.2"))], &path).await.unwrap();
        let s = std::fs::read_to_string(&path).unwrap();
        assert_eq!(s, "GDP q/q,3.5,3.6,1.2,False,2\r\n");
    }

    #[tokio::test]
    async fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_results(&[ev("GDP q/q", Some("1.2"))], &path)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("writing results to"));
    }
}
