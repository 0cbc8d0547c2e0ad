// src/config/watch.rs
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::monitor::PollOptions;
use crate::scheduler::ReleasePlan;

pub const ENV_CONFIG_PATH: &str = "RELEASE_WATCH_CONFIG";

fn default_fields() -> Vec<String> {
    vec!["Previous".to_string(), "Consensus".to_string()]
}
fn default_buffer_secs() -> u64 {
    5
}
fn default_poll_interval_secs() -> f64 {
    2.0
}
fn default_final_poll_interval_secs() -> f64 {
    0.5
}
fn default_http_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub feed_url: String,
    /// Row indices into the snapshot printed by `release-watch list`.
    pub events: Vec<usize>,
    /// Any of "Previous" | "Consensus" | "Actual" (case-sensitive).
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    /// "HH:MM" or "HH:MM:SS", local time.
    pub release_time: String,
    /// "YYYY-MM-DD"; today when absent.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default = "default_buffer_secs")]
    pub buffer_secs: u64,
    pub output_path: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,
    #[serde(default = "default_final_poll_interval_secs")]
    pub final_poll_interval_secs: f64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub max_polls: Option<u64>,
}

impl WatchConfig {
    fn sanitize(mut self) -> Result<Self> {
        if self.feed_url.trim().is_empty() {
            return Err(anyhow!("feed_url must not be empty"));
        }
        if !(self.poll_interval_secs.is_finite() && self.poll_interval_secs > 0.0) {
            self.poll_interval_secs = default_poll_interval_secs();
        }
        if !(self.final_poll_interval_secs.is_finite() && self.final_poll_interval_secs > 0.0) {
            self.final_poll_interval_secs = default_final_poll_interval_secs();
        }
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_http_timeout_secs();
        }
        Ok(self)
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs_f64(self.poll_interval_secs),
            final_interval: Duration::from_secs_f64(self.final_poll_interval_secs),
            max_polls: self.max_polls,
        }
    }

    pub fn release_plan(&self, today: NaiveDate) -> Result<ReleasePlan> {
        ReleasePlan::from_parts(
            self.release_date,
            &self.release_time,
            self.buffer_secs,
            today,
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// The part of the config `list` needs; other keys in the file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub feed_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl FeedSettings {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    fn sanitize(mut self) -> Result<Self> {
        if self.feed_url.trim().is_empty() {
            return Err(anyhow!("feed_url must not be empty"));
        }
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_http_timeout_secs();
        }
        Ok(self)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<WatchConfig> {
    read_as::<WatchConfig>(path)?.sanitize()
}

/// Load config using env var + fallbacks:
/// 1) $RELEASE_WATCH_CONFIG
/// 2) config/release_watch.toml
/// 3) config/release_watch.json
pub fn load_config_default() -> Result<WatchConfig> {
    load_config_from(&default_config_path()?)
}

/// Feed settings only, from an explicit path.
pub fn load_feed_settings_from(path: &Path) -> Result<FeedSettings> {
    read_as::<FeedSettings>(path)?.sanitize()
}

/// Feed settings only, with the same lookup as `load_config_default`.
pub fn load_feed_settings_default() -> Result<FeedSettings> {
    load_feed_settings_from(&default_config_path()?)
}

fn default_config_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/release_watch.toml");
    if toml_p.exists() {
        return Ok(toml_p);
    }
    let json_p = PathBuf::from("config/release_watch.json");
    if json_p.exists() {
        return Ok(json_p);
    }
    Err(anyhow!(
        "no config found: pass --config, set {ENV_CONFIG_PATH} or create config/release_watch.toml"
    ))
}

fn read_as<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_as(&content, ext.as_str()).with_context(|| format!("parsing config {}", path.display()))
}

fn parse_as<T: DeserializeOwned>(s: &str, hint_ext: &str) -> Result<T> {
    let v = match hint_ext {
        "toml" => toml::from_str::<T>(s).context("invalid toml")?,
        "json" => serde_json::from_str::<T>(s).context("invalid json")?,
        _ => match serde_json::from_str::<T>(s) {
            Ok(v) => v,
            Err(_) => toml::from_str::<T>(s).context("unsupported config format")?,
        },
    };
    Ok(v)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<WatchConfig> {
    parse_as::<WatchConfig>(s, hint_ext)?.sanitize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const TOML: &str = r#"
feed_url = "https://example.com/calendar.rss"
events = [3, 7]
release_time = "08:30"
output_path = "out/nfp.csv"
"#;

    #[test]
    fn toml_defaults_apply() {
        let cfg = parse_config(TOML, "toml").unwrap();
        assert_eq!(cfg.events, vec![3, 7]);
        assert_eq!(cfg.fields, default_fields());
        assert_eq!(cfg.buffer_secs, 5);
        assert_eq!(cfg.release_date, None);
        assert_eq!(cfg.poll_options(), PollOptions::default());
        assert_eq!(cfg.http_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn json_with_overrides_and_bad_intervals() {
        let json = r#"{
            "feed_url": "https://example.com/calendar.rss",
            "events": [0],
            "fields": ["Consensus"],
            "release_time": "14:00",
            "release_date": "2024-10-04",
            "buffer_secs": 30,
            "output_path": "out.csv",
            "poll_interval_secs": -1,
            "final_poll_interval_secs": 0.25,
            "max_polls": 100
        }"#;
        let cfg = parse_config(json, "").unwrap();
        let opts = cfg.poll_options();
        assert_eq!(opts.interval, Duration::from_secs(2));
        assert_eq!(opts.final_interval, Duration::from_millis(250));
        assert_eq!(opts.max_polls, Some(100));

        let today = NaiveDate::from_ymd_opt(2024, 9, 6).unwrap();
        let plan = cfg.release_plan(today).unwrap();
        assert_eq!(
            plan.release_at,
            NaiveDate::from_ymd_opt(2024, 10, 4)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap()
        );
        assert_eq!(plan.buffer_secs, 30);
    }

    #[test]
    fn empty_feed_url_is_rejected() {
        let s = TOML.replace("https://example.com/calendar.rss", " ");
        assert!(parse_config(&s, "toml").is_err());
    }

    #[test]
    fn feed_settings_need_only_the_url() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("list.toml");
        fs::write(&p, r#"feed_url = "https://example.com/calendar.rss""#).unwrap();

        // not a complete watch config...
        assert!(load_config_from(&p).is_err());
        // ...but enough to list the feed
        let feed = load_feed_settings_from(&p).unwrap();
        assert_eq!(feed.feed_url, "https://example.com/calendar.rss");
        assert_eq!(feed.http_timeout(), Duration::from_secs(10));

        // a full watch config also works for listing
        let full = dir.path().join("full.toml");
        fs::write(&full, TOML).unwrap();
        assert_eq!(
            load_feed_settings_from(&full).unwrap().feed_url,
            "https://example.com/calendar.rss"
        );

        fs::write(&p, r#"feed_url = """#).unwrap();
        assert!(load_feed_settings_from(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);

        // nothing anywhere
        assert!(load_config_default().is_err());

        // fallback toml in ./config/
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join("config/release_watch.toml"), TOML).unwrap();
        assert_eq!(load_config_default().unwrap().events, vec![3, 7]);

        // env wins
        let p_env = tmp.path().join("other.toml");
        fs::write(&p_env, TOML.replace("[3, 7]", "[1]")).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(load_config_default().unwrap().events, vec![1]);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(load_config_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
