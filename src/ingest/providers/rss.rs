use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::normalize_title;
use crate::ingest::types::{FeedEntry, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// Calendar RSS 2.0 feed, either live over HTTP or from an in-memory document.
pub struct RssFeed {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssFeed {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// One client per run; connections are reused across polls and released on drop.
    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("release-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    pub fn parse_entries(s: &str) -> Result<Vec<FeedEntry>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing calendar rss xml")?;

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| FeedEntry {
                title: it
                    .title
                    .as_deref()
                    .map(normalize_title)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "No Title".to_string()),
                body: it.description.unwrap_or_default(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_entries(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url.as_str())
                    .send()
                    .await
                    .context("calendar http get()")?
                    .error_for_status()
                    .context("calendar http status")?
                    .text()
                    .await
                    .context("calendar http .text()")?;
                Self::parse_entries(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "CalendarRss"
    }
}

// HTML entities are not defined in XML; quick-xml rejects them outside CDATA.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
