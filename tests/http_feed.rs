// tests/http_feed.rs
use release_watch::ingest::fetch_or_empty;
use release_watch::ingest::providers::rss::RssFeed;
use release_watch::ingest::types::FeedSource;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALENDAR_XML: &str = include_str!("fixtures/calendar_rss.xml");

async fn feed_for(status: u16, body: &str) -> (MockServer, RssFeed) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar.rss"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    let feed = RssFeed::from_url(
        format!("{}/calendar.rss", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    (server, feed)
}

#[tokio::test]
async fn http_feed_reuses_client_across_polls() {
    let (server, feed) = feed_for(200, CALENDAR_XML).await;
    assert_eq!(feed.fetch_entries().await.unwrap().len(), 4);
    assert_eq!(feed.fetch_entries().await.unwrap().len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn non_success_status_is_an_error_but_polls_see_empty() {
    let (_server, feed) = feed_for(503, "maintenance").await;
    assert!(feed.fetch_entries().await.is_err());
    assert!(fetch_or_empty(&feed).await.is_empty());
}

#[tokio::test]
async fn unreachable_host_polls_as_empty() {
    let feed = RssFeed::from_url("http://127.0.0.1:9/calendar.rss", Duration::from_secs(1)).unwrap();
    assert!(fetch_or_empty(&feed).await.is_empty());
}
