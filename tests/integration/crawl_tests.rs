//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive full
//! rounds end-to-end through the real transport and filesystem sink.

use roundcrawl::config::Config;
use roundcrawl::crawler::Coordinator;
use roundcrawl::filter::{DomainFilter, MimeFilter, RegexFilter};
use roundcrawl::{DispatchPhase, FailureKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Coordinator plus the signals its round-completion callback fires
struct TestCrawl {
    coordinator: Coordinator,
    notify: Arc<Notify>,
    rounds: Arc<AtomicUsize>,
}

impl TestCrawl {
    fn new(save_dir: &TempDir) -> Self {
        let mut config = Config::default();
        config.crawler.max_concurrency = 4;
        config.crawler.connect_timeout_secs = 2;
        config.crawler.read_timeout_secs = 2;
        config.output.save_dir = save_dir.path().display().to_string();

        let notify = Arc::new(Notify::new());
        let rounds = Arc::new(AtomicUsize::new(0));
        let callback = {
            let notify = Arc::clone(&notify);
            let rounds = Arc::clone(&rounds);
            move || {
                rounds.fetch_add(1, Ordering::SeqCst);
                notify.notify_one();
            }
        };

        Self {
            coordinator: Coordinator::new(&config, callback).expect("Failed to create coordinator"),
            notify,
            rounds,
        }
    }

    async fn round(&self) {
        assert!(self.coordinator.go());
        tokio::time::timeout(Duration::from_secs(10), self.notify.notified())
            .await
            .expect("Round did not complete");
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_two_rounds_with_download() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let host = url::Url::parse(&base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept-charset", "utf-8"))
        .respond_with(html(
            r#"<html><body>
                <a href="/b">Page B</a>
                <a href="/files/f.zip">Archive</a>
                <a href="http://elsewhere.invalid/x">Elsewhere</a>
                <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#
                .to_string(),
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<html><body>leaf</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/f.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(b"PK\x03\x04zipdata".to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let save_dir = TempDir::new().unwrap();
    let crawl = TestCrawl::new(&save_dir);

    // Round 1: only the seed is fetched
    crawl.coordinator.add_seed(&format!("{}/", base_url));
    crawl.round().await;

    let urls: Vec<String> = crawl
        .coordinator
        .links()
        .iter()
        .map(|l| l.url().to_string())
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/b", base_url),
            format!("{}/files/f.zip", base_url),
            "http://elsewhere.invalid/x".to_string(),
        ]
    );
    assert_eq!(crawl.coordinator.round_statistics().pages_parsed, 1);

    // Round 2: stay on the mock host and keep archives
    crawl
        .coordinator
        .add_filter(Arc::new(DomainFilter::new(host.as_str())));
    crawl
        .coordinator
        .add_download_filter(Arc::new(MimeFilter::from_alias("APP")));
    crawl.round().await;

    let stats = crawl.coordinator.round_statistics();
    assert_eq!(stats.round, 2);
    assert_eq!(stats.seeded, 3);
    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.pages_parsed, 2);
    assert_eq!(stats.files_saved, 1);
    assert_eq!(stats.total_failures(), 0);

    let saved = std::fs::read(save_dir.path().join("f.zip")).expect("Download missing");
    assert_eq!(saved, b"PK\x03\x04zipdata");

    assert_eq!(crawl.rounds.load(Ordering::SeqCst), 2);
    assert_eq!(crawl.coordinator.phase(), DispatchPhase::Quiescent);
    assert_eq!(crawl.coordinator.in_flight(), 0);
}

#[tokio::test]
async fn test_failures_are_counted_and_round_completes() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/gone">Gone</a><a href="/broken">Broken</a>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let save_dir = TempDir::new().unwrap();
    let crawl = TestCrawl::new(&save_dir);
    crawl.coordinator.add_seed(&format!("{}/", base_url));
    crawl.round().await;

    crawl
        .coordinator
        .add_filter(Arc::new(RegexFilter::new("/(gone|broken)$").unwrap()));
    crawl.round().await;

    let stats = crawl.coordinator.round_statistics();
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.failure_count(FailureKind::HttpError), 2);
    assert_eq!(stats.retries_queued, 0);
    assert_eq!(crawl.rounds.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unwanted_download_is_not_saved() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&mock_server)
        .await;

    let save_dir = TempDir::new().unwrap();
    let crawl = TestCrawl::new(&save_dir);
    crawl
        .coordinator
        .add_download_filter(Arc::new(MimeFilter::from_alias("MP3")));
    crawl.coordinator.add_seed(&format!("{}/pic.png", base_url));
    crawl.round().await;

    assert_eq!(crawl.coordinator.round_statistics().skipped, 1);
    assert!(!save_dir.path().join("pic.png").exists());
}

#[tokio::test]
async fn test_stop_abandons_round_without_callback() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(
            html("<a href=\"/next\">next</a>".to_string()).set_delay(Duration::from_secs(1)),
        )
        .mount(&mock_server)
        .await;

    let save_dir = TempDir::new().unwrap();
    let crawl = TestCrawl::new(&save_dir);
    crawl.coordinator.add_seed(&format!("{}/", base_url));

    assert!(crawl.coordinator.go());
    assert_eq!(crawl.coordinator.in_flight(), 1);
    crawl.coordinator.stop();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(crawl.rounds.load(Ordering::SeqCst), 0);
    assert_eq!(crawl.coordinator.phase(), DispatchPhase::Idle);
    assert_eq!(crawl.coordinator.frontier_len(), 0);
}
