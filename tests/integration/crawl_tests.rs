//! Integration tests for the crawler
//!
//! These tests use wiremock to serve paginated sites and drive full crawls
//! through the controller and the HTTP renderer.

use media_sweep::config::{Config, TimingConfig};
use media_sweep::crawler::CrawlReport;
use media_sweep::output::{CrawlEvent, LinkTally, Severity};
use media_sweep::{Controller, FinishReason, SweepError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Creates a test configuration writing to `output`
fn create_test_config(start_url: &str, output: &Path) -> Config {
    let mut config = Config::new(start_url)
        .with_extensions("mp4, .WEBM")
        .with_output_path(output);
    config.timing = TimingConfig::immediate();
    config
}

/// Page `n` of a listing, with one clip, one download and optionally a next link
fn listing_page(n: u32, has_next: bool) -> String {
    let next = if has_next {
        format!(r#"<a class="pager" rel="next" href="/page/{}">Next &raquo;</a>"#, n + 1)
    } else {
        String::new()
    };
    format!(
        r#"<html><head><title>Page {n}</title></head><body>
             <div class="post"><video src="/media/clip{n}.mp4"></video></div>
             <a href="https://cdn.test/files/extra{n}.webm">download</a>
             <a href="/about">About</a>
             {next}
           </body></html>"#
    )
}

/// Serves `/page/N` for every N, each linking to the next
async fn mount_endless_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/page/\d+$"))
        .respond_with(|request: &Request| {
            let n: u32 = request
                .url
                .path()
                .trim_start_matches("/page/")
                .parse()
                .unwrap_or(1);
            ResponseTemplate::new(200)
                .set_body_string(listing_page(n, true))
                .insert_header("content-type", "text/html")
        })
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Runs a crawl to completion, collecting its events
async fn run(config: Config) -> (CrawlReport, Vec<CrawlEvent>) {
    let controller = Controller::new();
    let mut handle = controller.start(config).expect("crawl should start");

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }

    let report = handle.wait().await.expect("worker should not panic");
    (report, events)
}

fn host(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("output file should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_page_limit_on_endless_listing() {
    let server = MockServer::start().await;
    mount_endless_listing(&server).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let config =
        create_test_config(&format!("{}/page/1", server.uri()), &output).with_max_pages(3);

    let (report, events) = run(config).await;

    assert_eq!(report.reason, FinishReason::PageLimit);
    assert!(report.is_success());
    assert_eq!(report.pages_visited, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    let host = host(&server);
    let lines = read_lines(&output);
    assert_eq!(lines.len(), 6);
    assert!(lines.contains(&format!("https://{}/media/clip3.mp4", host)));
    assert!(lines.contains(&"https://cdn.test/files/extra2.webm".to_string()));
    assert!(!lines.iter().any(|l| l.contains("clip4")));

    match events.last() {
        Some(CrawlEvent::Finished(summary)) => {
            assert_eq!(summary.pages_visited, 3);
            assert_eq!(
                summary.tally,
                LinkTally::Found {
                    total: 6,
                    output_path: output.clone(),
                }
            );
        }
        other => panic!("expected Finished as the last event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crawl_until_last_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(1, true)).await;
    mount_page(&server, "/page/2", listing_page(2, false)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let config = create_test_config(&format!("{}/page/1", server.uri()), &output);

    let (report, events) = run(config).await;

    assert_eq!(report.reason, FinishReason::NoMorePages);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.links.len(), 4);
    assert!(report.links.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!report.links.iter().any(|l| l.ends_with("/about")));

    let lines = read_lines(&output);
    assert_eq!(lines.len(), 4);

    let infos: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            CrawlEvent::Log(line) if line.severity == Severity::Info => Some(line.message.as_str()),
            _ => None,
        })
        .collect();
    assert!(infos.iter().any(|m| m.starts_with("Processing page 2:")));
    assert!(infos.contains(&"No more pages found"));
}

#[tokio::test]
async fn test_repeated_runs_append() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(1, false)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let start = format!("{}/page/1", server.uri());

    run(create_test_config(&start, &output)).await;
    run(create_test_config(&start, &output)).await;

    // Deduplication is per crawl; the file accumulates across runs
    assert_eq!(read_lines(&output).len(), 4);
}

#[tokio::test]
async fn test_missing_next_page_ends_with_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(1, true)).await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let config = create_test_config(&format!("{}/page/1", server.uri()), &output);

    let (report, events) = run(config).await;

    assert_eq!(report.reason, FinishReason::PageError);
    assert!(!report.is_success());
    assert_eq!(report.pages_visited, 1);
    assert_eq!(read_lines(&output).len(), 2);
    assert!(events.iter().any(|event| matches!(
        event,
        CrawlEvent::Log(line) if line.severity == Severity::Error && line.message.starts_with("Error on page 2:")
    )));
}

#[tokio::test]
async fn test_second_crawl_rejected_while_running() {
    let server = MockServer::start().await;
    mount_endless_listing(&server).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let mut config = create_test_config(&format!("{}/page/1", server.uri()), &output);
    config.manual_intervention = true;

    let controller = Controller::new();
    let mut handle = controller.start(config.clone()).unwrap();
    assert!(controller.is_running());

    let second = controller.start(config.clone());
    assert!(matches!(second, Err(SweepError::AlreadyRunning)));

    handle.take_gate().expect("manual gate").cancel();
    let report = handle.wait().await.unwrap();
    assert_eq!(report.reason, FinishReason::Cancelled);
    assert!(!controller.is_running());

    config.manual_intervention = false;
    let handle = controller.start(config.with_max_pages(1)).unwrap();
    let report = handle.wait().await.unwrap();
    assert_eq!(report.reason, FinishReason::PageLimit);
}

#[tokio::test]
async fn test_manual_gate_confirm_continues_without_reload() {
    let server = MockServer::start().await;
    mount_page(&server, "/page/1", listing_page(1, true)).await;
    mount_page(&server, "/page/2", listing_page(2, false)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let mut config = create_test_config(&format!("{}/page/1", server.uri()), &output);
    config.manual_intervention = true;

    let controller = Controller::new();
    let mut handle = controller.start(config).unwrap();
    let gate = handle.take_gate().expect("manual gate");

    // Confirm only once the start page is up, as the CLI does
    loop {
        match handle.next_event().await {
            Some(CrawlEvent::AwaitingConfirmation) => break,
            Some(_) => continue,
            None => panic!("crawl ended before asking for confirmation"),
        }
    }
    gate.confirm();
    let report = handle.wait().await.unwrap();

    assert_eq!(report.reason, FinishReason::NoMorePages);
    assert_eq!(report.pages_visited, 2);

    let requests = server.received_requests().await.unwrap();
    let first_page_loads = requests
        .iter()
        .filter(|request| request.url.path() == "/page/1")
        .count();
    assert_eq!(first_page_loads, 1);
}

#[tokio::test]
async fn test_stop_while_waiting_for_confirmation() {
    let server = MockServer::start().await;
    mount_endless_listing(&server).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("links.txt");
    let mut config = create_test_config(&format!("{}/page/1", server.uri()), &output);
    config.manual_intervention = true;

    let controller = Controller::new();
    let mut handle = controller.start(config).unwrap();
    let _gate = handle.take_gate();
    handle.stop();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.reason, FinishReason::Stopped);
    assert_eq!(report.pages_visited, 0);
    assert!(report.links.is_empty());
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("ftp://files.example/", &dir.path().join("links.txt"));

    let result = Controller::new().start(config);
    assert!(matches!(result, Err(SweepError::Config(_))));
}
