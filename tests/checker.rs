mod common;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use common::{descriptor_json, SOME_HASH};
use std::time::Duration;
use tempfile::TempDir;
use upkeep::libs::check_state::{CheckState, CheckStateStore};
use upkeep::libs::checker::{fail_open, Checker};
use upkeep::libs::config::CheckerConfig;
use upkeep::libs::error::UpdateError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOWNLOAD_URL: &str = "https://github.com/o/r/releases/download/v1.1.0/app.exe";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn checker_for(server: &MockServer, timeout_secs: u64) -> Checker {
    let config = CheckerConfig {
        descriptor_url: format!("{}/version.json", server.uri()),
        check_interval_hours: 24,
        timeout_secs,
        read_timeout_secs: 30,
        download_dir: None,
    };
    Checker::new(&config).unwrap().with_current_version("1.0.0")
}

async fn serve_descriptor(server: &MockServer, version: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(descriptor_json(version, DOWNLOAD_URL, SOME_HASH)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_update_available_keeps_state() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.1.0", 1).await;
    let checker = checker_for(&server, 5);

    let state = CheckState::never_checked();
    let outcome = checker.check_for_updates(&state, now()).await.unwrap();

    let update = outcome.update.expect("update should be reported");
    assert_eq!(update.version, "1.1.0");
    assert_eq!(update.download_url, DOWNLOAD_URL);
    assert_eq!(update.changelog, "Changes in 1.1.0");
    assert_eq!(update.file_hash, SOME_HASH);
    // Not advanced, so the next run checks again until the update is installed.
    assert_eq!(outcome.state, state);
}

#[tokio::test]
async fn test_up_to_date_advances_last_check() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.0.0", 1).await;
    let checker = checker_for(&server, 5);

    let outcome = checker.check_for_updates(&CheckState::never_checked(), now()).await.unwrap();

    assert!(outcome.update.is_none());
    assert_eq!(outcome.state, CheckState::never_checked().touched(now()));
}

#[tokio::test]
async fn test_older_remote_is_not_an_update() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "v0.9.5", 1).await;
    let checker = checker_for(&server, 5);

    let outcome = checker.check_for_updates(&CheckState::never_checked(), now()).await.unwrap();
    assert!(outcome.update.is_none());
}

#[tokio::test]
async fn test_throttled_check_makes_no_request() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.1.0", 0).await;
    let checker = checker_for(&server, 5);

    let state = CheckState::never_checked().touched(now() - ChronoDuration::hours(1));
    let outcome = checker.check_for_updates(&state, now()).await.unwrap();

    assert!(outcome.update.is_none());
    assert_eq!(outcome.state, state);
}

#[tokio::test]
async fn test_due_check_queries_remote() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.1.0", 1).await;
    let checker = checker_for(&server, 5);

    let state = CheckState::never_checked().touched(now() - ChronoDuration::hours(25));
    let outcome = checker.check_for_updates(&state, now()).await.unwrap();
    assert!(outcome.update.is_some());
}

#[tokio::test]
async fn test_check_remote_ignores_throttle() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.1.0", 1).await;
    let checker = checker_for(&server, 5);

    let state = CheckState::never_checked().touched(now() - ChronoDuration::minutes(5));
    let outcome = checker.check_remote(&state, now()).await.unwrap();
    assert!(outcome.update.is_some());
}

#[tokio::test]
async fn test_request_identifies_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(descriptor_json("1.0.0", DOWNLOAD_URL, SOME_HASH)))
        .expect(1)
        .mount(&server)
        .await;

    checker_for(&server, 5).fetch_descriptor().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("upkeep/"));
}

#[tokio::test]
async fn test_timeout_fails_open_without_touching_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(descriptor_json("1.1.0", DOWNLOAD_URL, SOME_HASH))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let checker = checker_for(&server, 1);

    let result = checker.check_for_updates(&CheckState::never_checked(), now()).await;
    assert!(matches!(result, Err(UpdateError::Network(_))));

    let result = checker.check_for_updates(&CheckState::never_checked(), now()).await;
    assert!(fail_open(result).is_none());
}

#[tokio::test]
async fn test_malformed_descriptor_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"version\": 1.1"))
        .mount(&server)
        .await;

    let result = checker_for(&server, 5).check_for_updates(&CheckState::never_checked(), now()).await;
    assert!(matches!(result, Err(UpdateError::Parse(_))));
}

#[tokio::test]
async fn test_missing_descriptor_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = checker_for(&server, 5).check_for_updates(&CheckState::never_checked(), now()).await;
    assert!(matches!(result, Err(UpdateError::Api { status: 404, .. })));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let config = CheckerConfig {
        descriptor_url: "http://127.0.0.1:9/version.json".to_string(),
        check_interval_hours: 24,
        timeout_secs: 2,
        read_timeout_secs: 30,
        download_dir: None,
    };
    let checker = Checker::new(&config).unwrap();

    let result = checker.check_for_updates(&CheckState::never_checked(), now()).await;
    assert!(matches!(result, Err(UpdateError::Network(_))));
}

#[tokio::test]
async fn test_check_and_persist_saves_state_when_up_to_date() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.0.0", 1).await;
    let temp_dir = TempDir::new().unwrap();
    let store = CheckStateStore::new(temp_dir.path().join("check_state.json"));

    let update = checker_for(&server, 5).check_and_persist(&store, now()).await;

    assert!(update.is_none());
    assert_eq!(store.load().last_check_time(), Some(now()));
}

#[tokio::test]
async fn test_check_and_persist_reports_update_without_saving() {
    let server = MockServer::start().await;
    serve_descriptor(&server, "1.1.0", 1).await;
    let temp_dir = TempDir::new().unwrap();
    let store = CheckStateStore::new(temp_dir.path().join("check_state.json"));

    let update = checker_for(&server, 5).check_and_persist(&store, now()).await;

    assert_eq!(update.map(|u| u.version), Some("1.1.0".to_string()));
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_check_and_persist_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let store = CheckStateStore::new(temp_dir.path().join("check_state.json"));

    assert!(checker_for(&server, 5).check_and_persist(&store, now()).await.is_none());
    assert!(!store.path().exists());
}
