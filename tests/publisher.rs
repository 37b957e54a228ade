use base64::prelude::*;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use upkeep::api::{GitHubStore, ReleaseHandle, ReleaseStore, StoredFile};
use upkeep::libs::check_state::CheckState;
use upkeep::libs::checker::Checker;
use upkeep::libs::config::{CheckerConfig, PublisherConfig};
use upkeep::libs::descriptor::VersionDescriptor;
use upkeep::libs::error::UpdateError;
use upkeep::libs::integrity::bytes_sha256;
use upkeep::libs::publisher::Publisher;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTIFACT: &[u8] = b"release build of app.exe";
const ASSET_URL: &str = "https://github.com/o/r/releases/download/v1.1.0/app.exe";

struct Fixture {
    server: MockServer,
    _temp_dir: TempDir,
    artifact: PathBuf,
}

impl Fixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let artifact = temp_dir.path().join("app.exe");
        fs::write(&artifact, ARTIFACT).unwrap();
        Fixture {
            server,
            _temp_dir: temp_dir,
            artifact,
        }
    }

    fn store(&self) -> GitHubStore {
        let config = PublisherConfig {
            repo: "o/r".to_string(),
            api_url: self.server.uri(),
            descriptor_path: "version.json".to_string(),
            branch: None,
        };
        GitHubStore::new(&config, "test-token").unwrap()
    }

    fn publisher(&self) -> Publisher<GitHubStore> {
        Publisher::new(self.store(), "version.json")
    }

    async fn mount_release(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/repos/o/r/releases"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({"tag_name": "v1.1.0", "name": "Version 1.1.0"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 1,
                "tag_name": "v1.1.0",
                "upload_url": format!("{}/uploads/repos/o/r/releases/1/assets{{?name,label}}", self.server.uri())
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    async fn mount_asset(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/uploads/repos/o/r/releases/1/assets"))
            .and(query_param("name", "app.exe"))
            .and(header("content-type", "application/x-msdownload"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 7,
                "name": "app.exe",
                "browser_download_url": ASSET_URL
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    async fn mount_existing_descriptor(&self, sha: &str) {
        let current = VersionDescriptor::new("1.0.0", ASSET_URL, "old", &bytes_sha256(b"old"), "2024-01-01");
        let encoded = BASE64_STANDARD.encode(current.to_json_pretty().unwrap());
        // GitHub wraps the payload.
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| format!("{}\n", std::str::from_utf8(c).unwrap()))
            .collect();
        Mock::given(method("GET"))
            .and(path("/repos/o/r/contents/version.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha,
                "content": wrapped,
                "encoding": "base64"
            })))
            .mount(&self.server)
            .await;
    }

    async fn mount_no_descriptor(&self) {
        Mock::given(method("GET"))
            .and(path("/repos/o/r/contents/version.json"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&self.server)
            .await;
    }

    async fn put_body(&self) -> Value {
        let requests = self.server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .expect("descriptor was not written");
        serde_json::from_slice(&put.body).unwrap()
    }
}

fn release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[tokio::test]
async fn test_publish_creates_descriptor() {
    let fixture = Fixture::new().await;
    fixture.mount_release(1).await;
    fixture.mount_asset(1).await;
    fixture.mount_no_descriptor().await;
    Mock::given(method("PUT"))
        .and(path("/repos/o/r/contents/version.json"))
        .and(body_partial_json(json!({"message": "Update version info to 1.1.0"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"content": {"sha": "new"}})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let report = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "1.1.0", "Added new features", release_date())
        .await
        .unwrap();

    assert_eq!(report.tag, "v1.1.0");
    assert!(report.descriptor_created);
    assert_eq!(
        report.descriptor,
        VersionDescriptor::new("1.1.0", ASSET_URL, "Added new features", &bytes_sha256(ARTIFACT), "2024-05-01")
    );

    let requests = fixture.server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path().starts_with("/uploads/"))
        .expect("asset was not uploaded");
    assert_eq!(upload.body, ARTIFACT);
    assert_eq!(bytes_sha256(&upload.body), report.descriptor.file_hash);

    let body = fixture.put_body().await;
    assert!(body.get("sha").is_none());
    let written = BASE64_STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
    assert_eq!(VersionDescriptor::from_slice(&written).unwrap(), report.descriptor);

    // An installed 1.0.0 picks the published descriptor up as an update.
    let raw = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version.json"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(written))
        .mount(&raw)
        .await;
    let checker = Checker::new(&CheckerConfig {
        descriptor_url: format!("{}/version.json", raw.uri()),
        ..CheckerConfig::default()
    })
    .unwrap()
    .with_current_version("1.0.0");
    let outcome = checker
        .check_for_updates(&CheckState::never_checked(), chrono::Utc::now())
        .await
        .unwrap();
    let update = outcome.update.unwrap();
    assert_eq!(update.version, "1.1.0");
    assert_eq!(update.download_url, ASSET_URL);
    assert_eq!(update.file_hash, bytes_sha256(ARTIFACT));
}

#[tokio::test]
async fn test_publish_replaces_descriptor_with_revision() {
    let fixture = Fixture::new().await;
    fixture.mount_release(1).await;
    fixture.mount_asset(1).await;
    fixture.mount_existing_descriptor("abc123").await;
    Mock::given(method("PUT"))
        .and(path("/repos/o/r/contents/version.json"))
        .and(body_partial_json(json!({"sha": "abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {"sha": "def456"}})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let report = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "v1.1.0", "Added new features", release_date())
        .await
        .unwrap();

    assert!(!report.descriptor_created);
    assert_eq!(report.descriptor.version, "1.1.0");
    assert_eq!(report.descriptor.file_hash, bytes_sha256(ARTIFACT));
}

#[tokio::test]
async fn test_failed_release_stops_the_sequence() {
    let fixture = Fixture::new().await;
    Mock::given(method("POST"))
        .and(path("/repos/o/r/releases"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})))
        .expect(1)
        .mount(&fixture.server)
        .await;
    fixture.mount_asset(0).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "1.1.0", "notes", release_date())
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Api { status: 422, .. }));
}

#[tokio::test]
async fn test_failed_asset_upload_names_the_release() {
    let fixture = Fixture::new().await;
    fixture.mount_release(1).await;
    Mock::given(method("POST"))
        .and(path("/uploads/repos/o/r/releases/1/assets"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fixture.server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "1.1.0", "notes", release_date())
        .await
        .unwrap_err();

    match err {
        UpdateError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("v1.1.0"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stale_revision_is_conflict() {
    let fixture = Fixture::new().await;
    fixture.mount_release(1).await;
    fixture.mount_asset(1).await;
    fixture.mount_existing_descriptor("stale").await;
    Mock::given(method("PUT"))
        .and(path("/repos/o/r/contents/version.json"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "sha does not match"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "1.1.0", "notes", release_date())
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Conflict { ref path } if path == "version.json"));
}

#[tokio::test]
async fn test_invalid_version_sends_nothing() {
    let fixture = Fixture::new().await;
    fixture.mount_release(0).await;

    let err = fixture
        .publisher()
        .upload_file_on(&fixture.artifact, "next", "notes", release_date())
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Parse(_)));
}

#[tokio::test]
async fn test_missing_artifact_sends_nothing() {
    let fixture = Fixture::new().await;
    fixture.mount_release(0).await;
    let missing = fixture.artifact.with_file_name("missing.exe");

    let err = fixture
        .publisher()
        .upload_file_on(&missing, "1.1.0", "notes", release_date())
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Filesystem { .. }));
}

#[tokio::test]
async fn test_get_file_contents_decodes_payload() {
    let fixture = Fixture::new().await;
    fixture.mount_existing_descriptor("abc123").await;

    let stored = fixture.store().get_file_contents("version.json").await.unwrap().unwrap();

    assert_eq!(stored.revision, "abc123");
    assert_eq!(VersionDescriptor::from_slice(&stored.bytes).unwrap().version, "1.0.0");
}

#[test]
fn test_store_rejects_malformed_repo() {
    let config = PublisherConfig {
        repo: "just-a-name".to_string(),
        ..PublisherConfig::default()
    };
    assert!(matches!(GitHubStore::new(&config, "t"), Err(UpdateError::Parse(_))));
}

/// In-memory store that rewrites the artifact on disk as soon as the release
/// exists, like a build still writing its output.
struct RewritingStore {
    artifact: PathBuf,
    uploaded: std::sync::Mutex<Vec<u8>>,
    written: std::sync::Mutex<Vec<u8>>,
}

impl ReleaseStore for RewritingStore {
    async fn create_release(&self, tag: &str, _title: &str, _body: &str) -> Result<ReleaseHandle, UpdateError> {
        fs::write(&self.artifact, b"rewritten after release creation").unwrap();
        Ok(ReleaseHandle {
            id: 1,
            tag: tag.to_string(),
            upload_url: "memory://upload".to_string(),
        })
    }

    async fn upload_asset(
        &self,
        _release: &ReleaseHandle,
        bytes: Vec<u8>,
        _filename: &str,
        _content_type: &str,
    ) -> Result<String, UpdateError> {
        *self.uploaded.lock().unwrap() = bytes;
        Ok(ASSET_URL.to_string())
    }

    async fn get_file_contents(&self, _path: &str) -> Result<Option<StoredFile>, UpdateError> {
        Ok(None)
    }

    async fn put_file_contents(
        &self,
        _path: &str,
        bytes: &[u8],
        _message: &str,
        _revision: Option<&str>,
    ) -> Result<(), UpdateError> {
        *self.written.lock().unwrap() = bytes.to_vec();
        Ok(())
    }
}

#[tokio::test]
async fn test_descriptor_hash_matches_uploaded_bytes_when_file_changes() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = temp_dir.path().join("app.exe");
    fs::write(&artifact, ARTIFACT).unwrap();
    let store = RewritingStore {
        artifact: artifact.clone(),
        uploaded: Default::default(),
        written: Default::default(),
    };
    let publisher = Publisher::new(store, "version.json");

    let report = publisher
        .upload_file_on(&artifact, "1.1.0", "notes", release_date())
        .await
        .unwrap();

    let uploaded = publisher.store().uploaded.lock().unwrap().clone();
    assert_eq!(uploaded, ARTIFACT);
    assert_eq!(report.descriptor.file_hash, bytes_sha256(&uploaded));

    let written = publisher.store().written.lock().unwrap().clone();
    assert_eq!(VersionDescriptor::from_slice(&written).unwrap().file_hash, bytes_sha256(ARTIFACT));
}
