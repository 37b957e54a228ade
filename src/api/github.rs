//! GitHub-backed release store.
//!
//! - **Releases**: `POST /repos/{repo}/releases`, then the asset goes to the
//!   release's `upload_url` with the raw bytes as body.
//! - **Descriptor**: `GET`/`PUT /repos/{repo}/contents/{path}`. Content
//!   travels base64 encoded; the blob `sha` is the revision token, and GitHub
//!   rejects a `PUT` whose `sha` is no longer current.
//!
//! Authentication is a bearer token supplied by the caller, never read from
//! or written to disk here.

use super::{ReleaseHandle, ReleaseStore, StoredFile};
use crate::libs::checker::user_agent;
use crate::libs::config::PublisherConfig;
use crate::libs::error::{UpdateError, UpdateResult};
use base64::prelude::*;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize)]
struct CreateReleaseRequest<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
    tag_name: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: Client,
    api_url: String,
    repo: String,
    branch: Option<String>,
    token: String,
}

impl GitHubStore {
    pub fn new(config: &PublisherConfig, token: &str) -> UpdateResult<Self> {
        let repo = config.repo.trim().trim_matches('/');
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(UpdateError::Parse(format!(
                "repository must look like owner/name, got '{}'",
                config.repo
            )));
        }

        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|e| UpdateError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            branch: config.branch.clone(),
            token: token.to_string(),
        })
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, user_agent())
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_url, self.repo, path.trim_start_matches('/'))
    }
}

impl ReleaseStore for GitHubStore {
    async fn create_release(&self, tag: &str, title: &str, body: &str) -> UpdateResult<ReleaseHandle> {
        let url = format!("{}/repos/{}/releases", self.api_url, self.repo);
        let request = CreateReleaseRequest {
            tag_name: tag,
            name: title,
            body,
            draft: false,
            prerelease: false,
        };

        let response = self.request(Method::POST, &url).json(&request).send().await?;
        if response.status() != StatusCode::CREATED {
            return Err(api_error("creating release", response).await);
        }

        let release: ReleaseResponse = response.json().await?;
        tracing::debug!(id = release.id, tag = %release.tag_name, "release created");
        Ok(ReleaseHandle {
            id: release.id,
            tag: release.tag_name,
            upload_url: strip_url_template(&release.upload_url),
        })
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> UpdateResult<String> {
        let size = bytes.len();
        let response = self
            .request(Method::POST, &release.upload_url)
            .query(&[("name", filename)])
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(api_error("uploading asset", response).await);
        }

        let asset: AssetResponse = response.json().await?;
        tracing::debug!(filename, size, url = %asset.browser_download_url, "asset uploaded");
        Ok(asset.browser_download_url)
    }

    async fn get_file_contents(&self, path: &str) -> UpdateResult<Option<StoredFile>> {
        let mut request = self.request(Method::GET, &self.contents_url(path));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error("reading file contents", response).await);
        }

        let contents: ContentsResponse = response.json().await?;
        if let Some(encoding) = contents.encoding.as_deref() {
            if encoding != "base64" {
                return Err(UpdateError::Parse(format!("unsupported contents encoding '{}'", encoding)));
            }
        }

        // GitHub wraps the base64 payload at 60 columns.
        let packed: String = contents.content.split_whitespace().collect();
        let bytes = BASE64_STANDARD
            .decode(packed)
            .map_err(|e| UpdateError::Parse(format!("invalid base64 in {}: {}", path, e)))?;

        Ok(Some(StoredFile {
            bytes,
            revision: contents.sha,
        }))
    }

    async fn put_file_contents(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        revision: Option<&str>,
    ) -> UpdateResult<()> {
        let request = PutContentsRequest {
            message,
            content: BASE64_STANDARD.encode(bytes),
            sha: revision,
            branch: self.branch.as_deref(),
        };

        let response = self
            .request(Method::PUT, &self.contents_url(path))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(());
        }
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(UpdateError::Conflict { path: path.to_string() });
        }
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            // Raised when the file appeared after we looked and no sha was sent.
            let text = response.text().await.unwrap_or_default();
            if text.contains("sha") {
                return Err(UpdateError::Conflict { path: path.to_string() });
            }
            return Err(UpdateError::Api {
                status: status.as_u16(),
                message: format!("writing {}: {}", path, text),
            });
        }
        Err(api_error("writing file contents", response).await)
    }
}

async fn api_error(action: &str, response: Response) -> UpdateError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    UpdateError::Api {
        status: status.as_u16(),
        message: format!("{}: {}", action, text),
    }
}

/// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}` -> without the template.
fn strip_url_template(url: &str) -> String {
    match url.find('{') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}
