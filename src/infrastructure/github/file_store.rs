use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use crate::domain::{
    error::SyncError,
    models::{FileUpdate, FileVersion, VersionedFile},
    ports::VersionedFileStore,
};

const SERVICE: &str = "GitHub";
const USER_AGENT: &str = concat!("stockist-sync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: UpdatedContent,
}

#[derive(Debug, Deserialize)]
struct UpdatedContent {
    sha: String,
}

/// Reads and writes one repository's files through the GitHub contents API.
///
/// Writes carry the blob sha from the preceding read; GitHub answers 409 when
/// it is stale, which is reported as `SyncError::VersionConflict`.
pub struct GithubFileStore {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubFileStore {
    pub fn new(api_url: &str, owner: String, repo: String, token: String, timeout: Duration) -> Result<Self, SyncError> {
        debug!("Initializing GitHub file store for {}/{} via {}", owner, repo, api_url);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner,
            repo,
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    SyncError::UpstreamUnavailable { service: SERVICE, message: e.to_string() }
}

fn decode_content(response: &ContentResponse) -> Result<String, SyncError> {
    if let Some(encoding) = response.encoding.as_deref() {
        if encoding != "base64" {
            return Err(SyncError::Decode(format!("unsupported content encoding '{}'", encoding)));
        }
    }
    // GitHub wraps the base64 payload at 60 columns.
    let compact: String = response.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())
        .map_err(|e| SyncError::Decode(format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Decode(format!("file is not UTF-8: {}", e)))
}

#[async_trait]
impl VersionedFileStore for GithubFileStore {
    async fn read_file(&self, path: &str, git_ref: &str) -> Result<VersionedFile, SyncError> {
        let url = self.contents_url(path);
        debug!("Reading {} at ref {}", url, git_ref);

        let response = self.authorized(self.client.get(&url))
            .query(&[("ref", git_ref)])
            .send()
            .await
            .map_err(|e| {
                error!("GitHub read of {} failed: {}", path, e);
                transport_error(e)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("{} not found at ref {}", path, git_ref);
            return Err(SyncError::FileNotFound { path: path.to_string(), git_ref: git_ref.to_string() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "GitHub read of {} failed: {}", path, body);
            return Err(SyncError::UpstreamUnavailable {
                service: SERVICE,
                message: format!("read returned HTTP {}", status.as_u16()),
            });
        }

        let payload: ContentResponse = response.json().await.map_err(|e| {
            error!("Failed to decode GitHub contents response for {}: {}", path, e);
            SyncError::Decode(e.to_string())
        })?;
        let content = decode_content(&payload)?;

        info!("Read {} ({} bytes, sha {})", path, content.len(), payload.sha);
        Ok(VersionedFile { content, version: FileVersion(payload.sha) })
    }

    async fn write_file(&self, update: FileUpdate) -> Result<FileVersion, SyncError> {
        let url = self.contents_url(&update.path);
        debug!("Writing {} on {} against sha {}", url, update.branch, update.expected_version);

        let body = UpdateRequest {
            message: &update.message,
            content: STANDARD.encode(update.content.as_bytes()),
            sha: &update.expected_version.0,
            branch: &update.branch,
        };

        let response = self.authorized(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("GitHub write of {} failed: {}", update.path, e);
                transport_error(e)
            })?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            warn!("sha {} for {} is stale", update.expected_version, update.path);
            return Err(SyncError::VersionConflict { path: update.path });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::FileNotFound { path: update.path, git_ref: update.branch });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "GitHub write of {} failed: {}", update.path, body);
            return Err(SyncError::UpstreamUnavailable {
                service: SERVICE,
                message: format!("write returned HTTP {}", status.as_u16()),
            });
        }

        let payload: UpdateResponse = response.json().await.map_err(|e| {
            error!("Failed to decode GitHub update response for {}: {}", update.path, e);
            SyncError::Decode(e.to_string())
        })?;

        info!("✅ Committed {} as sha {}: {}", update.path, payload.content.sha, update.message);
        Ok(FileVersion(payload.content.sha))
    }
}
