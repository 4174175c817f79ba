//! GitHub contents API client using reqwest.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use url::Url;

use crate::domain::{AppError, GitHubSettings};
use crate::ports::{Credential, FileRequest, RemoteRepository};

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Reads files through `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    api_url: Url,
    user_agent: String,
    client: Client,
}

impl GitHubRepository {
    pub fn new(settings: &GitHubSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { api_url: settings.api_url.clone(), user_agent: settings.user_agent.clone(), client })
    }

    fn contents_url(&self, request: &FileRequest<'_>) -> Result<Url, AppError> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Configuration(format!("API URL cannot be a base: {}", self.api_url))
            })?;
            segments.pop_if_empty().extend(["repos", request.owner, request.repository, "contents"]);
            segments.extend(request.path.split('/').filter(|segment| !segment.is_empty()));
        }
        if let Some(git_ref) = request.git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        Ok(url)
    }
}

impl RemoteRepository for GitHubRepository {
    fn read_file(
        &self,
        request: &FileRequest<'_>,
        credential: &Credential,
    ) -> Result<String, AppError> {
        let location = request.to_string();
        let failed = |details: String| AppError::FetchFailed { location: location.clone(), details };

        let url = self.contents_url(request)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .header(AUTHORIZATION, format!("Bearer {}", credential.token))
            .header(USER_AGENT, &self.user_agent)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .map_err(|e| failed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response.text().map_err(|e| failed(format!("Failed to read body: {}", e)));
        }

        Err(failed(match status {
            StatusCode::NOT_FOUND => "repository, ref, or path not found (404)".to_string(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("credential '{}' was refused ({})", credential.id, status.as_u16())
            }
            _ => {
                let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
                format!("API error ({}): {}", status.as_u16(), body)
            }
        }))
    }
}
