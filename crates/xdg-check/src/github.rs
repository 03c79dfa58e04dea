//! GitHub REST client for commit statuses and pull request file listings.

use crate::config::{RemoteConfig, Repository};
use crate::error::ApiError;
use crate::reporter::CommitState;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Page size for pull request file listings (GitHub maximum).
pub const FILES_PER_PAGE: usize = 100;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRequest {
    pub state: CommitState,
    pub target_url: String,
    pub description: String,
    pub context: String,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
}

impl PullRequestFile {
    /// The pull request deletes this file; its validator will report it missing.
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

/// The remote operations this tool needs from the hosting platform.
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Create a commit status on `sha`.
    async fn create_status(&self, sha: &str, request: &StatusRequest) -> Result<(), ApiError>;

    /// Filenames changed by a pull request, in platform order.
    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<String>, ApiError>;
}

/// `StatusApi` backed by the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    repository: Repository,
    token: String,
}

impl GitHubClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("xdg-check/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubClient {
            http,
            api_url: remote.api_url.trim_end_matches('/').to_string(),
            repository: remote.repository.clone(),
            token: remote.token.clone(),
        })
    }

    fn statuses_url(&self, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/statuses/{}",
            self.api_url, self.repository.owner, self.repository.name, sha
        )
    }

    fn pull_files_url(&self, number: u64, page: usize) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
            self.api_url,
            self.repository.owner,
            self.repository.name,
            number,
            FILES_PER_PAGE,
            page
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }
}

async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl StatusApi for GitHubClient {
    async fn create_status(&self, sha: &str, request: &StatusRequest) -> Result<(), ApiError> {
        let url = self.statuses_url(sha);
        debug!(url = %url, state = %request.state, "Creating commit status");

        let response = self
            .request(self.http.post(&url))
            .json(request)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<String>, ApiError> {
        let mut files = Vec::new();
        let mut page = 1;

        loop {
            let url = self.pull_files_url(number, page);
            debug!(url = %url, "Listing pull request files");

            let response = self.request(self.http.get(&url)).send().await?;
            let batch: Vec<PullRequestFile> = check_response(response).await?.json().await?;
            let count = batch.len();
            for file in batch.iter().filter(|f| f.is_removed()) {
                debug!(pull_request = number, file = %file.filename, "File removed by pull request");
            }
            files.extend(batch.into_iter().map(|f| f.filename));

            if count < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(files)
    }
}

/// `StatusApi` for runs without a remote: statuses are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineApi;

#[async_trait]
impl StatusApi for OfflineApi {
    async fn create_status(&self, _sha: &str, request: &StatusRequest) -> Result<(), ApiError> {
        info!(
            state = %request.state,
            context = %request.context,
            "{}",
            request.description
        );
        Ok(())
    }

    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<String>, ApiError> {
        Err(ApiError::Unavailable(format!(
            "cannot list files of pull request #{} without a token",
            number
        )))
    }
}
