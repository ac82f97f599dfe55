use std::sync::Arc;

use reqwest::{Client, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::wire::{CommitItem, RepoItem, TreeItem, TreeResponse};
use super::{ApiConfig, COMMIT_HISTORY_LIMIT, CONTENT_PLACEHOLDER, RepositoryApi};
use crate::error::{AppError, Result};
use crate::models::{CommitSummary, Repository, TreeEntry, sorted_files};
use crate::redirect::{LoginRedirect, RedirectReason};
use crate::store::Storage;

const USER_AGENT: &str = concat!("gh-browse/", env!("CARGO_PKG_VERSION"));
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";

/// Why a single request produced no usable result. Only ever logged.
#[derive(Error, Debug)]
enum RequestError {
    #[error("no access token stored")]
    NoCredential,

    #[error("cannot build request URL from {0}")]
    Url(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    Status(StatusCode),
}

type RequestResult<T> = std::result::Result<T, RequestError>;

/// HTTP client for the hosting API. Reads the token from storage on every
/// call, so a login or logout takes effect immediately.
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    per_page: u32,
    storage: Arc<Storage>,
    redirect: Arc<dyn LoginRedirect>,
}

impl GitHubClient {
    pub fn new(
        config: &ApiConfig,
        storage: Arc<Storage>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Internal(format!("Invalid API URL {}: {}", config.base_url, e))
        })?;

        Ok(Self {
            http,
            base_url,
            per_page: config.per_page,
            storage,
            redirect,
        })
    }

    async fn token(&self) -> Option<String> {
        match Storage::blocking(&self.storage, |s| s.secrets.get()).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read access token: {}", e);
                None
            }
        }
    }

    /// Appends path segments to the base URL. Segments containing `/` are
    /// split so file paths and branch names keep their structure.
    fn endpoint(&self, segments: &[&str]) -> RequestResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RequestError::Url(self.base_url.to_string()))?;
            path.pop_if_empty()
                .extend(segments.iter().flat_map(|s| s.split('/')));
        }
        Ok(url)
    }

    async fn send(
        &self,
        url: Url,
        accept: &str,
        query: &[(&str, String)],
    ) -> RequestResult<reqwest::Response> {
        let token = self.token().await.ok_or(RequestError::NoCredential)?;
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("token {}", token))
            .header(header::ACCEPT, accept)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> RequestResult<T> {
        Ok(self.send(url, ACCEPT_JSON, query).await?.json().await?)
    }

    async fn get_raw(&self, url: Url) -> RequestResult<String> {
        Ok(self.send(url, ACCEPT_RAW, &[]).await?.text().await?)
    }

    async fn try_list_repositories(&self) -> RequestResult<Vec<Repository>> {
        let url = self.endpoint(&["user", "repos"])?;
        let query = [
            ("sort", "updated".to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        let items: Vec<RepoItem> = self.get_json(url, &query).await?;
        Ok(items.into_iter().map(Repository::from).collect())
    }

    async fn try_fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> RequestResult<String> {
        let url = self.endpoint(&["repos", owner, repo, "contents", path])?;
        self.get_raw(url).await
    }

    async fn try_fetch_commit_history(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> RequestResult<Vec<CommitSummary>> {
        let url = self.endpoint(&["repos", owner, repo, "commits"])?;
        let query = [
            ("path", path.to_string()),
            ("per_page", COMMIT_HISTORY_LIMIT.to_string()),
        ];
        let items: Vec<CommitItem> = self.get_json(url, &query).await?;
        Ok(items.into_iter().map(CommitSummary::from).collect())
    }

    async fn try_fetch_file_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> RequestResult<Vec<TreeEntry>> {
        let url = self.endpoint(&["repos", owner, repo, "git", "trees", branch])?;
        let response: TreeResponse = self
            .get_json(url, &[("recursive", "1".to_string())])
            .await?;

        if response.truncated {
            tracing::warn!(
                "Tree for {}/{}@{} was truncated by the server",
                owner,
                repo,
                branch
            );
        }
        Ok(sorted_files(
            response.tree.into_iter().filter_map(TreeItem::into_entry),
        ))
    }
}

impl RepositoryApi for GitHubClient {
    async fn list_repositories(&self) -> Vec<Repository> {
        if self.token().await.is_none() {
            self.redirect.redirect(RedirectReason::MissingCredential);
            return Vec::new();
        }

        self.try_list_repositories().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to list repositories: {}", e);
            Vec::new()
        })
    }

    async fn fetch_file_content(&self, owner: &str, repo: &str, path: &str) -> String {
        self.try_fetch_file_content(owner, repo, path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch {}/{}:{}: {}", owner, repo, path, e);
                CONTENT_PLACEHOLDER.to_string()
            })
    }

    async fn fetch_commit_history(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Vec<CommitSummary> {
        self.try_fetch_commit_history(owner, repo, path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch history of {}/{}:{}: {}", owner, repo, path, e);
                Vec::new()
            })
    }

    async fn fetch_file_tree(&self, owner: &str, repo: &str, branch: &str) -> Vec<TreeEntry> {
        self.try_fetch_file_tree(owner, repo, branch)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch tree of {}/{}@{}: {}", owner, repo, branch, e);
                Vec::new()
            })
    }
}
