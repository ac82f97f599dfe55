//! Read-only access to the hosting API.
//!
//! `RepositoryApi` is the seam the browser controller talks to; `GitHubClient`
//! is the HTTP implementation. No operation returns an error: failures are
//! logged and replaced by an empty result (or a placeholder string for file
//! content). Nothing is retried.

pub mod client;
mod wire;

use std::future::Future;

use crate::models::{CommitSummary, Repository, TreeEntry};

pub use client::GitHubClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Number of commits requested per file history.
pub const COMMIT_HISTORY_LIMIT: u32 = 5;
/// Shown in place of file content that could not be fetched.
pub const CONTENT_PLACEHOLDER: &str = "Error loading file content.";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Page size for the repository listing.
    pub per_page: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

pub trait RepositoryApi: Send + Sync {
    /// Most recently updated repositories, in server order. Empty when logged
    /// out (which also triggers the login redirect) or on failure.
    fn list_repositories(&self) -> impl Future<Output = Vec<Repository>> + Send;

    /// Raw file text at the default ref, or `CONTENT_PLACEHOLDER`.
    fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> impl Future<Output = String> + Send;

    /// Up to `COMMIT_HISTORY_LIMIT` commits touching `path`, newest first.
    fn fetch_commit_history(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> impl Future<Output = Vec<CommitSummary>> + Send;

    /// All files of the branch, sorted by path.
    fn fetch_file_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl Future<Output = Vec<TreeEntry>> + Send;
}
