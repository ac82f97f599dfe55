//! Response shapes of the hosting API and their mapping to the data model.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{CommitSummary, EntryType, Repository, TreeEntry};

#[derive(Debug, Deserialize)]
pub struct RepoItem {
    pub name: String,
    pub owner: OwnerItem,
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerItem {
    pub login: String,
}

impl From<RepoItem> for Repository {
    fn from(item: RepoItem) -> Self {
        Repository {
            owner: item.owner.login,
            name: item.name,
            default_branch: item.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeItem {
    pub fn into_entry(self) -> Option<TreeEntry> {
        let entry_type = match self.kind.as_str() {
            "blob" => EntryType::Blob,
            "tree" => EntryType::Tree,
            "commit" => EntryType::Commit,
            _ => return None,
        };
        Some(TreeEntry {
            path: self.path,
            entry_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CommitItem {
    pub commit: CommitBody,
}

#[derive(Debug, Deserialize)]
pub struct CommitBody {
    pub message: String,
    pub author: GitActor,
}

#[derive(Debug, Deserialize)]
pub struct GitActor {
    pub name: String,
    pub date: DateTime<Utc>,
}

impl From<CommitItem> for CommitSummary {
    fn from(item: CommitItem) -> Self {
        CommitSummary {
            author_name: item.commit.author.name,
            message: item.commit.message,
            authored_date: item.commit.author.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_item_mapping() {
        let json = r#"{
            "id": 1,
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": { "login": "octocat", "id": 1 },
            "default_branch": "main",
            "private": false
        }"#;
        let item: RepoItem = serde_json::from_str(json).unwrap();
        let repo = Repository::from(item);
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
        assert_eq!(repo.default_branch, "main");
    }

    #[test]
    fn test_tree_item_kinds() {
        let json = r#"{
            "sha": "abc",
            "tree": [
                { "path": "src", "type": "tree", "mode": "040000" },
                { "path": "src/lib.rs", "type": "blob", "size": 10 },
                { "path": "vendor", "type": "commit" },
                { "path": "odd", "type": "tag" }
            ],
            "truncated": false
        }"#;
        let response: TreeResponse = serde_json::from_str(json).unwrap();
        let entries: Vec<TreeEntry> = response
            .tree
            .into_iter()
            .filter_map(TreeItem::into_entry)
            .collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], TreeEntry::file("src/lib.rs"));
        assert_eq!(entries[2].entry_type, EntryType::Commit);
    }

    #[test]
    fn test_commit_item_mapping() {
        let json = r#"{
            "sha": "abc",
            "commit": {
                "author": {
                    "name": "Mona",
                    "email": "m@example.com",
                    "date": "2024-03-01T12:00:00Z"
                },
                "committer": { "name": "GitHub", "date": "2024-03-02T12:00:00Z" },
                "message": "Initial commit"
            }
        }"#;
        let item: CommitItem = serde_json::from_str(json).unwrap();
        let summary = CommitSummary::from(item);
        assert_eq!(summary.author_name, "Mona");
        assert_eq!(summary.message, "Initial commit");
        assert_eq!(summary.authored_date.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }
}
