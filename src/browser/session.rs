//! Browsing session state.
//!
//! Holds the current repository, the tree snapshot, the filter query and the
//! active file view. Pure data plus the transitions the controller drives, so
//! every transition can be tested without I/O.
//!
//! Each file selection gets a fresh `SelectionToken`. Content and history
//! results carry the token they were requested under and are dropped unless it
//! still matches the active file.

use crate::error::{AppError, Result};
use crate::models::{CommitSummary, Repository, TreeEntry};

pub const NOT_LOGGED_IN_MESSAGE: &str = "You are not logged in.";
pub const NO_REPOSITORIES_MESSAGE: &str = "No repositories found.";
pub const NO_FILES_MESSAGE: &str = "No files found in this repository.";
pub const NO_MATCHES_MESSAGE: &str = "No files match the filter.";
pub const NO_COMMITS_MESSAGE: &str = "No commits found for this file.";
pub const TRY_AGAIN_MESSAGE: &str = "Something went wrong while loading. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unauthenticated,
    LoadingRepositories,
    Browsing,
    /// No token stored; the login redirect has fired.
    MissingCredential,
    NoRepositories,
    Failed(String),
}

impl Phase {
    /// User-facing text for the states that end a session.
    pub fn message(&self) -> Option<&str> {
        match self {
            Phase::MissingCredential => Some(NOT_LOGGED_IN_MESSAGE),
            Phase::NoRepositories => Some(NO_REPOSITORIES_MESSAGE),
            Phase::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

/// The active file. Content and history arrive independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileView {
    pub path: String,
    pub content: Option<String>,
    pub commits: Option<Vec<CommitSummary>>,
    token: SelectionToken,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub phase: Phase,
    pub repositories: Vec<Repository>,
    pub current_repository: Option<Repository>,
    pub tree: Vec<TreeEntry>,
    pub filter: String,
    pub file: Option<FileView>,
    next_token: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_entries(&self) -> Vec<&TreeEntry> {
        filter_entries(&self.tree, &self.filter)
    }

    pub fn active_path(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.path.as_str())
    }

    pub fn find_repository(&self, full_name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.matches(full_name))
    }

    /// Swap in a new tree snapshot. Clears the active file, which also orphans
    /// any results still in flight for it.
    pub fn replace_tree(&mut self, repository: Repository, entries: Vec<TreeEntry>) {
        self.current_repository = Some(repository);
        self.tree = entries;
        self.file = None;
    }

    /// Make `path` the active file. Fails without side effects when the path
    /// is not in the current snapshot.
    pub fn begin_selection(&mut self, path: &str) -> Result<(SelectionToken, Repository)> {
        let repository = self
            .current_repository
            .clone()
            .ok_or_else(|| AppError::RepoNotFound("no repository selected".to_string()))?;
        if !self.tree.iter().any(|e| e.path == path) {
            return Err(AppError::PathNotFound(path.to_string()));
        }

        self.next_token += 1;
        let token = SelectionToken(self.next_token);
        self.file = Some(FileView {
            path: path.to_string(),
            content: None,
            commits: None,
            token,
        });
        Ok((token, repository))
    }

    /// Returns false when the result is stale and was dropped.
    pub fn apply_content(&mut self, token: SelectionToken, content: String) -> bool {
        match self.file.as_mut() {
            Some(file) if file.token == token => {
                file.content = Some(content);
                true
            }
            _ => false,
        }
    }

    /// Returns false when the result is stale and was dropped.
    pub fn apply_commits(&mut self, token: SelectionToken, commits: Vec<CommitSummary>) -> bool {
        match self.file.as_mut() {
            Some(file) if file.token == token => {
                file.commits = Some(commits);
                true
            }
            _ => false,
        }
    }
}

/// The file opened when a repository is first shown: `readme.md` in any case,
/// else the lexicographically first path.
pub fn default_file(entries: &[TreeEntry]) -> Option<&TreeEntry> {
    entries
        .iter()
        .find(|e| e.path.eq_ignore_ascii_case("readme.md"))
        .or_else(|| {
            entries
                .iter()
                .min_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()))
        })
}

/// Case-insensitive substring match on the path, original order kept.
pub fn filter_entries<'a>(entries: &'a [TreeEntry], query: &str) -> Vec<&'a TreeEntry> {
    if query.is_empty() {
        return entries.iter().collect();
    }
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|e| e.path.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn files(paths: &[&str]) -> Vec<TreeEntry> {
        paths.iter().map(|p| TreeEntry::file(*p)).collect()
    }

    fn paths<'a>(entries: &[&'a TreeEntry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    fn repo() -> Repository {
        Repository {
            owner: "octocat".to_string(),
            name: "hello".to_string(),
            default_branch: "main".to_string(),
        }
    }

    fn commit(message: &str) -> CommitSummary {
        CommitSummary {
            author_name: "Mona".to_string(),
            message: message.to_string(),
            authored_date: Utc::now(),
        }
    }

    #[test]
    fn test_default_file_prefers_readme() {
        let entries = files(&["LICENSE", "readme.md", "src/a.go"]);
        assert_eq!(default_file(&entries).unwrap().path, "readme.md");

        let entries = files(&["src/a.go", "LICENSE", "README.MD"]);
        assert_eq!(default_file(&entries).unwrap().path, "README.MD");
    }

    #[test]
    fn test_default_file_nested_readme_does_not_count() {
        let entries = files(&["docs/README.md", "src/a.go"]);
        assert_eq!(default_file(&entries).unwrap().path, "docs/README.md");

        let entries = files(&["src/a.go", "docs/readme.md", "Makefile"]);
        assert_eq!(default_file(&entries).unwrap().path, "Makefile");
    }

    #[test]
    fn test_default_file_falls_back_to_first() {
        let entries = files(&["LICENSE", "src/a.go"]);
        assert_eq!(default_file(&entries).unwrap().path, "LICENSE");
        assert!(default_file(&[]).is_none());
    }

    #[test]
    fn test_filter_entries() {
        let entries = files(&["a/b.txt", "README.md", "a/c.txt"]);
        assert_eq!(paths(&filter_entries(&entries, "a/")), vec!["a/b.txt", "a/c.txt"]);
        assert_eq!(
            paths(&filter_entries(&entries, "")),
            vec!["a/b.txt", "README.md", "a/c.txt"]
        );
        assert_eq!(paths(&filter_entries(&entries, "readme")), vec!["README.md"]);
        assert!(filter_entries(&entries, "zzz").is_empty());
    }

    #[test]
    fn test_filter_does_not_touch_snapshot_or_active_file() {
        let mut session = Session::new();
        session.replace_tree(repo(), files(&["a/b.txt", "README.md"]));
        session.begin_selection("README.md").unwrap();

        session.filter = "a/".to_string();
        assert_eq!(paths(&session.visible_entries()), vec!["a/b.txt"]);
        assert_eq!(session.tree.len(), 2);
        assert_eq!(session.active_path(), Some("README.md"));
    }

    #[test]
    fn test_begin_selection_requires_path_in_snapshot() {
        let mut session = Session::new();
        assert!(matches!(
            session.begin_selection("a.txt"),
            Err(AppError::RepoNotFound(_))
        ));

        session.replace_tree(repo(), files(&["a.txt"]));
        assert!(matches!(
            session.begin_selection("b.txt"),
            Err(AppError::PathNotFound(_))
        ));
        assert!(session.file.is_none());

        let (_, selected_repo) = session.begin_selection("a.txt").unwrap();
        assert_eq!(selected_repo, repo());
        assert_eq!(session.active_path(), Some("a.txt"));
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let mut session = Session::new();
        session.replace_tree(repo(), files(&["a.txt", "b.txt"]));

        let (token_a, _) = session.begin_selection("a.txt").unwrap();
        let (token_b, _) = session.begin_selection("b.txt").unwrap();
        assert_ne!(token_a, token_b);

        assert!(session.apply_content(token_b, "B".to_string()));
        assert!(!session.apply_content(token_a, "A".to_string()));
        assert!(!session.apply_commits(token_a, vec![commit("for a")]));

        let file = session.file.as_ref().unwrap();
        assert_eq!(file.path, "b.txt");
        assert_eq!(file.content.as_deref(), Some("B"));
        assert!(file.commits.is_none());
    }

    #[test]
    fn test_results_apply_in_any_order() {
        let mut session = Session::new();
        session.replace_tree(repo(), files(&["a.txt"]));
        let (token, _) = session.begin_selection("a.txt").unwrap();

        assert!(session.apply_commits(token, vec![commit("first")]));
        assert!(session.file.as_ref().unwrap().content.is_none());
        assert!(session.apply_content(token, "text".to_string()));

        let file = session.file.as_ref().unwrap();
        assert_eq!(file.content.as_deref(), Some("text"));
        assert_eq!(file.commits.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_tree_orphans_in_flight_results() {
        let mut session = Session::new();
        session.replace_tree(repo(), files(&["a.txt"]));
        let (token, _) = session.begin_selection("a.txt").unwrap();

        session.replace_tree(repo(), files(&["a.txt"]));
        assert!(!session.apply_content(token, "late".to_string()));
        assert!(session.file.is_none());
    }

    #[test]
    fn test_phase_messages() {
        assert_eq!(Phase::Browsing.message(), None);
        assert_eq!(Phase::NoRepositories.message(), Some(NO_REPOSITORIES_MESSAGE));
        assert_eq!(
            Phase::Failed(TRY_AGAIN_MESSAGE.to_string()).message(),
            Some(TRY_AGAIN_MESSAGE)
        );
    }
}
