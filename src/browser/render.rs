use std::fmt::Write;

use crate::browser::session::{
    NO_COMMITS_MESSAGE, NO_FILES_MESSAGE, NO_MATCHES_MESSAGE, Phase, Session,
};
use crate::models::Repository;

const LOADING: &str = "Loading...";

pub fn render_repositories(repositories: &[Repository]) -> String {
    let mut out = String::new();
    for repo in repositories {
        let _ = writeln!(out, "{} ({})", repo.full_name(), repo.default_branch);
    }
    out
}

/// Text view of a session: file list with the active file marked, then the
/// active file's content and recent commits.
pub fn render_session(session: &Session) -> String {
    let mut out = String::new();

    if let Some(message) = session.phase.message() {
        let _ = writeln!(out, "{}", message);
        return out;
    }
    if session.phase != Phase::Browsing {
        let _ = writeln!(out, "{}", LOADING);
        return out;
    }

    if let Some(repo) = &session.current_repository {
        let _ = writeln!(out, "{} ({})", repo.full_name(), repo.default_branch);
        out.push('\n');
    }

    let visible = session.visible_entries();
    if session.filter.is_empty() {
        let _ = writeln!(out, "Files ({}):", session.tree.len());
    } else {
        let _ = writeln!(
            out,
            "Files ({} of {}, filter \"{}\"):",
            visible.len(),
            session.tree.len(),
            session.filter
        );
    }

    if session.tree.is_empty() {
        let _ = writeln!(out, "  {}", NO_FILES_MESSAGE);
    } else if visible.is_empty() {
        let _ = writeln!(out, "  {}", NO_MATCHES_MESSAGE);
    }
    let active = session.active_path();
    for entry in visible {
        let marker = if Some(entry.path.as_str()) == active { '*' } else { ' ' };
        let _ = writeln!(out, "  {} {}", marker, entry.path);
    }

    let Some(file) = &session.file else {
        return out;
    };

    let _ = writeln!(out, "\n=== {} ===", file.path);
    match &file.content {
        Some(content) => {
            out.push_str(content);
            if !content.ends_with('\n') {
                out.push('\n');
            }
        }
        None => {
            let _ = writeln!(out, "{}", LOADING);
        }
    }

    out.push_str("\nRecent commits:\n");
    match &file.commits {
        Some(commits) if commits.is_empty() => {
            let _ = writeln!(out, "  {}", NO_COMMITS_MESSAGE);
        }
        Some(commits) => {
            for commit in commits {
                let _ = writeln!(
                    out,
                    "  {} - {}, {}",
                    commit.headline(),
                    commit.author_name,
                    commit.relative_time()
                );
            }
        }
        None => {
            let _ = writeln!(out, "  {}", LOADING);
        }
    }

    out
}
