use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a file's recent history, newest first as served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub author_name: String,
    pub message: String,
    pub authored_date: DateTime<Utc>,
}

impl CommitSummary {
    /// First line of the message.
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn relative_time(&self) -> String {
        format_relative_time(self.authored_date.timestamp())
    }
}

pub fn format_relative_time(timestamp: i64) -> String {
    format_relative_time_at(timestamp, Utc::now().timestamp())
}

fn format_relative_time_at(timestamp: i64, now: i64) -> String {
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}
