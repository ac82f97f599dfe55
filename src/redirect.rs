//! Hand-off to the login flow, which lives outside this crate.

use std::fmt;

pub const TOKEN_SETTINGS_URL: &str = "https://github.com/settings/tokens";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// No usable token in storage.
    MissingCredential,
    /// The user logged out.
    LoggedOut,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectReason::MissingCredential => write!(f, "not logged in"),
            RedirectReason::LoggedOut => write!(f, "logged out"),
        }
    }
}

pub trait LoginRedirect: Send + Sync {
    fn redirect(&self, reason: RedirectReason);
}

/// Tells the user how to log in, optionally opening the token page.
pub struct TerminalRedirect {
    pub open_browser: bool,
}

impl LoginRedirect for TerminalRedirect {
    fn redirect(&self, reason: RedirectReason) {
        tracing::info!("Redirecting to login: {}", reason);
        eprintln!("✗ {}", capitalize(&reason.to_string()));
        eprintln!("  Create a token at {}", TOKEN_SETTINGS_URL);
        eprintln!("  then run: gh-browse login --token <TOKEN>");

        if self.open_browser {
            if let Err(e) = open::that(TOKEN_SETTINGS_URL) {
                eprintln!("  Warning: Could not open browser: {}", e);
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every redirect instead of acting on it.
    #[derive(Default)]
    pub struct RecordingRedirect {
        pub reasons: Mutex<Vec<RedirectReason>>,
    }

    impl RecordingRedirect {
        pub fn reasons(&self) -> Vec<RedirectReason> {
            self.reasons.lock().unwrap().clone()
        }
    }

    impl LoginRedirect for RecordingRedirect {
        fn redirect(&self, reason: RedirectReason) {
            self.reasons.lock().unwrap().push(reason);
        }
    }
}
