//! Resolved runtime configuration.
//!
//! Values come from CLI flags (or their environment variables) in `main`;
//! anything unset falls back to the defaults here.

use std::path::PathBuf;

use crate::api::ApiConfig;
use crate::store::StoreConfig;

pub const APP_DIR_NAME: &str = "gh-browse";

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub store: StoreConfig,
    /// Open the token page in a browser when a login is needed.
    pub open_browser: bool,
}

impl Config {
    pub fn new(
        api_url: String,
        per_page: u32,
        data_dir: Option<PathBuf>,
        open_browser: bool,
    ) -> Self {
        Self {
            api: ApiConfig {
                base_url: api_url,
                per_page: per_page.max(1),
            },
            store: StoreConfig::new(data_dir.unwrap_or_else(default_data_dir)),
            open_browser,
        }
    }
}

/// Per-user data directory: `<data_dir>/gh-browse`, else `~/.gh-browse`.
pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join(APP_DIR_NAME)
    } else if let Some(home) = dirs::home_dir() {
        home.join(format!(".{}", APP_DIR_NAME))
    } else {
        PathBuf::from(format!(".{}", APP_DIR_NAME))
    }
}
