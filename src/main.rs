//! gh-browse - browse your GitHub repositories from the terminal
//!
//! # Usage
//! ```bash
//! gh-browse login --token <TOKEN>            # Store an access token
//! gh-browse repos                            # List recently updated repositories
//! gh-browse browse                           # Open the most recent repository
//! gh-browse browse --repo octocat/hello --file src/main.rs --filter src/
//! gh-browse logout                           # Forget the token
//! ```

mod api;
mod browser;
mod config;
mod error;
mod models;
mod redirect;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{DEFAULT_API_URL, DEFAULT_PER_PAGE, GitHubClient, RepositoryApi};
use browser::render::{render_repositories, render_session};
use browser::{BrowserController, Phase};
use config::Config;
use redirect::{LoginRedirect, TerminalRedirect};
use store::Storage;

/// Browse your GitHub repositories from the terminal
#[derive(Parser)]
#[command(name = "gh-browse")]
#[command(
    about = "Browse GitHub repositories, files and history from the terminal",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the hosting API
    #[arg(long, global = true, env = "GH_BROWSE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Directory holding the token database and fallback storage
    #[arg(long, global = true, env = "GH_BROWSE_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Number of repositories to list
    #[arg(long, global = true, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Open the token page in a browser when a login is needed
    #[arg(short, long, global = true)]
    open: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a personal access token
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored token and username
    Logout,
    /// Show the logged-in username
    Whoami,
    /// List recently updated repositories
    Repos,
    /// Show a repository's files, one file's content and its recent commits
    Browse {
        /// Repository as owner/name (defaults to the most recently updated)
        #[arg(long)]
        repo: Option<String>,
        /// File to open (defaults to README.md, else the first file)
        #[arg(long)]
        file: Option<String>,
        /// Case-insensitive substring filter for the file list
        #[arg(long, default_value = "")]
        filter: String,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("✗ {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the rendered view
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::new(cli.api_url, cli.per_page, cli.data_dir, cli.open);
    tracing::debug!("Using data directory {}", config.store.data_dir.display());

    let storage = Arc::new(Storage::open(&config.store));
    let redirect: Arc<dyn LoginRedirect> = Arc::new(TerminalRedirect {
        open_browser: config.open_browser,
    });
    let client = GitHubClient::new(&config.api, storage.clone(), redirect.clone())?;
    let controller = BrowserController::new(client, storage, redirect);

    match cli.command {
        Commands::Login { token, username } => {
            if token.trim().is_empty() {
                fail("Token must not be empty");
            }
            if let Err(e) = controller.login(token.trim(), username.as_deref()).await {
                fail(format!("Could not store token: {}", e));
            }
            println!("✓ Logged in");
        }
        Commands::Logout => {
            controller.logout().await?;
        }
        Commands::Whoami => match controller.username().await {
            Some(username) => println!("{}", username),
            None => fail("No username stored"),
        },
        Commands::Repos => {
            let repositories = controller.api().list_repositories().await;
            if repositories.is_empty() {
                if controller.has_credential().await {
                    fail(browser::session::NO_REPOSITORIES_MESSAGE);
                }
                // Logged out: the redirect has already told the user what to do
                std::process::exit(1);
            }
            print!("{}", render_repositories(&repositories));
        }
        Commands::Browse { repo, file, filter } => {
            if let Err(e) = controller.start_with(repo.as_deref(), file.as_deref()).await {
                fail(e);
            }
            let session = controller.snapshot()?;
            match session.phase {
                Phase::Browsing => {}
                // The redirect has already told the user what to do
                Phase::MissingCredential => std::process::exit(1),
                _ => fail(session.phase.message().unwrap_or("Could not load repositories")),
            }

            controller.set_filter(&filter)?;

            print!("{}", render_session(&controller.snapshot()?));
        }
    }

    Ok(())
}
