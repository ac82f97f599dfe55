use std::sync::{Arc, Mutex};

use crate::api::RepositoryApi;
use crate::browser::session::{Phase, Session, TRY_AGAIN_MESSAGE, default_file};
use crate::error::{AppError, Result};
use crate::models::Repository;
use crate::redirect::{LoginRedirect, RedirectReason};
use crate::store::Storage;

/// Drives one browsing session: credential check, repository listing, tree
/// fetch, default file, and content/history loading per file selection.
///
/// All methods take `&self`. Session state sits behind a mutex that is never
/// held across an await, so overlapping selections interleave freely and the
/// selection token decides which results land.
pub struct BrowserController<A: RepositoryApi> {
    api: A,
    storage: Arc<Storage>,
    redirect: Arc<dyn LoginRedirect>,
    session: Mutex<Session>,
}

impl<A: RepositoryApi> BrowserController<A> {
    pub fn new(api: A, storage: Arc<Storage>, redirect: Arc<dyn LoginRedirect>) -> Self {
        Self {
            api,
            storage,
            redirect,
            session: Mutex::new(Session::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn with_session<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(f(&mut session))
    }

    pub fn snapshot(&self) -> Result<Session> {
        self.with_session(|s| s.clone())
    }

    /// Load repositories and open the first one. Unexpected errors end up as
    /// `Phase::Failed` rather than being returned.
    pub async fn start(&self) -> Result<()> {
        self.start_with(None, None).await
    }

    /// Like `start`, but opens `repository` (`owner/name`) and `path` in place
    /// of the defaults, so nothing is fetched for the skipped ones. A name or
    /// path that does not exist is returned as `RepoNotFound`/`PathNotFound`.
    pub async fn start_with(&self, repository: Option<&str>, path: Option<&str>) -> Result<()> {
        match self.load(repository, path).await {
            Ok(()) => Ok(()),
            Err(e @ (AppError::RepoNotFound(_) | AppError::PathNotFound(_))) => Err(e),
            Err(e) => {
                tracing::error!("Failed to load browsing session: {}", e);
                self.with_session(|s| s.phase = Phase::Failed(TRY_AGAIN_MESSAGE.to_string()))
            }
        }
    }

    async fn load(&self, repository: Option<&str>, path: Option<&str>) -> Result<()> {
        let token = Storage::blocking(&self.storage, |s| s.secrets.get()).await?;
        if token.is_none() {
            self.with_session(|s| s.phase = Phase::MissingCredential)?;
            self.redirect.redirect(RedirectReason::MissingCredential);
            return Ok(());
        }

        self.with_session(|s| s.phase = Phase::LoadingRepositories)?;
        let repositories = self.api.list_repositories().await;
        tracing::info!("Loaded {} repositories", repositories.len());

        let Some(first) = repositories.first().cloned() else {
            self.with_session(|s| s.phase = Phase::NoRepositories)?;
            return Ok(());
        };
        self.with_session(|s| s.repositories = repositories)?;

        match repository {
            Some(full_name) => self.select_repository(full_name, path).await,
            None => self.open_repository(first, path).await,
        }
    }

    /// Select a listed repository by `owner/name` and open `path` in it, or
    /// its default file.
    pub async fn select_repository(&self, full_name: &str, path: Option<&str>) -> Result<()> {
        let repository = self
            .with_session(|s| s.find_repository(full_name).cloned())?
            .ok_or_else(|| AppError::RepoNotFound(full_name.to_string()))?;
        self.open_repository(repository, path).await
    }

    /// Fetch the tree and open `path`, or the default file when none is given.
    async fn open_repository(&self, repository: Repository, path: Option<&str>) -> Result<()> {
        let tree = self
            .api
            .fetch_file_tree(&repository.owner, &repository.name, &repository.default_branch)
            .await;
        tracing::info!("{}: {} files", repository.full_name(), tree.len());

        let default_path = self.with_session(|s| {
            s.replace_tree(repository, tree);
            s.phase = Phase::Browsing;
            default_file(&s.tree).map(|e| e.path.clone())
        })?;

        match path.map(str::to_string).or(default_path) {
            Some(path) => self.select_file(&path).await,
            None => Ok(()),
        }
    }

    /// Make `path` the active file and load its content and history. Each
    /// result is applied as soon as it arrives; results for a file that is no
    /// longer active are dropped.
    pub async fn select_file(&self, path: &str) -> Result<()> {
        let (token, repository) = self.with_session(|s| s.begin_selection(path))??;
        let (owner, name) = (repository.owner.as_str(), repository.name.as_str());

        let content = async {
            let content = self.api.fetch_file_content(owner, name, path).await;
            if !self.with_session(|s| s.apply_content(token, content))? {
                tracing::debug!("Dropped stale content for {}", path);
            }
            Ok::<_, AppError>(())
        };
        let history = async {
            let commits = self.api.fetch_commit_history(owner, name, path).await;
            if !self.with_session(|s| s.apply_commits(token, commits))? {
                tracing::debug!("Dropped stale history for {}", path);
            }
            Ok::<_, AppError>(())
        };

        let (content, history) = tokio::join!(content, history);
        content?;
        history
    }

    pub fn set_filter(&self, query: &str) -> Result<()> {
        self.with_session(|s| s.filter = query.to_string())
    }

    /// Persist the token, then the username. A token that cannot be stored
    /// anywhere stops the login.
    pub async fn login(&self, token: &str, username: Option<&str>) -> Result<()> {
        let token = token.to_string();
        let username = username.map(str::to_string);
        Storage::blocking(&self.storage, move |s| {
            s.secrets.save(&token)?;
            if let Some(username) = username {
                if let Err(e) = s.set_username(&username) {
                    tracing::warn!("Could not store username: {}", e);
                }
            }
            Ok(())
        })
        .await?;
        self.with_session(|s| *s = Session::new())
    }

    pub async fn logout(&self) -> Result<()> {
        Storage::blocking(&self.storage, |s| {
            s.secrets.delete();
            s.clear_username();
            Ok(())
        })
        .await?;
        self.with_session(|s| {
            *s = Session::new();
            s.phase = Phase::MissingCredential;
        })?;
        self.redirect.redirect(RedirectReason::LoggedOut);
        Ok(())
    }

    pub async fn has_credential(&self) -> bool {
        matches!(
            Storage::blocking(&self.storage, |s| s.secrets.get()).await,
            Ok(Some(_))
        )
    }

    pub async fn username(&self) -> Option<String> {
        Storage::blocking(&self.storage, |s| Ok(s.username()))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Could not read username: {}", e);
                None
            })
    }
}
