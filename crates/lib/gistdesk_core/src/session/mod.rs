//! Session manager, the single source of truth for who is logged in.
//!
//! One [`SessionManager`] exists per running application. It is owned by the
//! application root (the Tauri app state or the CLI `main`) and shared by
//! `Arc`; nothing reaches it through a global.

pub mod store;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::gists::GistClient;
use crate::github::{ApiError, Connector, GistApi, GitHubConnector};
use crate::models::User;

pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};

/// Buffered notifications per subscriber before the oldest are dropped.
const NOTIFICATION_CAPACITY: usize = 32;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ApiError),

    #[error("Could not create GitHub client: {0}")]
    Connect(#[source] ApiError),

    #[error("Not logged in")]
    NotAuthenticated,
}

/// Snapshot of the authentication state.
///
/// `Authenticated` always carries both the identity and the client handle.
#[derive(Clone)]
pub enum Session {
    Loading,
    Unauthenticated,
    Authenticated {
        user: User,
        client: Arc<dyn GistApi>,
    },
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Loading => f.write_str("Loading"),
            Session::Unauthenticated => f.write_str("Unauthenticated"),
            Session::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("login", &user.login)
                .finish_non_exhaustive(),
        }
    }
}

impl Session {
    pub fn is_loading(&self) -> bool {
        matches!(self, Session::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn client(&self) -> Option<Arc<dyn GistApi>> {
        match self {
            Session::Authenticated { client, .. } => Some(client.clone()),
            _ => None,
        }
    }

    /// Serializable view for front ends.
    pub fn view(&self) -> SessionView {
        SessionView {
            authenticated: self.is_authenticated(),
            loading: self.is_loading(),
            user: self.user().cloned(),
        }
    }
}

/// What a front end needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub loading: bool,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// User-facing message about a session transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Owns the bearer credential and the authenticated client handle.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    store: Arc<dyn TokenStore>,
    state: RwLock<Session>,
    notifications: broadcast::Sender<Notification>,
}

impl SessionManager {
    /// New manager in the `Loading` state. Call [`SessionManager::restore`] next.
    pub fn new(connector: Arc<dyn Connector>, store: Arc<dyn TokenStore>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            connector,
            store,
            state: RwLock::new(Session::Loading),
            notifications,
        }
    }

    /// Manager talking to GitHub, storing the token on disk.
    pub fn github(config: &ClientConfig) -> Result<Self, StoreError> {
        let store = FileTokenStore::resolve(config.storage_file.as_deref())?;
        Ok(Self::new(
            Arc::new(GitHubConnector::new(config.clone())),
            Arc::new(store),
        ))
    }

    pub fn snapshot(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Fresh gist client when authenticated.
    pub fn gist_client(&self) -> Option<GistClient> {
        self.snapshot().client().map(GistClient::new)
    }

    pub fn require_client(&self) -> Result<GistClient, SessionError> {
        self.gist_client().ok_or(SessionError::NotAuthenticated)
    }

    /// Validate `token` with one `GET /user` and, on success, persist it.
    ///
    /// On failure the stored token is removed and the session is left
    /// unauthenticated. Concurrent calls are last-write-wins.
    pub async fn login(&self, token: &str) -> Result<User, SessionError> {
        let token = token.trim();
        self.set_state(Session::Loading);

        match self.authenticate(token).await {
            Ok((user, client)) => {
                if let Err(e) = self.store.save(token) {
                    warn!(error = %e, "could not persist token, session will not survive a restart");
                }
                info!(login = %user.login, "logged in");
                self.set_state(Session::Authenticated {
                    user: user.clone(),
                    client,
                });
                self.notify(
                    NotificationLevel::Success,
                    format!("Logged in as {}", user.login),
                );
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.discard_token();
                self.set_state(Session::Unauthenticated);
                self.notify(NotificationLevel::Error, format!("Login failed: {e}"));
                Err(e)
            }
        }
    }

    async fn authenticate(&self, token: &str) -> Result<(User, Arc<dyn GistApi>), SessionError> {
        if token.is_empty() {
            return Err(SessionError::Authentication(ApiError::InvalidInput(
                "token must not be empty".into(),
            )));
        }
        let client = self.connector.connect(token).map_err(SessionError::Connect)?;
        let user = client
            .authenticated_user()
            .await
            .map_err(SessionError::Authentication)?;
        Ok((user, client))
    }

    /// Forget the token and the identity. Idempotent.
    pub fn logout(&self) {
        self.discard_token();
        self.set_state(Session::Unauthenticated);
        info!("logged out");
        self.notify(NotificationLevel::Info, "Logged out".to_string());
    }

    /// Startup: log in silently with the stored token, if any.
    pub async fn restore(&self) -> Session {
        self.set_state(Session::Loading);

        let stored = self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored token");
            None
        });

        match stored {
            Some(token) => {
                debug!("restoring session from stored token");
                if self.login(&token).await.is_err() {
                    info!("stored token rejected, login required");
                }
            }
            None => self.set_state(Session::Unauthenticated),
        }

        self.snapshot()
    }

    fn set_state(&self, next: Session) {
        *self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn discard_token(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not remove stored token");
        }
    }

    fn notify(&self, level: NotificationLevel, message: String) {
        // No subscribers is fine.
        let _ = self.notifications.send(Notification { level, message });
    }
}
