//! GitHub REST transport.
//!
//! [`GistApi`] is the seam between the domain layer and HTTP: the session
//! manager and the gist client only ever hold an `Arc<dyn GistApi>`.
//! [`client::GitHubClient`] is the `reqwest` implementation.

pub mod client;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::models::{Gist, GistUpdate, NewGist, User};

pub use client::GitHubClient;

/// Errors raised by remote calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Response parse error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Map a non-success status and GitHub's `message` to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// The GitHub endpoints Gistdesk consumes.
#[async_trait]
pub trait GistApi: Send + Sync {
    /// `GET /user`
    async fn authenticated_user(&self) -> Result<User, ApiError>;

    /// `GET /gists`
    async fn list_gists(&self) -> Result<Vec<Gist>, ApiError>;

    /// `GET /gists/starred`
    async fn list_starred_gists(&self) -> Result<Vec<Gist>, ApiError>;

    /// `GET /gists/{id}`
    async fn get_gist(&self, id: &str) -> Result<Gist, ApiError>;

    /// `POST /gists`
    async fn create_gist(&self, gist: &NewGist) -> Result<Gist, ApiError>;

    /// `PATCH /gists/{id}`
    async fn update_gist(&self, id: &str, update: &GistUpdate) -> Result<Gist, ApiError>;

    /// `DELETE /gists/{id}`
    async fn delete_gist(&self, id: &str) -> Result<(), ApiError>;

    /// `GET /gists/{id}/star`. GitHub answers 404 when the gist is not starred,
    /// which surfaces here as [`ApiError::NotFound`].
    async fn check_is_starred(&self, id: &str) -> Result<(), ApiError>;

    /// `PUT /gists/{id}/star`
    async fn star_gist(&self, id: &str) -> Result<(), ApiError>;

    /// `DELETE /gists/{id}/star`
    async fn unstar_gist(&self, id: &str) -> Result<(), ApiError>;
}

/// Builds an authenticated [`GistApi`] handle from a candidate token.
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn GistApi>, ApiError>;
}

/// Connector producing [`GitHubClient`]s.
#[derive(Clone, Debug)]
pub struct GitHubConnector {
    config: ClientConfig,
}

impl GitHubConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for GitHubConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn GistApi>, ApiError> {
        Ok(Arc::new(GitHubClient::new(&self.config, token)?))
    }
}
