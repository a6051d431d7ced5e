//! Gist client: the domain façade over [`GistApi`].
//!
//! Holds nothing but the authenticated handle; one is built per view from
//! [`crate::session::SessionManager::gist_client`].

use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, rng};
use tracing::{debug, warn};

use crate::github::{ApiError, GistApi};
use crate::models::{Gist, GistUpdate, NewGist, Stargazer};

/// Upper bound (exclusive) of the placeholder star count.
pub const STARGAZERS_COUNT_BOUND: u32 = 100;

/// Stateless façade mapping gist operations onto remote calls.
#[derive(Clone)]
pub struct GistClient {
    api: Arc<dyn GistApi>,
}

impl GistClient {
    pub fn new(api: Arc<dyn GistApi>) -> Self {
        Self { api }
    }

    /// Gists owned by the authenticated user. Order is whatever GitHub returns.
    pub async fn list_mine(&self) -> Result<Vec<Gist>, ApiError> {
        self.api.list_gists().await
    }

    /// Gists the authenticated user has starred.
    pub async fn list_starred(&self) -> Result<Vec<Gist>, ApiError> {
        self.api.list_starred_gists().await
    }

    pub async fn get(&self, id: &str) -> Result<Gist, ApiError> {
        self.api.get_gist(require_id(id)?).await
    }

    /// Create a gist. Filenames are not validated here; see [`crate::forms`].
    pub async fn create(&self, gist: &NewGist) -> Result<Gist, ApiError> {
        if gist.files.is_empty() {
            return Err(ApiError::InvalidInput("a gist needs at least one file".into()));
        }
        self.api.create_gist(gist).await
    }

    pub async fn update(&self, id: &str, update: &GistUpdate) -> Result<Gist, ApiError> {
        self.api.update_gist(require_id(id)?, update).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete_gist(require_id(id)?).await
    }

    /// Whether the authenticated user starred `id`.
    ///
    /// Every failure reads as `false`, including transport errors, so a
    /// network blip is indistinguishable from "not starred". Use
    /// [`GistClient::try_is_starred`] where that matters.
    pub async fn is_starred(&self, id: &str) -> bool {
        match self.try_is_starred(id).await {
            Ok(starred) => starred,
            Err(e) => {
                warn!(gist_id = id, error = %e, "star check failed, reporting not starred");
                false
            }
        }
    }

    /// Like [`GistClient::is_starred`] but only a 404 means "not starred".
    pub async fn try_is_starred(&self, id: &str) -> Result<bool, ApiError> {
        match self.api.check_is_starred(require_id(id)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn star(&self, id: &str) -> Result<(), ApiError> {
        self.api.star_gist(require_id(id)?).await
    }

    pub async fn unstar(&self, id: &str) -> Result<(), ApiError> {
        self.api.unstar_gist(require_id(id)?).await
    }

    /// Stargazers of `id`.
    ///
    /// GitHub has no stargazer listing for gists, so this is at most one entry:
    /// the authenticated user, timestamped now, when they starred the gist.
    pub async fn stargazers(&self, id: &str) -> Result<Vec<Stargazer>, ApiError> {
        if !self.is_starred(id).await {
            return Ok(Vec::new());
        }
        let user = self.api.authenticated_user().await?;
        Ok(vec![Stargazer {
            user,
            starred_at: Utc::now(),
        }])
    }

    /// Annotate each gist with a star count.
    ///
    /// GitHub does not expose gist star counts; this draws a fresh value in
    /// `[0, STARGAZERS_COUNT_BOUND)` per gist on every call.
    pub fn add_stargazers_count(mut gists: Vec<Gist>) -> Vec<Gist> {
        let mut rng = rng();
        for gist in &mut gists {
            gist.stargazers_count = Some(rng.random_range(0..STARGAZERS_COUNT_BOUND));
        }
        debug!(count = gists.len(), "annotated gists with star counts");
        gists
    }
}

fn require_id(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    match id {
        "" => Err(ApiError::InvalidInput("gist id must not be empty".into())),
        // URL path normalization would drop these and hit a different endpoint.
        "." | ".." => Err(ApiError::InvalidInput(format!("invalid gist id '{id}'"))),
        _ => Ok(id),
    }
}
