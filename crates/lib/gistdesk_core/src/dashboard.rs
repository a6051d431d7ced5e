//! Dashboard loading and view-scoped cancellation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::gists::GistClient;
use crate::github::ApiError;
use crate::models::Gist;

/// Data behind the dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Own gists, annotated with star counts.
    pub mine: Vec<Gist>,
    pub starred: Vec<Gist>,
}

/// Fetch own and starred gists concurrently.
///
/// All-or-nothing: if either request fails the whole load fails.
pub async fn load_dashboard(
    client: &GistClient,
    cancel: &CancellationToken,
) -> Result<Dashboard, ApiError> {
    let (mine, starred) = cancellable(cancel, async {
        tokio::try_join!(client.list_mine(), client.list_starred())
    })
    .await?;

    debug!(
        mine = mine.len(),
        starred = starred.len(),
        "dashboard loaded"
    );

    Ok(Dashboard {
        mine: GistClient::add_stargazers_count(mine),
        starred,
    })
}

/// Race `fut` against `cancel`; a cancelled token wins with [`ApiError::Cancelled`].
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        res = fut => res,
    }
}

/// Bounds the fetches of one view. Dropping the scope cancels them.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for work that should stop when the view goes away.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the view is torn down first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        cancellable(&self.token, fut).await
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
