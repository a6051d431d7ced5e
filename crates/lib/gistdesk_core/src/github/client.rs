//! `reqwest` implementation of [`GistApi`].

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ApiError, GistApi};
use crate::config::ClientConfig;
use crate::models::{Gist, GistUpdate, NewGist, User};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
/// Largest page GitHub serves for gist listings.
const PER_PAGE: &str = "100";

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Authenticated GitHub REST client. Cheap to clone.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GitHubClient {
    /// Build a client that sends `Authorization: Bearer <token>` on every call.
    pub fn new(config: &ClientConfig, token: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| ApiError::InvalidInput(format!("GitHub API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidInput(format!(
                "GitHub API URL cannot be a base: {base_url}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    /// Base URL joined with the given path segments (each percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidInput(format!("bad base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, path = url.path(), "GitHub request");
        Ok(self.http.request(method, url).bearer_auth(&self.token))
    }

    /// Send and turn non-2xx answers into [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        debug!(status = status.as_u16(), %message, "GitHub request failed");
        Err(ApiError::from_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.send(request).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GistApi for GitHubClient {
    async fn authenticated_user(&self) -> Result<User, ApiError> {
        let req = self.request(Method::GET, &["user"])?;
        self.send_json(req).await
    }

    async fn list_gists(&self) -> Result<Vec<Gist>, ApiError> {
        let req = self
            .request(Method::GET, &["gists"])?
            .query(&[("per_page", PER_PAGE)]);
        self.send_json(req).await
    }

    async fn list_starred_gists(&self) -> Result<Vec<Gist>, ApiError> {
        let req = self
            .request(Method::GET, &["gists", "starred"])?
            .query(&[("per_page", PER_PAGE)]);
        self.send_json(req).await
    }

    async fn get_gist(&self, id: &str) -> Result<Gist, ApiError> {
        let req = self.request(Method::GET, &["gists", id])?;
        self.send_json(req).await
    }

    async fn create_gist(&self, gist: &NewGist) -> Result<Gist, ApiError> {
        let req = self.request(Method::POST, &["gists"])?.json(gist);
        self.send_json(req).await
    }

    async fn update_gist(&self, id: &str, update: &GistUpdate) -> Result<Gist, ApiError> {
        let req = self.request(Method::PATCH, &["gists", id])?.json(update);
        self.send_json(req).await
    }

    async fn delete_gist(&self, id: &str) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &["gists", id])?;
        self.send(req).await.map(drop)
    }

    async fn check_is_starred(&self, id: &str) -> Result<(), ApiError> {
        let req = self.request(Method::GET, &["gists", id, "star"])?;
        self.send(req).await.map(drop)
    }

    async fn star_gist(&self, id: &str) -> Result<(), ApiError> {
        // GitHub wants an explicit zero-length body on this PUT.
        let req = self
            .request(Method::PUT, &["gists", id, "star"])?
            .header(reqwest::header::CONTENT_LENGTH, "0");
        self.send(req).await.map(drop)
    }

    async fn unstar_gist(&self, id: &str) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &["gists", id, "star"])?;
        self.send(req).await.map(drop)
    }
}
