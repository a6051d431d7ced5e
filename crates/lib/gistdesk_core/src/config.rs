//! Client configuration.

use std::path::PathBuf;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration shared by the GitHub transport and the token store.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the GitHub REST API (GitHub Enterprise uses `https://<host>/api/v3`).
    pub api_url: String,
    /// `User-Agent` header sent with every request. GitHub rejects requests without one.
    pub user_agent: String,
    /// Explicit location of the token storage file. `None` uses the platform data dir.
    pub storage_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                              |
    /// |-------------------------|--------------------------------------|
    /// | `GITHUB_API_URL`        | `https://api.github.com`             |
    /// | `GISTDESK_USER_AGENT`   | `gistdesk/<version>`                 |
    /// | `GISTDESK_STORAGE_FILE` | `<data_dir>/gistdesk/storage.json`   |
    pub fn from_env() -> Self {
        Self {
            api_url: non_empty_var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            user_agent: non_empty_var("GISTDESK_USER_AGENT").unwrap_or_else(default_user_agent),
            storage_file: non_empty_var("GISTDESK_STORAGE_FILE").map(PathBuf::from),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            user_agent: default_user_agent(),
            storage_file: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("gistdesk/{}", crate::version())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_public_github() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert!(config.user_agent.starts_with("gistdesk/"));
        assert!(config.storage_file.is_none());
    }
}
