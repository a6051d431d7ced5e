//! # gistdesk_core
//!
//! Core logic for Gistdesk: the session manager, the GitHub Gist client, the
//! route guard and the form drafts behind the create/edit screens.
//!
//! The desktop shell and the CLI both drive the same [`session::SessionManager`];
//! neither talks to GitHub directly.

pub mod config;
pub mod dashboard;
pub mod forms;
pub mod gists;
pub mod github;
pub mod models;
pub mod routes;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
