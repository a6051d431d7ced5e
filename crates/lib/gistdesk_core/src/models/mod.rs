//! Domain models.
//!
//! Wire-compatible with the GitHub REST representation so the transport can
//! deserialize responses straight into them.

pub mod gist;
pub mod user;

pub use gist::{FileChange, Gist, GistFile, GistUpdate, NewGist, NewGistFile, Stargazer};
pub use user::User;
