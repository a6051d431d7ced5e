//! Gist models and request payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// A gist as mirrored from GitHub. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Files keyed by filename.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    /// Local annotation, see [`crate::gists::GistClient::add_stargazers_count`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stargazers_count: Option<u32>,
}

impl Gist {
    /// Description, or the first filename when the description is blank.
    pub fn title(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => self.files.keys().next().map(String::as_str).unwrap_or(&self.id),
        }
    }
}

/// A file inside a gist.
///
/// List endpoints omit `content`; it deserializes to an empty string there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistFile {
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub truncated: Option<bool>,
}

/// Body of `POST /gists`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGist {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, NewGistFile>,
}

/// File entry of a [`NewGist`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGistFile {
    pub content: String,
}

impl NewGist {
    /// Build a payload from `(filename, content)` pairs.
    pub fn new<I, K, V>(description: impl Into<String>, public: bool, files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            description: description.into(),
            public,
            files: files
                .into_iter()
                .map(|(name, content)| {
                    (
                        name.into(),
                        NewGistFile {
                            content: content.into(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Body of `PATCH /gists/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GistUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Keyed by the filename as currently stored on GitHub.
    #[serde(default)]
    pub files: BTreeMap<String, FileChange>,
}

/// Change to a single file in a [`GistUpdate`].
///
/// `Delete` serializes as JSON `null`, which is how GitHub removes a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileChange {
    Edit {
        content: String,
        /// New name when the file is renamed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    Delete,
}

impl FileChange {
    pub fn content(content: impl Into<String>) -> Self {
        FileChange::Edit {
            content: content.into(),
            filename: None,
        }
    }

    pub fn rename(content: impl Into<String>, filename: impl Into<String>) -> Self {
        FileChange::Edit {
            content: content.into(),
            filename: Some(filename.into()),
        }
    }
}

/// Someone who starred a gist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stargazer {
    pub user: User,
    pub starred_at: DateTime<Utc>,
}
