//! Create/edit form state.
//!
//! A [`GistForm`] holds drafts, never the fetched [`Gist`]; converting it
//! produces the `POST` or `PATCH` payload.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FileChange, Gist, GistUpdate, NewGist, NewGistFile};

/// Form validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// One file row of the form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GistFormDraft {
    /// Name on GitHub; `None` for files added in this edit session.
    pub original_filename: Option<String>,
    pub filename: String,
    pub content: String,
    pub deleted: bool,
}

impl GistFormDraft {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            original_filename: None,
            filename: filename.into(),
            content: content.into(),
            deleted: false,
        }
    }

    fn is_live(&self) -> bool {
        !self.deleted
    }

    fn is_renamed(&self) -> bool {
        self.original_filename
            .as_deref()
            .is_some_and(|orig| orig != self.filename.trim())
    }
}

/// Create/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistForm {
    pub description: String,
    pub public: bool,
    pub files: Vec<GistFormDraft>,
}

impl Default for GistForm {
    fn default() -> Self {
        Self::new()
    }
}

impl GistForm {
    /// Blank create form with a single empty file.
    pub fn new() -> Self {
        Self {
            description: String::new(),
            public: false,
            files: vec![GistFormDraft::default()],
        }
    }

    /// Edit form seeded from a fetched gist, files in filename order.
    pub fn from_gist(gist: &Gist) -> Self {
        Self {
            description: gist.description.clone().unwrap_or_default(),
            public: gist.public,
            files: gist
                .files
                .values()
                .map(|f| GistFormDraft {
                    original_filename: Some(f.filename.clone()),
                    filename: f.filename.clone(),
                    content: f.content.clone(),
                    deleted: false,
                })
                .collect(),
        }
    }

    pub fn add_file(&mut self, filename: impl Into<String>, content: impl Into<String>) {
        self.files.push(GistFormDraft::new(filename, content));
    }

    /// Remove a row: files already on GitHub are marked deleted, new ones dropped.
    pub fn remove_file(&mut self, index: usize) {
        let Some(draft) = self.files.get_mut(index) else {
            return;
        };
        if draft.original_filename.is_some() {
            draft.deleted = true;
        } else {
            self.files.remove(index);
        }
    }

    fn live(&self) -> impl Iterator<Item = &GistFormDraft> {
        self.files.iter().filter(|d| d.is_live())
    }

    /// Check filenames and content of the live drafts.
    pub fn validate(&self) -> Result<(), FormError> {
        let mut seen = HashSet::new();
        for draft in self.live() {
            let name = draft.filename.trim();
            if name.is_empty() {
                return Err(FormError::Validation("filename must not be empty".into()));
            }
            if name.contains('/') {
                return Err(FormError::Validation(format!(
                    "filename '{name}' must not contain '/'"
                )));
            }
            if !seen.insert(name) {
                return Err(FormError::Validation(format!(
                    "filename '{name}' is used more than once"
                )));
            }
        }
        // A renamed file is still patched under its old name, so no new file may take it.
        for draft in self.live().filter(|d| d.is_renamed()) {
            let Some(orig) = draft.original_filename.as_deref() else {
                continue;
            };
            let taken = self
                .live()
                .any(|d| d.original_filename.is_none() && d.filename.trim() == orig);
            if taken {
                return Err(FormError::Validation(format!(
                    "filename '{orig}' is still used by the file being renamed to '{}'",
                    draft.filename.trim()
                )));
            }
        }
        if !self.live().any(|d| !d.content.trim().is_empty()) {
            return Err(FormError::Validation(
                "at least one file needs content".into(),
            ));
        }
        Ok(())
    }

    /// Payload for `POST /gists`.
    pub fn to_new_gist(&self) -> Result<NewGist, FormError> {
        self.validate()?;
        let files = self
            .live()
            .map(|d| {
                (
                    d.filename.trim().to_string(),
                    NewGistFile {
                        content: d.content.clone(),
                    },
                )
            })
            .collect();
        Ok(NewGist {
            description: self.description.trim().to_string(),
            public: self.public,
            files,
        })
    }

    /// Payload for `PATCH /gists/{id}`.
    pub fn to_update(&self) -> Result<GistUpdate, FormError> {
        self.validate()?;
        let mut files = BTreeMap::new();
        for draft in &self.files {
            match (&draft.original_filename, draft.deleted) {
                (Some(orig), true) => {
                    files.insert(orig.clone(), FileChange::Delete);
                }
                (None, true) => {}
                (Some(orig), false) if draft.is_renamed() => {
                    files.insert(
                        orig.clone(),
                        FileChange::rename(draft.content.clone(), draft.filename.trim()),
                    );
                }
                (Some(orig), false) => {
                    files.insert(orig.clone(), FileChange::content(draft.content.clone()));
                }
                (None, false) => {
                    files.insert(
                        draft.filename.trim().to_string(),
                        FileChange::content(draft.content.clone()),
                    );
                }
            }
        }
        Ok(GistUpdate {
            description: Some(self.description.trim().to_string()),
            files,
        })
    }
}
