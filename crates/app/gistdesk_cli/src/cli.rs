use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gistdesk", version, about = "Manage your GitHub Gists")]
pub struct Cli {
    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Token storage file (defaults to the platform data directory).
    #[arg(long, env = "GISTDESK_STORAGE_FILE", global = true)]
    pub storage_file: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Validate a personal access token and remember it.
    Login {
        /// Token to use; read from stdin when omitted.
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Forget the stored token.
    Logout,

    /// Show the logged-in account.
    Whoami,

    /// List your gists.
    List {
        /// List starred gists instead.
        #[arg(long)]
        starred: bool,
    },

    /// Your gists and your starred gists.
    Dashboard,

    /// Show a gist with its files.
    Show { id: String },

    /// Create a gist from local files.
    Create {
        #[arg(short, long, default_value = "")]
        description: String,

        /// Make the gist public.
        #[arg(long)]
        public: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Edit a gist.
    Edit {
        id: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Add or replace a file with the contents of a local file.
        #[arg(long = "file")]
        files: Vec<PathBuf>,

        /// Delete a file by name.
        #[arg(long = "delete")]
        deletes: Vec<String>,

        /// Rename a file, as OLD=NEW.
        #[arg(long = "rename", value_parser = parse_rename)]
        renames: Vec<(String, String)>,
    },

    /// Delete a gist.
    Delete { id: String },

    /// Star a gist.
    Star { id: String },

    /// Remove your star from a gist.
    Unstar { id: String },

    /// Whether you starred a gist.
    Starred {
        id: String,

        /// Fail on network errors instead of reporting "not starred".
        #[arg(long)]
        strict: bool,
    },

    /// Who starred a gist.
    Stargazers { id: String },

    /// Show what the app would do when opening a path.
    Route { path: String },
}

fn parse_rename(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((old, new)) if !old.trim().is_empty() && !new.trim().is_empty() => {
            Ok((old.trim().to_string(), new.trim().to_string()))
        }
        _ => Err(format!("expected OLD=NEW, got '{raw}'")),
    }
}
