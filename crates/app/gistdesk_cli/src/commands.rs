use std::future::Future;
use std::io::BufRead;
use std::path::Path;

use gistdesk_core::config::ClientConfig;
use gistdesk_core::dashboard::{ViewScope, load_dashboard};
use gistdesk_core::forms::{GistForm, GistFormDraft};
use gistdesk_core::gists::GistClient;
use gistdesk_core::github::ApiError;
use gistdesk_core::models::Gist;
use gistdesk_core::routes::{GuardDecision, guard};
use gistdesk_core::session::SessionManager;
use log::info;
use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::{Error, Result};

pub async fn dispatch(args: Cli) -> Result<()> {
    let json = args.json;

    if let Commands::Version = args.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(path) = args.storage_file {
        config.storage_file = Some(path);
    }
    let sessions = SessionManager::github(&config)?;

    match args.command {
        Commands::Version => unreachable!("handled above"),
        Commands::Login { token } => {
            let token = match token {
                Some(t) => t,
                None => read_token()?,
            };
            let user = sessions.login(&token).await?;
            emit(json, &user, || println!("Logged in as {}", user.login))
        }
        Commands::Logout => {
            sessions.logout();
            Ok(())
        }
        Commands::Whoami => {
            let session = sessions.restore().await;
            let view = session.view();
            match &view.user {
                Some(user) => emit(json, &view, || {
                    println!("{} ({})", user.login, user.display_name())
                }),
                None => Err(gistdesk_core::session::SessionError::NotAuthenticated.into()),
            }
        }
        Commands::Route { path } => {
            let session = sessions.restore().await;
            let decision = guard(&session, &path);
            emit(json, &decision, || match &decision {
                GuardDecision::Wait => println!("wait"),
                GuardDecision::Redirect { to, from } => println!("redirect {to} (from {from})"),
                GuardDecision::Render { route } => println!("render {route}"),
            })
        }
        command => {
            sessions.restore().await;
            let client = sessions.require_client()?;
            run_gist_command(&client, command, json).await
        }
    }
}

async fn run_gist_command(client: &GistClient, command: Commands, json: bool) -> Result<()> {
    let scope = interruptible_scope();

    match command {
        Commands::List { starred } => {
            let gists = if starred {
                scope.run(client.list_starred()).await?
            } else {
                scope.run(client.list_mine()).await?
            };
            let gists = GistClient::add_stargazers_count(gists);
            emit(json, &gists, || gists.iter().for_each(print_summary))
        }
        Commands::Dashboard => {
            let dashboard = load_dashboard(client, &scope.token()).await?;
            emit(json, &dashboard, || {
                println!("Your gists:");
                dashboard.mine.iter().for_each(print_summary);
                println!("Starred:");
                dashboard.starred.iter().for_each(print_summary);
            })
        }
        Commands::Show { id } => {
            let gist = scope.run(client.get(&id)).await?;
            emit(json, &gist, || print_gist(&gist))
        }
        Commands::Create {
            description,
            public,
            files,
        } => {
            let mut form = GistForm::new();
            form.description = description;
            form.public = public;
            form.files = files
                .iter()
                .map(|p| -> Result<GistFormDraft> {
                    Ok(GistFormDraft::new(file_name(p)?, std::fs::read_to_string(p)?))
                })
                .collect::<Result<Vec<_>>>()?;
            let gist = scope.run(client.create(&form.to_new_gist()?)).await?;
            info!("Created gist {}", gist.id);
            emit(json, &gist, || print_summary(&gist))
        }
        Commands::Edit {
            id,
            description,
            files,
            deletes,
            renames,
        } => {
            let current = scope.run(client.get(&id)).await?;
            let mut form = GistForm::from_gist(&current);
            apply_edits(&mut form, description, &files, &deletes, &renames)?;
            let gist = scope.run(client.update(&id, &form.to_update()?)).await?;
            info!("Updated gist {}", gist.id);
            emit(json, &gist, || print_summary(&gist))
        }
        Commands::Delete { id } => {
            scope.run(client.delete(&id)).await?;
            info!("Deleted gist {id}");
            Ok(())
        }
        Commands::Star { id } => {
            scope.run(client.star(&id)).await?;
            info!("Starred gist {id}");
            Ok(())
        }
        Commands::Unstar { id } => {
            scope.run(client.unstar(&id)).await?;
            info!("Unstarred gist {id}");
            Ok(())
        }
        Commands::Starred { id, strict } => {
            let starred = if strict {
                scope.run(client.try_is_starred(&id)).await?
            } else {
                scope.run(infallible(client.is_starred(&id))).await?
            };
            emit(json, &starred, || {
                println!("{}", if starred { "starred" } else { "not starred" })
            })
        }
        Commands::Stargazers { id } => {
            let gazers = scope.run(client.stargazers(&id)).await?;
            emit(json, &gazers, || {
                for g in &gazers {
                    println!("{}  {}", g.user.login, g.starred_at.to_rfc3339());
                }
            })
        }
        Commands::Version
        | Commands::Login { .. }
        | Commands::Logout
        | Commands::Whoami
        | Commands::Route { .. } => unreachable!("handled by dispatch"),
    }
}

/// Scope cancelled by Ctrl-C, so an interrupted fetch ends as "Request cancelled".
fn interruptible_scope() -> ViewScope {
    let scope = ViewScope::new();
    let token = scope.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    scope
}

async fn infallible<T>(fut: impl Future<Output = T>) -> std::result::Result<T, ApiError> {
    Ok(fut.await)
}

fn apply_edits(
    form: &mut GistForm,
    description: Option<String>,
    files: &[std::path::PathBuf],
    deletes: &[String],
    renames: &[(String, String)],
) -> Result<()> {
    if let Some(description) = description {
        form.description = description;
    }

    for name in deletes {
        let index = live_index(form, name)?;
        form.remove_file(index);
    }

    for (old, new) in renames {
        let index = live_index(form, old)?;
        form.files[index].filename = new.clone();
    }

    for path in files {
        let name = file_name(path)?;
        let content = std::fs::read_to_string(path)?;
        match live_index(form, &name) {
            Ok(index) => form.files[index].content = content,
            Err(_) => form.add_file(name, content),
        }
    }

    Ok(())
}

fn live_index(form: &GistForm, name: &str) -> Result<usize> {
    form.files
        .iter()
        .position(|d| !d.deleted && d.filename == name)
        .ok_or_else(|| Error::Custom(format!("no file named '{name}' in this gist")))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Custom(format!("not a file path: {}", path.display())))
}

fn read_token() -> Result<String> {
    eprintln!("Paste a GitHub personal access token with the `gist` scope:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_summary(gist: &Gist) {
    let visibility = if gist.public { "public" } else { "secret" };
    let stars = gist
        .stargazers_count
        .map(|c| format!("  ★{c}"))
        .unwrap_or_default();
    println!(
        "{}  {:<6}  {}  ({} files){}",
        gist.id,
        visibility,
        gist.title(),
        gist.files.len(),
        stars
    );
}

fn print_gist(gist: &Gist) {
    print_summary(gist);
    if let Some(url) = &gist.html_url {
        println!("{url}");
    }
    for file in gist.files.values() {
        let language = file.language.as_deref().unwrap_or("plain");
        println!();
        println!("==> {} [{}]", file.filename, language);
        println!("{}", file.content);
    }
}
