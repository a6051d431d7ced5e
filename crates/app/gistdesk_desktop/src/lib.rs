use std::sync::Arc;

use gistdesk_core::config::ClientConfig;
use gistdesk_core::routes::{GuardDecision, guard};
use gistdesk_core::session::{SessionManager, SessionView};
use tauri::{AppHandle, Emitter, Manager};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

mod gists;

/// Event carrying a [`gistdesk_core::session::Notification`] to the web view.
const NOTIFICATION_EVENT: &str = "session-notification";
/// Event carrying the current [`SessionView`] after every transition.
const SESSION_EVENT: &str = "session-changed";

fn emit_session(app: &AppHandle, sessions: &SessionManager) {
    if let Err(e) = app.emit(SESSION_EVENT, sessions.snapshot().view()) {
        warn!("failed to emit session state: {e}");
    }
}

#[tauri::command]
fn get_session(sessions: tauri::State<'_, Arc<SessionManager>>) -> SessionView {
    sessions.snapshot().view()
}

#[tauri::command]
async fn login(
    app: AppHandle,
    sessions: tauri::State<'_, Arc<SessionManager>>,
    token: String,
) -> Result<SessionView, String> {
    let result = sessions.login(&token).await;
    emit_session(&app, &sessions);
    result.map_err(|e| e.to_string())?;
    Ok(sessions.snapshot().view())
}

#[tauri::command]
fn logout(app: AppHandle, sessions: tauri::State<'_, Arc<SessionManager>>) -> SessionView {
    sessions.logout();
    emit_session(&app, &sessions);
    sessions.snapshot().view()
}

#[tauri::command]
fn check_route(sessions: tauri::State<'_, Arc<SessionManager>>, path: String) -> GuardDecision {
    guard(&sessions.snapshot(), &path)
}

/// Forwards session notifications to the web view until the manager goes away.
fn spawn_notification_forwarder(app: AppHandle, sessions: &SessionManager) {
    let mut rx = sessions.subscribe();
    tauri::async_runtime::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    if let Err(e) = app.emit(NOTIFICATION_EVENT, &notification) {
                        warn!("failed to emit notification: {e}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification forwarder lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gistdesk_core=debug".into()),
        )
        .init();

    let config = ClientConfig::from_env();
    info!(api_url = %config.api_url, "starting gistdesk desktop");

    let sessions = match SessionManager::github(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to open token storage: {e}");
            std::process::exit(1);
        }
    };

    run_tauri(sessions);
}

fn run_tauri(sessions: Arc<SessionManager>) {
    let result = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(sessions)
        .manage(gists::Views::default())
        .invoke_handler(tauri::generate_handler![
            get_session,
            login,
            logout,
            check_route,
            gists::load_dashboard,
            gists::cancel_view,
            gists::list_gists,
            gists::list_starred_gists,
            gists::get_gist,
            gists::create_gist,
            gists::update_gist,
            gists::delete_gist,
            gists::is_starred,
            gists::star_gist,
            gists::unstar_gist,
            gists::get_stargazers
        ])
        .setup(|app| {
            let handle = app.handle().clone();
            let sessions = app.state::<Arc<SessionManager>>().inner().clone();

            spawn_notification_forwarder(handle.clone(), &sessions);

            // Silent login with the stored token; the UI shows a wait state meanwhile.
            tauri::async_runtime::spawn(async move {
                let session = sessions.restore().await;
                info!(authenticated = session.is_authenticated(), "session restored");
                emit_session(&handle, &sessions);
            });

            #[cfg(debug_assertions)]
            {
                if let Some(win) = app.get_webview_window("main") {
                    win.open_devtools();
                }
            }
            Ok(())
        })
        .run(tauri::generate_context!());

    if let Err(e) = result {
        error!("error while running tauri application: {e}");
        std::process::exit(1);
    }
}
