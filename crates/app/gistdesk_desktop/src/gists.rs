//! Gist commands exposed to the web view.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use gistdesk_core::dashboard::{self, Dashboard, ViewScope};
use gistdesk_core::forms::GistForm;
use gistdesk_core::gists::GistClient;
use gistdesk_core::models::{Gist, GistUpdate, Stargazer};
use gistdesk_core::session::SessionManager;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Open views, each with the scope that cancels its in-flight fetches.
#[derive(Default)]
pub struct Views {
    scopes: Mutex<HashMap<String, (u64, ViewScope)>>,
    generation: std::sync::atomic::AtomicU64,
}

impl Views {
    /// Open `view_id`, cancelling whatever an earlier open of the same view left running.
    fn open(&self, view_id: &str) -> Result<(u64, CancellationToken), String> {
        let generation = self
            .generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let scope = ViewScope::new();
        let token = scope.token();
        let mut open = self.scopes.lock().map_err(|e| format!("lock: {e}"))?;
        if open.insert(view_id.to_string(), (generation, scope)).is_some() {
            debug!(view_id, "replaced running view");
        }
        Ok((generation, token))
    }

    /// Forget `view_id` once its load is done, unless it was reopened meanwhile.
    fn finish(&self, view_id: &str, generation: u64) {
        if let Ok(mut open) = self.scopes.lock()
            && open.get(view_id).is_some_and(|(g, _)| *g == generation)
        {
            open.remove(view_id);
        }
    }

    fn close(&self, view_id: &str) -> Result<bool, String> {
        let mut open = self.scopes.lock().map_err(|e| format!("lock: {e}"))?;
        // Dropping the scope cancels it.
        Ok(open.remove(view_id).is_some())
    }
}

fn client(sessions: &SessionManager) -> Result<GistClient, String> {
    sessions.require_client().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn load_dashboard(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    views: tauri::State<'_, Views>,
    view_id: String,
) -> Result<Dashboard, String> {
    let client = client(&sessions)?;
    let (generation, token) = views.open(&view_id)?;
    let result = dashboard::load_dashboard(&client, &token).await;
    views.finish(&view_id, generation);
    result.map_err(|e| e.to_string())
}

/// Cancel the fetches of a view the user navigated away from.
#[tauri::command]
pub fn cancel_view(views: tauri::State<'_, Views>, view_id: String) -> Result<bool, String> {
    views.close(&view_id)
}

#[tauri::command]
pub async fn list_gists(
    sessions: tauri::State<'_, Arc<SessionManager>>,
) -> Result<Vec<Gist>, String> {
    let gists = client(&sessions)?
        .list_mine()
        .await
        .map_err(|e| e.to_string())?;
    Ok(GistClient::add_stargazers_count(gists))
}

#[tauri::command]
pub async fn list_starred_gists(
    sessions: tauri::State<'_, Arc<SessionManager>>,
) -> Result<Vec<Gist>, String> {
    client(&sessions)?
        .list_starred()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<Gist, String> {
    client(&sessions)?.get(&id).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn create_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    form: GistForm,
) -> Result<Gist, String> {
    let payload = form.to_new_gist().map_err(|e| e.to_string())?;
    let gist = client(&sessions)?
        .create(&payload)
        .await
        .map_err(|e| e.to_string())?;
    info!(id = %gist.id, "created gist");
    Ok(gist)
}

/// Update from the edit form, or from a raw patch when `form` is absent.
#[tauri::command]
pub async fn update_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
    form: Option<GistForm>,
    update: Option<GistUpdate>,
) -> Result<Gist, String> {
    let payload = match (form, update) {
        (Some(form), _) => form.to_update().map_err(|e| e.to_string())?,
        (None, Some(update)) => update,
        (None, None) => return Err("either form or update is required".to_string()),
    };
    let gist = client(&sessions)?
        .update(&id, &payload)
        .await
        .map_err(|e| e.to_string())?;
    info!(id = %gist.id, "updated gist");
    Ok(gist)
}

#[tauri::command]
pub async fn delete_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<(), String> {
    client(&sessions)?
        .delete(&id)
        .await
        .map_err(|e| e.to_string())?;
    info!(id, "deleted gist");
    Ok(())
}

/// Always answers; transport failures read as "not starred".
#[tauri::command]
pub async fn is_starred(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<bool, String> {
    Ok(client(&sessions)?.is_starred(&id).await)
}

#[tauri::command]
pub async fn star_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<(), String> {
    client(&sessions)?
        .star(&id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn unstar_gist(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<(), String> {
    client(&sessions)?
        .unstar(&id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_stargazers(
    sessions: tauri::State<'_, Arc<SessionManager>>,
    id: String,
) -> Result<Vec<Stargazer>, String> {
    client(&sessions)?
        .stargazers(&id)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopening_a_view_cancels_the_previous_load() {
        let views = Views::default();
        let (_, first) = views.open("dashboard").unwrap();
        let (second_gen, second) = views.open("dashboard").unwrap();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        views.finish("dashboard", second_gen);
        assert!(!views.close("dashboard").unwrap());
    }

    #[test]
    fn stale_finish_keeps_the_newer_view() {
        let views = Views::default();
        let (first_gen, _) = views.open("dashboard").unwrap();
        let (_, second) = views.open("dashboard").unwrap();

        views.finish("dashboard", first_gen);
        assert!(!second.is_cancelled());

        assert!(views.close("dashboard").unwrap());
        assert!(second.is_cancelled());
    }
}
