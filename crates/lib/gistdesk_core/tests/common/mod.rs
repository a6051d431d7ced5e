//! In-process mock of the GitHub gist endpoints, served on an ephemeral port.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use gistdesk_core::config::ClientConfig;

pub const VALID_TOKEN: &str = "ghp_valid";
pub const LOGIN: &str = "alice";
const TIMESTAMP: &str = "2024-01-01T00:00:00Z";

#[derive(Default)]
pub struct MockState {
    pub gists: BTreeMap<String, Value>,
    pub starred: HashSet<String>,
    /// Raw body of the last `PATCH /gists/{id}`.
    pub last_patch: Option<Value>,
    pub next_id: u32,
    /// Number of requests that passed authentication.
    pub requests: u32,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockGitHub {
    pub base_url: String,
    pub state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl MockGitHub {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/user", get(user))
            .route("/gists", get(list_gists).post(create_gist))
            .route("/gists/starred", get(list_starred))
            .route(
                "/gists/{id}",
                get(get_gist).patch(update_gist).delete(delete_gist),
            )
            .route(
                "/gists/{id}/star",
                get(check_star).put(star).delete(unstar),
            )
            .layer(middleware::from_fn_with_state(state.clone(), require_token))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock GitHub");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock GitHub");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            ..ClientConfig::default()
        }
    }

    /// Insert a gist owned by [`LOGIN`] and return its id.
    pub fn seed(&self, description: &str, files: &[(&str, &str)]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("mock{}", state.next_id);
        let files: BTreeMap<String, String> = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let gist = gist_json(&id, description, true, &files);
        state.gists.insert(id.clone(), gist);
        id
    }

    pub fn last_patch(&self) -> Option<Value> {
        self.state.lock().unwrap().last_patch.clone()
    }
}

impl Drop for MockGitHub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Config pointing at a port nothing listens on.
pub async fn unreachable_config() -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ClientConfig {
        api_url: format!("http://{addr}"),
        ..ClientConfig::default()
    }
}

fn gist_json(id: &str, description: &str, public: bool, files: &BTreeMap<String, String>) -> Value {
    let files: serde_json::Map<String, Value> = files
        .iter()
        .map(|(name, content)| (name.clone(), file_json(name, content)))
        .collect();
    json!({
        "id": id,
        "description": description,
        "public": public,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "owner": {"login": LOGIN, "id": 1},
        "html_url": format!("https://gist.example.test/{id}"),
        "files": files,
    })
}

fn file_json(name: &str, content: &str) -> Value {
    json!({
        "filename": name,
        "type": "text/plain",
        "language": "Text",
        "raw_url": format!("https://gist.example.test/raw/{name}"),
        "size": content.len(),
        "truncated": false,
        "content": content,
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message}))).into_response()
}

async fn require_token(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {VALID_TOKEN}"));
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    state.lock().unwrap().requests += 1;
    next.run(request).await
}

async fn user() -> Json<Value> {
    Json(json!({
        "login": LOGIN,
        "id": 1,
        "name": "Alice",
        "email": null,
        "avatar_url": "https://avatars.example.test/alice.png",
    }))
}

async fn list_gists(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(Value::Array(state.gists.values().cloned().collect()))
}

async fn list_starred(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(Value::Array(
        state
            .gists
            .iter()
            .filter(|(id, _)| state.starred.contains(*id))
            .map(|(_, g)| g.clone())
            .collect(),
    ))
}

async fn get_gist(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    match state.lock().unwrap().gists.get(&id) {
        Some(gist) => Json(gist.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn create_gist(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let Some(files_in) = body["files"].as_object().filter(|f| !f.is_empty()) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed");
    };
    let files: BTreeMap<String, String> = files_in
        .iter()
        .map(|(name, f)| {
            (
                name.clone(),
                f["content"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    state.next_id += 1;
    let id = format!("mock{}", state.next_id);
    let gist = gist_json(
        &id,
        body["description"].as_str().unwrap_or_default(),
        body["public"].as_bool().unwrap_or(false),
        &files,
    );
    state.gists.insert(id, gist.clone());
    (StatusCode::CREATED, Json(gist)).into_response()
}

async fn update_gist(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.last_patch = Some(body.clone());
    let Some(gist) = state.gists.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Not Found");
    };

    if let Some(description) = body.get("description").and_then(Value::as_str) {
        gist["description"] = json!(description);
    }
    if let Some(changes) = body.get("files").and_then(Value::as_object) {
        let files = gist["files"].as_object_mut().expect("files object");
        for (name, change) in changes {
            if change.is_null() {
                files.remove(name);
                continue;
            }
            let content = change["content"].as_str().unwrap_or_default();
            let new_name = change["filename"].as_str().unwrap_or(name).to_string();
            files.remove(name);
            files.insert(new_name.clone(), file_json(&new_name, content));
        }
    }
    Json(gist.clone()).into_response()
}

async fn delete_gist(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    match state.lock().unwrap().gists.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn check_star(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if state.lock().unwrap().starred.contains(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Not Found")
    }
}

async fn star(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut state = state.lock().unwrap();
    if !state.gists.contains_key(&id) {
        return StatusCode::NOT_FOUND;
    }
    state.starred.insert(id);
    StatusCode::NO_CONTENT
}

async fn unstar(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    state.lock().unwrap().starred.remove(&id);
    StatusCode::NO_CONTENT
}
