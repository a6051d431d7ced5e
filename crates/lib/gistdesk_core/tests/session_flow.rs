//! Session manager against the mock GitHub API.

mod common;

use std::sync::Arc;

use common::{LOGIN, MockGitHub, VALID_TOKEN};
use gistdesk_core::github::{ApiError, GitHubConnector};
use gistdesk_core::session::{
    FileTokenStore, NotificationLevel, SessionError, SessionManager, TokenStore,
};

fn file_store(dir: &tempfile::TempDir) -> Arc<FileTokenStore> {
    Arc::new(FileTokenStore::new(dir.path().join("storage.json")))
}

fn manager(mock: &MockGitHub, store: Arc<FileTokenStore>) -> SessionManager {
    SessionManager::new(Arc::new(GitHubConnector::new(mock.config())), store)
}

#[tokio::test]
async fn login_with_valid_token_authenticates() {
    let mock = MockGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let sessions = manager(&mock, store.clone());
    let mut events = sessions.subscribe();

    let user = sessions.login(VALID_TOKEN).await.expect("login");
    assert_eq!(user.login, LOGIN);
    assert_eq!(user.name.as_deref(), Some("Alice"));

    let snapshot = sessions.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.user().map(|u| u.login.as_str()), Some(LOGIN));
    assert!(snapshot.client().is_some());
    assert_eq!(store.load().unwrap().as_deref(), Some(VALID_TOKEN));
    assert_eq!(events.recv().await.unwrap().level, NotificationLevel::Success);
}

#[tokio::test]
async fn login_with_invalid_token_fails_cleanly() {
    let mock = MockGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.save("ghp_previous").unwrap();
    let sessions = manager(&mock, store.clone());

    let err = sessions.login("ghp_invalid").await.unwrap_err();
    match err {
        SessionError::Authentication(ApiError::Unauthorized(message)) => {
            assert_eq!(message, "Bad credentials")
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let snapshot = sessions.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(!snapshot.is_loading());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn startup_restores_stored_token() {
    let mock = MockGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.save(VALID_TOKEN).unwrap();

    let sessions = manager(&mock, store);
    assert!(sessions.snapshot().is_loading());

    let snapshot = sessions.restore().await;
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.user().unwrap().login, LOGIN);
}

#[tokio::test]
async fn startup_with_revoked_token_removes_it() {
    let mock = MockGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.save("ghp_revoked").unwrap();

    let sessions = manager(&mock, store.clone());
    let snapshot = sessions.restore().await;

    assert!(!snapshot.is_authenticated());
    assert!(!snapshot.is_loading());
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn startup_while_offline_is_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.save(VALID_TOKEN).unwrap();

    let config = common::unreachable_config().await;
    let sessions = SessionManager::new(Arc::new(GitHubConnector::new(config)), store);
    let snapshot = sessions.restore().await;

    assert!(!snapshot.is_authenticated());
    assert!(!snapshot.is_loading());
}

#[tokio::test]
async fn logout_twice_is_harmless() {
    let mock = MockGitHub::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let sessions = manager(&mock, store.clone());

    sessions.login(VALID_TOKEN).await.unwrap();
    sessions.logout();
    let after_first = sessions.snapshot().view();
    sessions.logout();
    let after_second = sessions.snapshot().view();

    assert_eq!(after_first, after_second);
    assert!(!after_second.authenticated);
    assert_eq!(store.load().unwrap(), None);
}
