//! Route table and route guard.
//!
//! The guard is a pure function of a [`Session`] snapshot and the requested
//! path; it keeps no state of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Login entry point.
pub const LOGIN_PATH: &str = "/login";
/// Where a successful login lands when no location was captured.
pub const HOME_PATH: &str = "/";

/// Application routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "id", rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Gists,
    GistCreate,
    GistDetail(String),
    GistEdit(String),
    NotFound,
}

impl Route {
    /// Match a path (query string and fragment ignored, trailing slash tolerated).
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Dashboard,
            ["login"] => Route::Login,
            ["gists"] => Route::Gists,
            ["gists", "create"] => Route::GistCreate,
            ["gists", id] => Route::GistDetail((*id).to_string()),
            ["gists", id, "edit"] => Route::GistEdit((*id).to_string()),
            _ => Route::NotFound,
        }
    }

    /// Whether the route needs an authenticated session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::NotFound)
    }

    /// Canonical path. `NotFound` has none and renders as `/404`.
    pub fn path(&self) -> String {
        match self {
            Route::Login => LOGIN_PATH.to_string(),
            Route::Dashboard => HOME_PATH.to_string(),
            Route::Gists => "/gists".to_string(),
            Route::GistCreate => "/gists/create".to_string(),
            Route::GistDetail(id) => format!("/gists/{id}"),
            Route::GistEdit(id) => format!("/gists/{id}/edit"),
            Route::NotFound => "/404".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session still resolving; show a wait indicator, decide nothing.
    Wait,
    /// Send the user to `to`, remembering where they were headed.
    Redirect { to: String, from: String },
    /// Render the route.
    Render { route: Route },
}

/// Decide what happens when `requested` is opened under `session`.
pub fn guard(session: &Session, requested: &str) -> GuardDecision {
    let route = Route::parse(requested);
    if !route.is_protected() {
        return GuardDecision::Render { route };
    }

    match session {
        Session::Loading => GuardDecision::Wait,
        Session::Unauthenticated => GuardDecision::Redirect {
            to: LOGIN_PATH.to_string(),
            from: requested.to_string(),
        },
        Session::Authenticated { .. } => GuardDecision::Render { route },
    }
}

/// Where to go after a successful login.
///
/// Falls back to [`HOME_PATH`] when nothing was captured or the captured
/// location is the login page itself or not an in-app path.
pub fn after_login(from: Option<&str>) -> String {
    match from {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => {
            if Route::parse(path) == Route::Login {
                HOME_PATH.to_string()
            } else {
                path.to_string()
            }
        }
        _ => HOME_PATH.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gists::fake::FakeGitHub;

    fn authenticated() -> Session {
        let api = Arc::new(FakeGitHub::new("alice"));
        Session::Authenticated {
            user: api.user(),
            client: api,
        }
    }

    #[test]
    fn parses_route_table() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/gists"), Route::Gists);
        assert_eq!(Route::parse("/gists/"), Route::Gists);
        assert_eq!(Route::parse("/gists/create"), Route::GistCreate);
        assert_eq!(Route::parse("/gists/abc"), Route::GistDetail("abc".into()));
        assert_eq!(Route::parse("/gists/abc/edit"), Route::GistEdit("abc".into()));
        assert_eq!(Route::parse("/gists/abc?tab=raw"), Route::GistDetail("abc".into()));
        assert_eq!(Route::parse("/settings"), Route::NotFound);
        assert_eq!(Route::parse("/gists/abc/delete"), Route::NotFound);
    }

    #[test]
    fn path_roundtrips_through_parse() {
        for route in [
            Route::Login,
            Route::Dashboard,
            Route::Gists,
            Route::GistCreate,
            Route::GistDetail("abc".into()),
            Route::GistEdit("abc".into()),
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn loading_waits_on_protected_routes() {
        assert_eq!(guard(&Session::Loading, "/gists/abc"), GuardDecision::Wait);
    }

    #[test]
    fn unauthenticated_redirects_with_origin() {
        assert_eq!(
            guard(&Session::Unauthenticated, "/gists/abc/edit"),
            GuardDecision::Redirect {
                to: "/login".into(),
                from: "/gists/abc/edit".into(),
            }
        );
    }

    #[test]
    fn authenticated_renders() {
        assert_eq!(
            guard(&authenticated(), "/gists"),
            GuardDecision::Render {
                route: Route::Gists
            }
        );
    }

    #[test]
    fn public_routes_render_in_every_state() {
        for session in [Session::Loading, Session::Unauthenticated, authenticated()] {
            assert_eq!(
                guard(&session, "/login"),
                GuardDecision::Render {
                    route: Route::Login
                }
            );
            assert_eq!(
                guard(&session, "/nowhere"),
                GuardDecision::Render {
                    route: Route::NotFound
                }
            );
        }
    }

    #[test]
    fn after_login_targets() {
        assert_eq!(after_login(Some("/gists/abc")), "/gists/abc");
        assert_eq!(after_login(None), "/");
        assert_eq!(after_login(Some("/login")), "/");
        assert_eq!(after_login(Some("https://evil.example")), "/");
        assert_eq!(after_login(Some("//evil.example")), "/");
    }

    #[test]
    fn decision_serializes_with_kind_tag() {
        let json = serde_json::to_value(GuardDecision::Render {
            route: Route::GistDetail("abc".into()),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "render", "route": {"name": "gist_detail", "id": "abc"}})
        );
    }
}
