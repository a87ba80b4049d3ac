//! Cookie-presence gate for admin UI navigations.
//!
//! Only checks that a session cookie is present. It does not look the token
//! up; the admin APIs do that through `RequireAdmin`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::session::read_cookie;
use crate::AppState;

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    RedirectToLogin(String),
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_gated(path: &str) -> bool {
    is_under(path, ADMIN_PREFIX) && !is_under(path, LOGIN_PATH)
}

/// Login URL carrying the original path and query in `next`.
pub fn login_redirect(path: &str, query: Option<&str>) -> String {
    let target = match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(&target))
}

pub fn evaluate(path: &str, query: Option<&str>, cookie_present: bool) -> GateDecision {
    if !is_gated(path) || cookie_present {
        return GateDecision::PassThrough;
    }
    GateDecision::RedirectToLogin(login_redirect(path, query))
}

pub async fn session_cookie_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let uri = request.uri();
    let cookie_present = read_cookie(request.headers(), state.sessions.cookie_name()).is_some();

    match evaluate(uri.path(), uri.query(), cookie_present) {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::RedirectToLogin(location) => {
            tracing::debug!(path = %uri.path(), "no session cookie, redirecting to login");
            Redirect::temporary(&location).into_response()
        }
    }
}
