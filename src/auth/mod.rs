/*!
 * Admin Authentication
 * Two checks: a cheap cookie-presence gate in front of the admin UI, and the
 * authoritative session lookup every admin API performs via `RequireAdmin`.
 */
pub mod gate;
pub mod password;
pub mod session;

pub use session::{IssuedSession, SessionManager, SessionStatus};

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// Extractor for admin-only handlers. Rejects with 401 unless the request
/// carries a live session cookie.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin {
    pub admin_id: Uuid,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let status = state.sessions.verify_session(&parts.headers).await?;
        match status.admin_id {
            Some(admin_id) if status.authenticated => Ok(RequireAdmin { admin_id }),
            _ => Err(ApiError::Unauthorized("Unauthorized".to_string())),
        }
    }
}
