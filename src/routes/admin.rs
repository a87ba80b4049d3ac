/**
 * Admin Routes
 * Cookie session login, logout and verification, plus the admin post listing
 */
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{password::verify_admin_password, RequireAdmin, SessionStatus},
    db::{models::BlogPost, PostStatus},
    error::{ApiError, ApiResult},
    tenant::Tenant,
    validation::{require, Validate, Validated},
    AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminPostsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminPostsResponse {
    pub success: bool,
    pub items: Vec<BlogPost>,
    pub total: usize,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Validated(payload): Validated<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    match state.sessions.clean_expired_sessions().await {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "expired admin sessions removed"),
        Err(e) => tracing::warn!(error = %e, "failed to clean expired sessions"),
    }

    let username = payload.username.trim();
    let admin = state.admins.find_admin_by_username(username).await?;
    let stored_hash = admin.as_ref().map(|a| a.password_hash.as_str());
    let verified = verify_admin_password(&payload.password, stored_hash).await;

    let admin = match admin {
        Some(admin) if verified => admin,
        Some(_) => {
            tracing::warn!(username = %username, "login attempt with wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        None => {
            tracing::warn!(username = %username, "login attempt for unknown admin");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    state.admins.record_login(admin.id, Utc::now()).await?;
    let issued = state.sessions.create_session(admin.id).await?;
    tracing::info!(admin_id = %admin.id, "admin logged in");

    Ok((
        [(header::SET_COOKIE, state.sessions.session_cookie(&issued))],
        Json(SuccessResponse { success: true }),
    ))
}

/// POST /api/admin/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    state.sessions.destroy_session(&headers).await?;

    Ok((
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(SuccessResponse { success: true }),
    ))
}

/// GET /api/admin/verify
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionStatus>> {
    Ok(Json(state.sessions.verify_session(&headers).await?))
}

/// GET /api/admin/posts - every tenant post, optionally filtered by status
pub async fn list_posts(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Query(query): Query<AdminPostsQuery>,
) -> ApiResult<Json<AdminPostsResponse>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(value) => Some(PostStatus::parse(value).ok_or_else(|| {
            ApiError::Validation("status must be draft or published".to_string())
        })?),
    };

    let items = state.content.list_all_posts(&tenant.username, status).await?;
    Ok(Json(AdminPostsResponse {
        success: true,
        total: items.len(),
        items,
    }))
}
