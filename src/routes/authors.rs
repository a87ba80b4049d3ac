/**
 * Author Routes
 * Public author profiles; creation is admin-only
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    auth::RequireAdmin,
    db::models::{Author, NewAuthor},
    error::{ApiError, ApiResult},
    seo,
    tenant::Tenant,
    validation::{is_valid_slug, optional_http_url, require, slugify, Validate, Validated},
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorRequest {
    #[serde(default)]
    pub name: String,
    /// Derived from `name` when omitted.
    pub slug: Option<String>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for CreateAuthorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        if let Some(slug) = self.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            if !is_valid_slug(slug.trim()) {
                return Err(ApiError::Validation(
                    "slug must contain only lowercase letters, numbers, and hyphens".to_string(),
                ));
            }
        }
        optional_http_url("linkedinUrl", self.linkedin_url.as_deref())?;
        optional_http_url("avatarUrl", self.avatar_url.as_deref())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateAuthorRequest {
    fn into_new_author(self) -> Result<NewAuthor, ApiError> {
        let slug = match non_blank(self.slug) {
            Some(slug) => slug,
            None => slugify(&self.name),
        };
        if slug.is_empty() {
            return Err(ApiError::Validation(
                "name must contain letters or numbers".to_string(),
            ));
        }

        Ok(NewAuthor {
            slug,
            name: self.name.trim().to_string(),
            bio: non_blank(self.bio).map(|bio| ammonia::clean(&bio)),
            linkedin_url: non_blank(self.linkedin_url),
            avatar_url: non_blank(self.avatar_url),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorListResponse {
    pub items: Vec<Author>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    #[serde(flatten)]
    pub author: Author,
    pub json_ld: Value,
}

#[derive(Debug, Serialize)]
pub struct CreatedAuthorResponse {
    pub success: bool,
    pub author: Author,
}

/// GET /api/authors
pub async fn list_authors(State(state): State<AppState>) -> ApiResult<Json<AuthorListResponse>> {
    let items = state.content.list_authors().await?;
    Ok(Json(AuthorListResponse { items }))
}

/// GET /api/authors/{slug}
pub async fn get_author(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(slug): Path<String>,
) -> ApiResult<Json<AuthorResponse>> {
    let not_found = || ApiError::NotFound("Author not found".to_string());
    if !is_valid_slug(&slug) {
        return Err(not_found());
    }

    let author = state
        .content
        .find_author(&slug)
        .await?
        .ok_or_else(not_found)?;
    let json_ld = seo::person(&tenant, &author);

    Ok(Json(AuthorResponse { author, json_ld }))
}

/// POST /api/authors
pub async fn create_author(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Validated(payload): Validated<CreateAuthorRequest>,
) -> ApiResult<(StatusCode, Json<CreatedAuthorResponse>)> {
    let new_author = payload.into_new_author()?;
    let author = state.content.create_author(&new_author).await?;
    tracing::info!(admin_id = %admin.admin_id, slug = %author.slug, "author created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedAuthorResponse {
            success: true,
            author,
        }),
    ))
}
