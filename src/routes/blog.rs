/**
 * Blog Routes
 * Public, tenant-scoped reads of published posts and categories
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::{
        models::{BlogCategory, BlogPost},
        PostQuery,
    },
    error::{ApiError, ApiResult},
    seo,
    tenant::Tenant,
    validation::is_valid_slug,
    AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog/posts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub category: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogPostSummary>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Blog post summary (for list views)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_description: Option<String>,
    pub featured_image: Option<String>,
    pub created_date: DateTime<Utc>,
    pub published_date: Option<DateTime<Utc>>,
}

impl From<BlogPost> for BlogPostSummary {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            category: post.category,
            tags: post.tags,
            meta_description: post.meta_description,
            featured_image: post.featured_image,
            created_date: post.created_date,
            published_date: post.published_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    #[serde(flatten)]
    pub post: BlogPost,
    pub json_ld: Value,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tag: String,
    pub items: Vec<BlogPostSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub items: Vec<BlogCategory>,
}

/// Sanitize stored HTML before it leaves the API
fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

fn post_not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog/posts - published posts for the tenant, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Query(query): Query<BlogListQuery>,
) -> ApiResult<Json<BlogListResponse>> {
    let category = query
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let query = PostQuery::new(query.page, query.page_size, category);

    let (posts, total) = state
        .content
        .list_published_posts(&tenant.username, &query)
        .await?;

    Ok(Json(BlogListResponse {
        items: posts.into_iter().map(BlogPostSummary::from).collect(),
        page: query.page,
        page_size: query.page_size,
        total,
        total_pages: (total + query.page_size - 1) / query.page_size,
    }))
}

/// GET /api/blog/posts/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(slug): Path<String>,
) -> ApiResult<Json<BlogPostResponse>> {
    if !is_valid_slug(&slug) {
        return Err(post_not_found());
    }

    let mut post = state
        .content
        .find_published_post(&tenant.username, &slug)
        .await?
        .ok_or_else(post_not_found)?;

    post.content = post.content.as_deref().map(sanitize_html);
    let json_ld = seo::blog_posting(&tenant, &post);

    Ok(Json(BlogPostResponse { post, json_ld }))
}

/// GET /api/blog/tags/{tag} - 404 rather than an empty page for unknown tags
pub async fn list_posts_by_tag(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(tag): Path<String>,
) -> ApiResult<Json<TagListResponse>> {
    let tag = tag.trim().to_string();
    let posts = if tag.is_empty() {
        Vec::new()
    } else {
        state
            .content
            .list_posts_by_tag(&tenant.username, &tag)
            .await?
    };

    if posts.is_empty() {
        return Err(ApiError::NotFound(format!("No posts tagged '{tag}'")));
    }

    Ok(Json(TagListResponse {
        total: posts.len(),
        items: posts.into_iter().map(BlogPostSummary::from).collect(),
        tag,
    }))
}

/// GET /api/blog/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<CategoryListResponse>> {
    let items = state.content.list_categories().await?;
    Ok(Json(CategoryListResponse { items }))
}
