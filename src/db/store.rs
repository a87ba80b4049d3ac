//! Store traits for the credential tables and the content tables.
//!
//! Handlers only see these traits; `PgStore` is the production
//! implementation. Every read goes back to the database, nothing is cached.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    AdminSession, AdminUser, Author, BlogCategory, BlogPost, NewAuthor, NewCtaConversion,
    NewLead, SitemapEntry, SitemapPost,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Conflict(String),
}

/// Result of a best-effort write into an optional table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    /// The backing table does not exist in this deployment.
    TableMissing,
}

impl WriteOutcome {
    pub fn stored(self) -> bool {
        self == WriteOutcome::Stored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Paging and filtering for public post listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub page: i64,
    pub page_size: i64,
    pub category: Option<String>,
}

impl PostQuery {
    pub const MAX_PAGE_SIZE: i64 = 100;
    /// Highest page whose offset still fits in an `i64` at any page size.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_PAGE_SIZE;

    pub fn new(page: i64, page_size: i64, category: Option<String>) -> Self {
        Self {
            page: page.clamp(1, Self::MAX_PAGE),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
            category,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Admin accounts and their sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_admin_by_username(&self, username: &str)
        -> Result<Option<AdminUser>, StoreError>;

    async fn record_login(&self, admin_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn insert_session(&self, session: AdminSession) -> Result<(), StoreError>;

    async fn find_session(&self, token_hash: &str) -> Result<Option<AdminSession>, StoreError>;

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError>;

    /// Remove every session with `expires_at < now`, returning how many went.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Blog, author, sitemap and capture tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Published posts for the tenant, newest first, plus the total count.
    async fn list_published_posts(
        &self,
        tenant: &str,
        query: &PostQuery,
    ) -> Result<(Vec<BlogPost>, i64), StoreError>;

    async fn find_published_post(
        &self,
        tenant: &str,
        slug: &str,
    ) -> Result<Option<BlogPost>, StoreError>;

    async fn list_posts_by_tag(&self, tenant: &str, tag: &str)
        -> Result<Vec<BlogPost>, StoreError>;

    /// Admin listing: no status filter unless one is given.
    async fn list_all_posts(
        &self,
        tenant: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<BlogPost>, StoreError>;

    async fn list_sitemap_posts(&self, tenant: &str) -> Result<Vec<SitemapPost>, StoreError>;

    async fn list_sitemap_entries(&self, tenant: &str) -> Result<Vec<SitemapEntry>, StoreError>;

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError>;

    async fn find_author(&self, slug: &str) -> Result<Option<Author>, StoreError>;

    async fn create_author(&self, author: &NewAuthor) -> Result<Author, StoreError>;

    async fn list_categories(&self) -> Result<Vec<BlogCategory>, StoreError>;

    async fn insert_lead(&self, lead: &NewLead) -> Result<WriteOutcome, StoreError>;

    async fn insert_cta_conversion(
        &self,
        conversion: &NewCtaConversion,
    ) -> Result<WriteOutcome, StoreError>;

    async fn ping(&self) -> Result<Duration, StoreError>;
}
