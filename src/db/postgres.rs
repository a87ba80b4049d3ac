//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::models::{
    AdminSession, AdminUser, Author, BlogCategory, BlogPost, NewAuthor, NewCtaConversion,
    NewLead, SitemapEntry, SitemapPost,
};
use super::store::{AdminStore, ContentStore, PostQuery, PostStatus, StoreError, WriteOutcome};
use super::{init_pool, DbConfig};

/// `relation does not exist`
pub(crate) const UNDEFINED_TABLE: &str = "42P01";
const UNIQUE_VIOLATION: &str = "23505";

const POST_COLUMNS: &str = "id, slug, title, status, user_name, category, tags, \
     meta_description, featured_image, content, created_date, updated_date, published_date";

/// Reads go through `public`; writes that must bypass row-level security go
/// through `service`.
#[derive(Debug, Clone)]
pub struct PgStore {
    public: PgPool,
    service: PgPool,
}

impl PgStore {
    pub fn new(public: PgPool, service: PgPool) -> Self {
        Self { public, service }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self, sqlx::Error> {
        let public = init_pool(config, &config.url).await?;
        let service = match &config.service_url {
            Some(url) => init_pool(config, url).await?,
            None => public.clone(),
        };
        Ok(Self::new(public, service))
    }

    pub fn service_pool(&self) -> &PgPool {
        &self.service
    }

    /// Create the admin account, or reset its password if it exists.
    pub async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO admin_users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.service)
        .await?;
        Ok(id)
    }
}

fn error_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

pub(crate) fn is_missing_relation(code: Option<&str>) -> bool {
    code == Some(UNDEFINED_TABLE)
}

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

/// Map a failed insert into an optional table onto a degraded outcome.
pub(crate) fn optional_table_write<T>(
    result: Result<T, sqlx::Error>,
    table: &str,
) -> Result<WriteOutcome, StoreError> {
    match result {
        Ok(_) => Ok(WriteOutcome::Stored),
        Err(e) if is_missing_relation(error_code(&e).as_deref()) => {
            tracing::warn!(table = %table, "table missing, write accepted but not persisted");
            Ok(WriteOutcome::TableMissing)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, StoreError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            "SELECT id, username, password_hash, last_login FROM admin_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.service)
        .await?;
        Ok(admin)
    }

    async fn record_login(&self, admin_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(admin_id)
            .execute(&self.service)
            .await?;
        Ok(())
    }

    async fn insert_session(&self, session: AdminSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO admin_sessions (token_hash, admin_id, created_at, expires_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&session.token_hash)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.service)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<AdminSession>, StoreError> {
        let session = sqlx::query_as::<_, AdminSession>(
            r#"SELECT token_hash, admin_id, created_at, expires_at
               FROM admin_sessions
               WHERE token_hash = $1"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.service)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.service)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.service)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_published_posts(
        &self,
        tenant: &str,
        query: &PostQuery,
    ) -> Result<(Vec<BlogPost>, i64), StoreError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r#"SELECT {POST_COLUMNS}
               FROM blog_posts
               WHERE user_name = $1
                 AND status = 'published'
                 AND ($2::TEXT IS NULL OR category = $2)
               ORDER BY created_date DESC
               LIMIT $3 OFFSET $4"#
        ))
        .bind(tenant)
        .bind(&query.category)
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(&self.public)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*)
               FROM blog_posts
               WHERE user_name = $1
                 AND status = 'published'
                 AND ($2::TEXT IS NULL OR category = $2)"#,
        )
        .bind(tenant)
        .bind(&query.category)
        .fetch_one(&self.public)
        .await?;

        Ok((posts, total.0))
    }

    async fn find_published_post(
        &self,
        tenant: &str,
        slug: &str,
    ) -> Result<Option<BlogPost>, StoreError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            r#"SELECT {POST_COLUMNS}
               FROM blog_posts
               WHERE user_name = $1 AND status = 'published' AND slug = $2"#
        ))
        .bind(tenant)
        .bind(slug)
        .fetch_optional(&self.public)
        .await?;
        Ok(post)
    }

    async fn list_posts_by_tag(
        &self,
        tenant: &str,
        tag: &str,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r#"SELECT {POST_COLUMNS}
               FROM blog_posts
               WHERE user_name = $1 AND status = 'published' AND $2 = ANY(tags)
               ORDER BY created_date DESC"#
        ))
        .bind(tenant)
        .bind(tag)
        .fetch_all(&self.public)
        .await?;
        Ok(posts)
    }

    async fn list_all_posts(
        &self,
        tenant: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r#"SELECT {POST_COLUMNS}
               FROM blog_posts
               WHERE user_name = $1 AND ($2::TEXT IS NULL OR status = $2)
               ORDER BY created_date DESC"#
        ))
        .bind(tenant)
        .bind(status.map(PostStatus::as_str))
        .fetch_all(&self.service)
        .await?;
        Ok(posts)
    }

    async fn list_sitemap_posts(&self, tenant: &str) -> Result<Vec<SitemapPost>, StoreError> {
        let posts = sqlx::query_as::<_, SitemapPost>(
            r#"SELECT slug, created_date, updated_date, published_date
               FROM blog_posts
               WHERE user_name = $1 AND status = 'published'
               ORDER BY created_date DESC"#,
        )
        .bind(tenant)
        .fetch_all(&self.public)
        .await?;
        Ok(posts)
    }

    async fn list_sitemap_entries(&self, tenant: &str) -> Result<Vec<SitemapEntry>, StoreError> {
        let entries = sqlx::query_as::<_, SitemapEntry>(
            r#"SELECT path, changefreq, priority, lastmod
               FROM sitemaps
               WHERE user_name = $1
               ORDER BY path"#,
        )
        .bind(tenant)
        .fetch_all(&self.public)
        .await?;
        Ok(entries)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, slug, name, bio, linkedin_url, avatar_url FROM authors ORDER BY name",
        )
        .fetch_all(&self.public)
        .await?;
        Ok(authors)
    }

    async fn find_author(&self, slug: &str) -> Result<Option<Author>, StoreError> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, slug, name, bio, linkedin_url, avatar_url FROM authors WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.public)
        .await?;
        Ok(author)
    }

    async fn create_author(&self, author: &NewAuthor) -> Result<Author, StoreError> {
        sqlx::query_as::<_, Author>(
            r#"INSERT INTO authors (slug, name, bio, linkedin_url, avatar_url)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, slug, name, bio, linkedin_url, avatar_url"#,
        )
        .bind(&author.slug)
        .bind(&author.name)
        .bind(&author.bio)
        .bind(&author.linkedin_url)
        .bind(&author.avatar_url)
        .fetch_one(&self.service)
        .await
        .map_err(|e| {
            if is_unique_violation(error_code(&e).as_deref()) {
                StoreError::Conflict("Author slug already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    async fn list_categories(&self) -> Result<Vec<BlogCategory>, StoreError> {
        let categories = sqlx::query_as::<_, BlogCategory>(
            "SELECT id, slug, name, description FROM blog_categories ORDER BY name",
        )
        .fetch_all(&self.public)
        .await?;
        Ok(categories)
    }

    async fn insert_lead(&self, lead: &NewLead) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO leads (name, email, topic, username, source, created_at)
               VALUES ($1, $2, $3, $4, $5, now())"#,
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.topic)
        .bind(&lead.username)
        .bind(&lead.source)
        .execute(&self.service)
        .await;
        optional_table_write(result, "leads")
    }

    async fn insert_cta_conversion(
        &self,
        conversion: &NewCtaConversion,
    ) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO cta_conversions (cta_id, page_path, username, variant, created_at)
               VALUES ($1, $2, $3, $4, now())"#,
        )
        .bind(&conversion.cta_id)
        .bind(&conversion.page_path)
        .bind(&conversion.username)
        .bind(&conversion.variant)
        .execute(&self.service)
        .await;
        optional_table_write(result, "cta_conversions")
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.public).await?;
        Ok(start.elapsed())
    }
}
