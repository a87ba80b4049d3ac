//! Database Models - rows read from and written to the content tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Admin account, created out of band by `seed-admin`.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
}

/// Server-side session row. Only the token digest is stored.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSession {
    pub token_hash: String,
    pub admin_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at >= now
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub user_name: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_description: Option<String>,
    pub featured_image: Option<String>,
    pub content: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub published_date: Option<DateTime<Utc>>,
}

/// Slug and dates of a published post, for the blog sitemap.
#[derive(Debug, Clone, FromRow)]
pub struct SitemapPost {
    pub slug: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub published_date: Option<DateTime<Utc>>,
}

impl SitemapPost {
    /// Most specific known modification time.
    pub fn lastmod(&self) -> DateTime<Utc> {
        self.updated_date
            .or(self.published_date)
            .unwrap_or(self.created_date)
    }
}

impl From<&BlogPost> for SitemapPost {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            created_date: post.created_date,
            updated_date: post.updated_date,
            published_date: post.published_date,
        }
    }
}

/// Extra tenant page listed in the services sitemap.
#[derive(Debug, Clone, FromRow)]
pub struct SitemapEntry {
    pub path: String,
    pub changefreq: Option<String>,
    pub priority: Option<f32>,
    pub lastmod: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub slug: String,
    pub name: String,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCategory {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub topic: String,
    pub username: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCtaConversion {
    pub cta_id: String,
    pub page_path: String,
    pub username: String,
    pub variant: Option<String>,
}
