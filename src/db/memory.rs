//! In-memory store used by the handler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    AdminSession, AdminUser, Author, BlogCategory, BlogPost, NewAuthor, NewCtaConversion,
    NewLead, SitemapEntry, SitemapPost,
};
use super::postgres::{optional_table_write, sqlstate::database_error, UNDEFINED_TABLE};
use super::store::{AdminStore, ContentStore, PostQuery, PostStatus, StoreError, WriteOutcome};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub admins: RwLock<Vec<AdminUser>>,
    pub sessions: RwLock<HashMap<String, AdminSession>>,
    pub posts: RwLock<Vec<BlogPost>>,
    pub authors: RwLock<Vec<Author>>,
    pub categories: RwLock<Vec<BlogCategory>>,
    pub sitemap_entries: RwLock<Vec<(String, SitemapEntry)>>,
    pub leads: RwLock<Vec<NewLead>>,
    pub conversions: RwLock<Vec<NewCtaConversion>>,
    /// Capture-table inserts fail with `42P01`, as on deployments without them.
    pub capture_tables_missing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_capture_tables() -> Self {
        Self {
            capture_tables_missing: true,
            ..Self::default()
        }
    }

    pub async fn add_admin(&self, username: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        let password_hash = bcrypt::hash(password, 4).unwrap();
        self.admins.write().await.push(AdminUser {
            id,
            username: username.to_string(),
            password_hash,
            last_login: None,
        });
        id
    }

    pub async fn add_post(&self, post: BlogPost) {
        self.posts.write().await.push(post);
    }
}

fn newest_first(mut posts: Vec<BlogPost>) -> Vec<BlogPost> {
    posts.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    posts
}

fn is_public(post: &BlogPost, tenant: &str) -> bool {
    post.user_name == tenant && post.status == PostStatus::Published.as_str()
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, StoreError> {
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn record_login(&self, admin_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(admin) = self.admins.write().await.iter_mut().find(|a| a.id == admin_id) {
            admin.last_login = Some(at);
        }
        Ok(())
    }

    async fn insert_session(&self, session: AdminSession) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<AdminSession>, StoreError> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token_hash);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_published_posts(
        &self,
        tenant: &str,
        query: &PostQuery,
    ) -> Result<(Vec<BlogPost>, i64), StoreError> {
        let matching: Vec<BlogPost> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| is_public(p, tenant))
            .filter(|p| match &query.category {
                Some(c) => p.category.as_deref() == Some(c.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = newest_first(matching)
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_published_post(
        &self,
        tenant: &str,
        slug: &str,
    ) -> Result<Option<BlogPost>, StoreError> {
        Ok(self
            .posts
            .read()
            .await
            .iter()
            .find(|p| is_public(p, tenant) && p.slug == slug)
            .cloned())
    }

    async fn list_posts_by_tag(
        &self,
        tenant: &str,
        tag: &str,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let matching = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| is_public(p, tenant) && p.tags.iter().any(|t| t == tag))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_all_posts(
        &self,
        tenant: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<BlogPost>, StoreError> {
        let matching = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.user_name == tenant)
            .filter(|p| status.is_none_or(|s| p.status == s.as_str()))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_sitemap_posts(&self, tenant: &str) -> Result<Vec<SitemapPost>, StoreError> {
        let matching = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| is_public(p, tenant))
            .cloned()
            .collect();
        Ok(newest_first(matching).iter().map(SitemapPost::from).collect())
    }

    async fn list_sitemap_entries(&self, tenant: &str) -> Result<Vec<SitemapEntry>, StoreError> {
        Ok(self
            .sitemap_entries
            .read()
            .await
            .iter()
            .filter(|(owner, _)| owner == tenant)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        let mut authors = self.authors.read().await.clone();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn find_author(&self, slug: &str) -> Result<Option<Author>, StoreError> {
        Ok(self
            .authors
            .read()
            .await
            .iter()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn create_author(&self, author: &NewAuthor) -> Result<Author, StoreError> {
        let mut authors = self.authors.write().await;
        if authors.iter().any(|a| a.slug == author.slug) {
            return Err(StoreError::Conflict("Author slug already exists".to_string()));
        }
        let created = Author {
            id: Uuid::new_v4(),
            slug: author.slug.clone(),
            name: author.name.clone(),
            bio: author.bio.clone(),
            linkedin_url: author.linkedin_url.clone(),
            avatar_url: author.avatar_url.clone(),
        };
        authors.push(created.clone());
        Ok(created)
    }

    async fn list_categories(&self) -> Result<Vec<BlogCategory>, StoreError> {
        let mut categories = self.categories.read().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_lead(&self, lead: &NewLead) -> Result<WriteOutcome, StoreError> {
        if self.capture_tables_missing {
            return optional_table_write::<()>(Err(database_error(UNDEFINED_TABLE)), "leads");
        }
        self.leads.write().await.push(lead.clone());
        Ok(WriteOutcome::Stored)
    }

    async fn insert_cta_conversion(
        &self,
        conversion: &NewCtaConversion,
    ) -> Result<WriteOutcome, StoreError> {
        if self.capture_tables_missing {
            return optional_table_write::<()>(
                Err(database_error(UNDEFINED_TABLE)),
                "cta_conversions",
            );
        }
        self.conversions.write().await.push(conversion.clone());
        Ok(WriteOutcome::Stored)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        Ok(Duration::from_millis(1))
    }
}
