/*!
 * Admin Session Manager
 * Opaque random tokens mirrored in an HTTP-only cookie, stored server-side
 * as SHA-256 digests with an expiry.
 */
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use cookie::{time, Cookie, SameSite};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::db::{models::AdminSession, AdminStore, StoreError};

const TOKEN_LENGTH: usize = 64;

/// Outcome of a session check. A missing cookie, an unknown token and an
/// expired token all look the same to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<Uuid>,
}

impl SessionStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            admin_id: None,
        }
    }

    fn admin(admin_id: Uuid) -> Self {
        Self {
            authenticated: true,
            admin_id: Some(admin_id),
        }
    }
}

/// A freshly created session; `token` is only ever handed to the cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AdminStore>,
    settings: SessionSettings,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AdminStore>, settings: SessionSettings) -> Self {
        Self { store, settings }
    }

    pub fn cookie_name(&self) -> &str {
        &self.settings.cookie_name
    }

    pub async fn create_session(&self, admin_id: Uuid) -> Result<IssuedSession, StoreError> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + self.settings.ttl;

        self.store
            .insert_session(AdminSession {
                token_hash: hash_token(&token),
                admin_id,
                created_at: now,
                expires_at,
            })
            .await?;

        Ok(IssuedSession { token, expires_at })
    }

    pub async fn verify_session(&self, headers: &HeaderMap) -> Result<SessionStatus, StoreError> {
        let Some(token) = read_cookie(headers, self.cookie_name()) else {
            return Ok(SessionStatus::anonymous());
        };

        match self.store.find_session(&hash_token(&token)).await? {
            Some(session) if session.is_live(Utc::now()) => {
                Ok(SessionStatus::admin(session.admin_id))
            }
            _ => Ok(SessionStatus::anonymous()),
        }
    }

    /// Delete the session named by the request cookie, if there is one.
    pub async fn destroy_session(&self, headers: &HeaderMap) -> Result<(), StoreError> {
        if let Some(token) = read_cookie(headers, self.cookie_name()) {
            self.store.delete_session(&hash_token(&token)).await?;
        }
        Ok(())
    }

    pub async fn clean_expired_sessions(&self) -> Result<u64, StoreError> {
        self.store.delete_expired_sessions(Utc::now()).await
    }

    /// `Set-Cookie` value carrying the session token.
    pub fn session_cookie(&self, issued: &IssuedSession) -> String {
        self.cookie_with(issued.token.clone(), self.settings.ttl.num_seconds())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.cookie_with(String::new(), 0)
    }

    fn cookie_with(&self, value: String, max_age_secs: i64) -> String {
        Cookie::build((self.settings.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age_secs))
            .secure(self.settings.secure_cookie)
            .build()
            .to_string()
    }
}

fn generate_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LENGTH)
}

fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// First non-empty value of the named cookie across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value_trimmed().is_empty())
        .map(|c| c.value_trimmed().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory::MemoryStore, MockAdminStore};
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn settings() -> SessionSettings {
        SessionSettings {
            cookie_name: "admin_session".to_string(),
            ttl: Duration::hours(24),
            secure_cookie: false,
        }
    }

    fn manager(store: Arc<MemoryStore>) -> SessionManager {
        SessionManager::new(store, settings())
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_created_session_verifies_with_admin_id() {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(store.clone());
        let admin_id = Uuid::new_v4();

        let issued = sessions.create_session(admin_id).await.unwrap();
        assert_eq!(issued.token.len(), TOKEN_LENGTH);

        let headers = cookie_headers(&format!("theme=dark; admin_session={}", issued.token));
        let status = sessions.verify_session(&headers).await.unwrap();
        assert!(status.authenticated);
        assert_eq!(status.admin_id, Some(admin_id));
    }

    #[tokio::test]
    async fn test_raw_token_is_not_stored() {
        let store = Arc::new(MemoryStore::new());
        let issued = manager(store.clone())
            .create_session(Uuid::new_v4())
            .await
            .unwrap();
        let sessions = store.sessions.read().await;
        assert!(!sessions.contains_key(&issued.token));
        assert!(sessions.contains_key(&hash_token(&issued.token)));
    }

    #[tokio::test]
    async fn test_expired_session_is_indistinguishable_from_none() {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(store.clone());
        let now = Utc::now();
        store
            .insert_session(AdminSession {
                token_hash: hash_token("stale-token"),
                admin_id: Uuid::new_v4(),
                created_at: now - Duration::hours(48),
                expires_at: now - Duration::hours(24),
            })
            .await
            .unwrap();

        let expired = sessions
            .verify_session(&cookie_headers("admin_session=stale-token"))
            .await
            .unwrap();
        let missing = sessions.verify_session(&HeaderMap::new()).await.unwrap();
        let unknown = sessions
            .verify_session(&cookie_headers("admin_session=never-issued"))
            .await
            .unwrap();

        assert_eq!(expired, SessionStatus::anonymous());
        assert_eq!(expired, missing);
        assert_eq!(expired, unknown);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(store.clone());
        let issued = sessions.create_session(Uuid::new_v4()).await.unwrap();
        let headers = cookie_headers(&format!("admin_session={}", issued.token));

        sessions.destroy_session(&headers).await.unwrap();
        sessions.destroy_session(&headers).await.unwrap();
        sessions.destroy_session(&HeaderMap::new()).await.unwrap();

        let status = sessions.verify_session(&headers).await.unwrap();
        assert!(!status.authenticated);
    }

    #[tokio::test]
    async fn test_clean_expired_sessions_keeps_live_rows() {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(store.clone());
        let live = sessions.create_session(Uuid::new_v4()).await.unwrap();
        let now = Utc::now();
        store
            .insert_session(AdminSession {
                token_hash: hash_token("old"),
                admin_id: Uuid::new_v4(),
                created_at: now - Duration::days(3),
                expires_at: now - Duration::days(2),
            })
            .await
            .unwrap();

        assert_eq!(sessions.clean_expired_sessions().await.unwrap(), 1);
        let headers = cookie_headers(&format!("admin_session={}", live.token));
        assert!(sessions.verify_session(&headers).await.unwrap().authenticated);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockAdminStore::new();
        store
            .expect_find_session()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));
        let sessions = SessionManager::new(Arc::new(store), settings());

        let result = sessions
            .verify_session(&cookie_headers("admin_session=abc"))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_cookie_attributes() {
        let sessions = manager(Arc::new(MemoryStore::new()));
        let cookie = sessions.session_cookie(&IssuedSession {
            token: "tok".into(),
            expires_at: Utc::now(),
        });
        assert!(cookie.starts_with("admin_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        let cleared = sessions.clear_cookie();
        assert!(cleared.starts_with("admin_session=;"));
        assert!(cleared.contains("Max-Age=0"));

        let secure = SessionManager::new(
            Arc::new(MemoryStore::new()),
            SessionSettings {
                secure_cookie: true,
                ..settings()
            },
        );
        let parsed = Cookie::parse(secure.clear_cookie()).unwrap();
        assert_eq!(parsed.secure(), Some(true));
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_eq!(parsed.path(), Some("/"));
    }

    #[test]
    fn test_read_cookie_ignores_empty_and_other_names() {
        assert_eq!(read_cookie(&cookie_headers("admin_session="), "admin_session"), None);
        assert_eq!(read_cookie(&cookie_headers("other=1"), "admin_session"), None);
        assert_eq!(
            read_cookie(&cookie_headers("a=1;admin_session=xyz"), "admin_session").as_deref(),
            Some("xyz")
        );
        assert_eq!(
            read_cookie(&cookie_headers("admin_session=\"abc\""), "admin_session").as_deref(),
            Some("abc")
        );
        assert_eq!(read_cookie(&cookie_headers("admin_session=\"\""), "admin_session"), None);
    }
}
