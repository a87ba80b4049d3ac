//! Router fixtures shared by the handler tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceExt;

use crate::{
    config::{AppConfig, EnvSource, MapEnv},
    db::memory::MemoryStore,
    AppState,
};

pub const TENANT: &str = "acme";
pub const ADMIN_USER: &str = "editor";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

fn base_env() -> Vec<(&'static str, String)> {
    vec![
        ("DATABASE_URL", "postgres://localhost/cms_test".to_string()),
        ("TENANT_USERNAME", TENANT.to_string()),
        ("SITE_NAME", "Acme Studio".to_string()),
        ("SITE_URL", "https://acme.io/".to_string()),
    ]
}

pub fn test_state() -> TestApp {
    test_state_with(MemoryStore::new(), [])
}

/// State over `store`, with `extra` layered on top of the base environment.
pub fn test_state_with<const N: usize>(
    store: MemoryStore,
    extra: [(&'static str, String); N],
) -> TestApp {
    let mut vars = base_env();
    vars.extend(extra);
    let env = MapEnv::new(vars);
    let config = AppConfig::from_env(&env).expect("test config");
    let env: Arc<dyn EnvSource> = Arc::new(env);
    let store = Arc::new(store);

    let state = AppState::new(
        config,
        env,
        store.clone(),
        store.clone(),
        reqwest::Client::new(),
    );
    TestApp { state, store }
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn body_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

/// Seeds the admin account, logs in and returns the `name=value` cookie pair.
pub async fn login_cookie(app: &TestApp) -> String {
    app.store.add_admin(ADMIN_USER, ADMIN_PASSWORD).await;
    let res = send(
        crate::create_app(app.state.clone()),
        json_request(
            "POST",
            "/api/admin/login",
            &serde_json::json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim()
        .to_string()
}

/// Post fixture; `age_days` counts back from a fixed date so ordering is stable.
pub fn post(slug: &str, tenant: &str, status: &str, age_days: i64) -> crate::db::models::BlogPost {
    use chrono::{Duration, TimeZone, Utc};

    let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::days(age_days);
    crate::db::models::BlogPost {
        id: uuid::Uuid::new_v4(),
        slug: slug.to_string(),
        title: slug.replace('-', " "),
        status: status.to_string(),
        user_name: tenant.to_string(),
        category: None,
        tags: Vec::new(),
        meta_description: None,
        featured_image: None,
        content: Some(format!("<p>{slug}</p>")),
        created_date: created,
        updated_date: None,
        published_date: (status == "published").then_some(created),
    }
}
