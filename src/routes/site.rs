use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::{
    seo,
    tenant::{Tenant, TenantConfig},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    #[serde(flatten)]
    pub tenant: TenantConfig,
    pub json_ld: Value,
}

/// GET /api/site - tenant metadata for the frontend's page heads
pub async fn site_metadata(Tenant(tenant): Tenant) -> Json<SiteResponse> {
    Json(SiteResponse {
        json_ld: seo::website(&tenant),
        tenant,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        create_app,
        db::memory::MemoryStore,
        test_support::{body_json, get, send, test_state, test_state_with},
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_site_metadata_from_env() {
        let res = send(create_app(test_state().state), get("/api/site")).await;
        let body: Value = body_json(res).await;
        assert_eq!(body["siteName"], "Acme Studio");
        assert_eq!(body["siteUrl"], "https://acme.io");
        assert_eq!(body["username"], "acme");
        assert_eq!(body["jsonLd"]["@type"], "WebSite");
    }

    #[tokio::test]
    async fn test_site_metadata_tracks_env_per_request() {
        let app = test_state_with(MemoryStore::new(), [("SITE_NAME", "Renamed".to_string())]);
        let res = send(create_app(app.state), get("/api/site")).await;
        let body: Value = body_json(res).await;
        assert_eq!(body["siteName"], "Renamed");
        assert_eq!(body["jsonLd"]["name"], json!("Renamed"));
    }
}
