//! Tenant configuration.
//!
//! Each deployment serves one tenant, identified by a `username` that scopes
//! every tenant-filtered query. The values come from the environment and are
//! resolved again on each request.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use std::convert::Infallible;

use crate::{config::EnvSource, AppState};

const FALLBACK_SITE_NAME: &str = "My Site";
const FALLBACK_SITE_URL: &str = "http://localhost:3000";
const FALLBACK_USERNAME: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub site_name: String,
    pub site_url: String,
    pub username: String,
}

impl TenantConfig {
    /// Missing variables fall back to defaults instead of failing.
    pub fn resolve(env: &dyn EnvSource) -> Self {
        let site_url = env
            .var("SITE_URL")
            .unwrap_or_else(|| FALLBACK_SITE_URL.to_string());

        Self {
            site_name: env
                .var("SITE_NAME")
                .unwrap_or_else(|| FALLBACK_SITE_NAME.to_string()),
            site_url: site_url.trim_end_matches('/').to_string(),
            username: env
                .var("TENANT_USERNAME")
                .unwrap_or_else(|| FALLBACK_USERNAME.to_string()),
        }
    }

    /// Absolute URL for a site-relative path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.site_url, path)
        } else {
            format!("{}/{}", self.site_url, path)
        }
    }
}

/// Extractor yielding the tenant for the current request.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantConfig);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Tenant(TenantConfig::resolve(state.env.as_ref())))
    }
}
