/*!
 * External Service Proxy
 * Forwards admin requests to the Doubleclicker and Flash orchestrator
 * services with the shared secret attached, relaying status and JSON body.
 */
use axum::http::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::ProxySettings;
use crate::error::ApiError;

pub const SECRET_HEADER: &str = "x-provision-secret";

/// Fixed path on the Flash orchestrator used for site provisioning.
pub const FLASH_PROVISION_PATH: &str = "/api/provision";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream returned a non-JSON body")]
    InvalidResponse,
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::NotConfigured(_) => ApiError::Unavailable(err.to_string()),
            ProxyError::InvalidEndpoint(_) => ApiError::Validation(err.to_string()),
            ProxyError::Network(_) | ProxyError::InvalidResponse => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Only same-host paths may be forwarded.
pub fn validate_endpoint(endpoint: &str) -> Result<&str, ProxyError> {
    let endpoint = endpoint.trim();
    let ok = endpoint.starts_with('/')
        && !endpoint.starts_with("//")
        && !endpoint.contains("://")
        && !endpoint.split('/').any(|segment| segment == "..")
        && !endpoint.contains(['?', '#', '\\']);
    if ok {
        Ok(endpoint)
    } else {
        Err(ProxyError::InvalidEndpoint(endpoint.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    settings: ProxySettings,
}

impl ProxyClient {
    pub fn new(http: reqwest::Client, settings: ProxySettings) -> Self {
        Self { http, settings }
    }

    pub async fn doubleclicker(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let base = self
            .settings
            .doubleclicker_url
            .as_deref()
            .ok_or(ProxyError::NotConfigured("Doubleclicker"))?;
        let endpoint = validate_endpoint(endpoint)?;
        self.forward(method, &format!("{base}{endpoint}"), query, body)
            .await
    }

    pub async fn flash_provision(&self, body: Value) -> Result<UpstreamResponse, ProxyError> {
        let base = self
            .settings
            .flash_url
            .as_deref()
            .ok_or(ProxyError::NotConfigured("Flash orchestrator"))?;
        self.forward(
            Method::POST,
            &format!("{base}{FLASH_PROVISION_PATH}"),
            &[],
            Some(body),
        )
        .await
    }

    async fn forward(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(secret) = &self.settings.shared_secret {
            request = request.header(SECRET_HEADER, secret);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, method = %method, error = %e, "upstream request failed");
            ProxyError::Network(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(url = %url, status = %status, error = %e, "upstream returned non-JSON body");
                ProxyError::InvalidResponse
            })?
        };

        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "upstream returned error status");
        }

        Ok(UpstreamResponse { status, body })
    }
}
