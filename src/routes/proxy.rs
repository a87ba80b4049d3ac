/**
 * Proxy Routes
 * Admin-only pass-through to the Doubleclicker and Flash orchestrator services
 */
use axum::{
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    auth::RequireAdmin,
    error::{ApiError, ApiResult},
    proxy::UpstreamResponse,
    validation::{require, Validate, Validated},
    AppState,
};

/// `{ endpoint, ...rest }`; `rest` becomes the upstream JSON body.
#[derive(Debug, Deserialize)]
pub struct DoubleclickerRequest {
    #[serde(default)]
    pub endpoint: String,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Validate for DoubleclickerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("endpoint", &self.endpoint)
    }
}

/// Provisioning payload, forwarded untouched.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ProvisionRequest(pub Value);

impl Validate for ProvisionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.0.is_object() {
            Ok(())
        } else {
            Err(ApiError::Validation(
                "request body must be a JSON object".to_string(),
            ))
        }
    }
}

fn relay(upstream: UpstreamResponse) -> Response {
    (upstream.status, Json(upstream.body)).into_response()
}

/// POST /api/admin/dc-proxy
pub async fn doubleclicker_post(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Validated(payload): Validated<DoubleclickerRequest>,
) -> ApiResult<Response> {
    tracing::debug!(admin_id = %admin.admin_id, endpoint = %payload.endpoint, "doubleclicker proxy");
    let upstream = state
        .proxy
        .doubleclicker(
            Method::POST,
            &payload.endpoint,
            &[],
            Some(Value::Object(payload.body)),
        )
        .await?;
    Ok(relay(upstream))
}

/// GET /api/admin/dc-proxy?endpoint=/path&key=value
pub async fn doubleclicker_get(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let (endpoint, rest): (Vec<_>, Vec<_>) = params.into_iter().partition(|(k, _)| k == "endpoint");
    let endpoint = endpoint
        .into_iter()
        .next()
        .map(|(_, v)| v)
        .unwrap_or_default();
    require("endpoint", &endpoint)?;

    tracing::debug!(admin_id = %admin.admin_id, endpoint = %endpoint, "doubleclicker proxy");
    let upstream = state
        .proxy
        .doubleclicker(Method::GET, &endpoint, &rest, None)
        .await?;
    Ok(relay(upstream))
}

/// POST /api/admin/flash/provision
pub async fn flash_provision(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Validated(ProvisionRequest(body)): Validated<ProvisionRequest>,
) -> ApiResult<Response> {
    tracing::info!(admin_id = %admin.admin_id, "forwarding provisioning request");
    let upstream = state.proxy.flash_provision(body).await?;
    Ok(relay(upstream))
}
