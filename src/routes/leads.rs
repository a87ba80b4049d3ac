/**
 * Capture Routes
 * Lead form submissions and CTA conversion logging. A deployment without
 * the capture tables still answers `success: true`, with `stored: false`.
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{NewCtaConversion, NewLead},
    error::{ApiError, ApiResult},
    tenant::Tenant,
    validation::{require, Validate, Validated},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub username: String,
    pub source: Option<String>,
}

impl Validate for LeadRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("topic", &self.topic)?;
        require("username", &self.username)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaConversionRequest {
    #[serde(default)]
    pub cta_id: String,
    #[serde(default)]
    pub page_path: String,
    /// Defaults to the tenant serving the request.
    pub username: Option<String>,
    pub variant: Option<String>,
}

impl Validate for CtaConversionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        require("ctaId", &self.cta_id)?;
        require("pagePath", &self.page_path)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub stored: bool,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /api/leads
pub async fn capture_lead(
    State(state): State<AppState>,
    Validated(payload): Validated<LeadRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    let lead = NewLead {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        topic: payload.topic.trim().to_string(),
        username: payload.username.trim().to_string(),
        source: trimmed(payload.source),
    };

    let stored = state.content.insert_lead(&lead).await?.stored();
    if stored {
        tracing::info!(username = %lead.username, topic = %lead.topic, "lead captured");
    } else {
        tracing::warn!(username = %lead.username, "leads table missing, lead not stored");
    }

    Ok(Json(CaptureResponse {
        success: true,
        stored,
    }))
}

/// POST /api/cta-conversions
pub async fn record_conversion(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Validated(payload): Validated<CtaConversionRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    let conversion = NewCtaConversion {
        cta_id: payload.cta_id.trim().to_string(),
        page_path: payload.page_path.trim().to_string(),
        username: trimmed(payload.username).unwrap_or(tenant.username),
        variant: trimmed(payload.variant),
    };

    let stored = state
        .content
        .insert_cta_conversion(&conversion)
        .await?
        .stored();
    if !stored {
        tracing::warn!(cta_id = %conversion.cta_id, "cta_conversions table missing, conversion not stored");
    }

    Ok(Json(CaptureResponse {
        success: true,
        stored,
    }))
}
