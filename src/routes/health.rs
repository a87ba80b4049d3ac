/**
 * Health Routes
 * Liveness ping and database probe
 */
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Healthy,
    Unhealthy,
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
}

/// GET /health
pub async fn health_ping(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Ok,
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}

/// GET /health/database - 503 when the database does not answer
pub async fn health_database(State(state): State<AppState>) -> (StatusCode, Json<ServiceCheck>) {
    match state.content.ping().await {
        Ok(duration) => (
            StatusCode::OK,
            Json(ServiceCheck {
                status: HealthStatus::Healthy,
                response_time: Some(duration.as_millis() as u64),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ServiceCheck {
                    status: HealthStatus::Unhealthy,
                    response_time: None,
                    error: Some("Database unavailable".to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        create_app,
        db::{MockContentStore, StoreError},
        test_support::{body_json, get, send, test_state},
    };
    use std::sync::Arc;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        let res = send(create_app(test_state().state), get("/health")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: HealthResponse = body_json(res).await;
        assert_eq!(body.status, HealthStatus::Ok);
    }

    #[tokio::test]
    async fn test_health_database_healthy() {
        let res = send(create_app(test_state().state), get("/health/database")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: ServiceCheck = body_json(res).await;
        assert_eq!(body.status, HealthStatus::Healthy);
        assert!(body.response_time.is_some());
    }

    #[tokio::test]
    async fn test_health_database_unhealthy() {
        let mut content = MockContentStore::new();
        content
            .expect_ping()
            .returning(|| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));
        let mut state = test_state().state;
        state.content = Arc::new(content);

        let res = send(create_app(state), get("/health/database")).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ServiceCheck = body_json(res).await;
        assert_eq!(body.status, HealthStatus::Unhealthy);
    }
}
