use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use garden_agent::llm::ProviderStatus;
use garden_agent::runtime::AdvisorRuntime;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<AdvisorRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub personalization: HealthCheck,
    pub checked_at: String,
}

pub fn router(runtime: Arc<AdvisorRuntime>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { runtime })
}

/// Personalization is optional, so a disabled provider never degrades the service.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.runtime);
    let ready = catalog.status == "ready";

    let personalization = match state.runtime.provider_status() {
        ProviderStatus::Available => HealthCheck {
            status: "ready",
            detail: format!("provider `{}` configured", state.runtime.provider_name()),
        },
        ProviderStatus::Disabled => HealthCheck {
            status: "disabled",
            detail: "serving rule-based reports only".to_string(),
        },
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "garden-server runtime initialized".to_string(),
        },
        catalog,
        personalization,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(runtime: &AdvisorRuntime) -> HealthCheck {
    let catalog = runtime.catalog();
    if catalog.is_empty() {
        HealthCheck { status: "degraded", detail: "catalog has no items".to_string() }
    } else {
        HealthCheck { status: "ready", detail: format!("{} items loaded", catalog.len()) }
    }
}
