//! JSON API for report generation and the item encyclopedia.
//!
//! - `POST /api/analyze`     : analyze a selection, returns a report
//! - `GET  /api/items`       : list items, optional `source` and `tier` filters
//! - `GET  /api/items/{key}` : one item by name or numeric id

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use garden_agent::runtime::AdvisorRuntime;
use garden_core::domain::item::{Item, ItemSource, Tier};
use garden_core::domain::report::Report;
use garden_core::errors::{ErrorKind, InterfaceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AdvisorRuntime>,
}

pub fn router(runtime: Arc<AdvisorRuntime>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/items", get(list_items))
        .route("/api/items/{key}", get(get_item))
        .with_state(ApiState { runtime })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
    user_message: &'static str,
    correlation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Interface errors rendered as `{ "error": { ... } }`.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: self.0.kind(),
                message: self.0.message().to_string(),
                user_message: self.0.user_message(),
                correlation_id: self.0.correlation_id().to_string(),
                fields: self.0.fields().to_vec(),
            },
        };
        (status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>, field: &str, correlation_id: &str) -> ApiError {
    ApiError(InterfaceError::BadRequest {
        kind: ErrorKind::ValidationError,
        message: message.into(),
        fields: vec![field.to_string()],
        correlation_id: correlation_id.to_string(),
    })
}

fn correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

async fn analyze(State(state): State<ApiState>, body: Bytes) -> Result<Json<Report>, ApiError> {
    let correlation_id = correlation_id();

    let raw = serde_json::from_slice::<Value>(&body).map_err(|error| {
        warn!(
            event_name = "api.analyze.unparseable",
            correlation_id = %correlation_id,
            error = %error,
            "request body is not valid JSON"
        );
        bad_request(format!("request body is not valid JSON: {error}"), "body", &correlation_id)
    })?;

    let outcome = state
        .runtime
        .analyze_traced(&raw, &correlation_id)
        .await
        .map_err(|error| ApiError(error.into_interface(correlation_id.clone())))?;

    info!(
        event_name = "api.analyze.completed",
        correlation_id = %correlation_id,
        report_id = %outcome.report.report_id,
        warnings = outcome.warnings.len(),
        "analysis served"
    );
    Ok(Json(outcome.report))
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub source: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemList {
    pub count: usize,
    pub items: Vec<Item>,
}

async fn list_items(
    State(state): State<ApiState>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<ItemList>, ApiError> {
    let correlation_id = correlation_id();

    let source = match query.source.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Some(ItemSource::parse(raw).ok_or_else(|| {
            bad_request(format!("source must be crop or pet, got `{raw}`"), "source", &correlation_id)
        })?),
        None => None,
    };
    let tier = match query.tier.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Some(Tier::parse(raw).ok_or_else(|| {
            bad_request(format!("unknown tier `{raw}`"), "tier", &correlation_id)
        })?),
        None => None,
    };

    let items =
        state.runtime.catalog().filter(source, tier).into_iter().cloned().collect::<Vec<_>>();
    Ok(Json(ItemList { count: items.len(), items }))
}

async fn get_item(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<Item>, ApiError> {
    state.runtime.catalog().resolve(&key).cloned().map(Json).ok_or_else(|| {
        ApiError(InterfaceError::not_found(format!("no item matches `{key}`"), correlation_id()))
    })
}
