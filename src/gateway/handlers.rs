//! Gateway request handlers.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::directory::ModelList;
use crate::gateway::forwarder::OutboundRequest;
use crate::gateway::state::AppState;
use crate::http::{ApiError, X_REQUEST_ID};
use crate::observability::metrics;

const MISSING_MODEL: &str = "Error: Model name must be specified in the request.";

/// The only part of a process request body the gateway looks at.
#[derive(Debug, Default, Deserialize)]
struct ModelSelector {
    #[serde(rename = "modelName")]
    model_name: Option<String>,
    model: Option<String>,
}

/// `modelName`, falling back to `model`. Blank names count as missing.
fn requested_model(body: &[u8]) -> Option<String> {
    let selector: ModelSelector = serde_json::from_slice(body).ok()?;
    [selector.model_name, selector.model]
        .into_iter()
        .flatten()
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
}

/// 400 body shaped like a normal reply for the request kind.
fn missing_model(kind: &str) -> Response {
    let body = match kind {
        "chat" => json!({
            "actor": "system",
            "content": MISSING_MODEL,
            "error": "Missing model name",
        }),
        "summarize" => json!({
            "summary": MISSING_MODEL,
            "error": "Missing model name",
        }),
        _ => json!({
            "success": false,
            "error": "Missing model name",
        }),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn outbound(method: Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> OutboundRequest {
    OutboundRequest {
        method,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        content_type: headers.get(header::CONTENT_TYPE).cloned(),
        request_id: headers.get(X_REQUEST_ID).cloned(),
        body,
    }
}

/// `POST /api/process/{kind}`
pub async fn process(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let response = match requested_model(&body) {
        None => {
            tracing::warn!(kind = %kind, "Process request without a model name");
            missing_model(&kind)
        }
        Some(model) => {
            let request = outbound(method, &uri, &headers, body);
            forward_to_model(&state, &model, &request)
                .await
                .unwrap_or_else(IntoResponse::into_response)
        }
    };
    metrics::record_request(&kind, response.status().as_u16(), start);
    response
}

async fn forward_to_model(
    state: &AppState,
    model: &str,
    request: &OutboundRequest,
) -> Result<Response, ApiError> {
    let candidates = state.resolver.candidates(model).await.map_err(|e| {
        tracing::error!(model = %model, error = %e, "Directory lookup failed");
        ApiError::Internal(format!("Failed to process request: {}", e))
    })?;

    if candidates.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No services available for model: {}",
            model
        )));
    }

    state.forwarder.forward(model, candidates, request).await
}

/// `GET /api/models`
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelList>, ApiError> {
    let available_models = state
        .resolver
        .all_models()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get models: {}", e)))?;
    Ok(Json(ModelList { available_models }))
}

/// `GET /api/models/types/{type}`
pub async fn list_models_by_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ModelList>, ApiError> {
    if kind.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing required parameter: type".to_string()));
    }
    let available_models = state
        .resolver
        .models_by_type(&kind)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get models: {}", e)))?;
    Ok(Json(ModelList { available_models }))
}

/// `/api/logs*` and `/api/query*`, any method.
pub async fn relay_logs(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.logs.relay(&outbound(method, &uri, &headers, body)).await
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route not found: {}", uri.path()))
}
