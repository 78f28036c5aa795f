//! Directory service HTTP façade over the registry store.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};

use crate::directory::wire::{
    BackendList, HealthStatus, ModelList, RegisterRequest, ServicesResponse, StatusMessage,
    UnregisterRequest,
};
use crate::http::ApiError;
use crate::registry::RegistryStore;

/// Routes served by the directory (standalone or embedded in the gateway).
pub fn router(store: Arc<RegistryStore>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/unregister", delete(unregister))
        .route("/services", get(list_services))
        .route("/services/types/{kind}", get(list_by_type))
        .route("/services/models/{name}", get(list_by_model))
        .route("/health", get(health))
        .with_state(store)
}

async fn register(
    State(store): State<Arc<RegistryStore>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed registration");
        ApiError::BadRequest(format!("Invalid registration payload: {}", e.body_text()))
    })?;

    let (Some(url), Some(models)) = (request.url, request.models) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: url and models".to_string(),
        ));
    };

    let outcome = store
        .register(&url, &models)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to register service: {}", e)))?;

    Ok(Json(StatusMessage::ok(format!(
        "Service registered: {}",
        outcome.url
    ))))
}

async fn unregister(
    State(store): State<Arc<RegistryStore>>,
    payload: Result<Json<UnregisterRequest>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let url = payload
        .ok()
        .and_then(|Json(request)| request.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: url".to_string()))?;

    if store.unregister(&url).await {
        Ok(Json(StatusMessage::ok(format!("Service unregistered: {}", url))))
    } else {
        Err(ApiError::NotFound(
            "Service not found or already unregistered".to_string(),
        ))
    }
}

async fn list_services(State(store): State<Arc<RegistryStore>>) -> Json<ServicesResponse> {
    Json(ServicesResponse {
        success: true,
        services: store.list_all().await,
    })
}

async fn list_by_type(
    State(store): State<Arc<RegistryStore>>,
    Path(kind): Path<String>,
) -> Result<Json<ModelList>, ApiError> {
    if kind.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing required parameter: type".to_string()));
    }
    Ok(Json(ModelList {
        available_models: store.list_by_type(&kind).await,
    }))
}

async fn list_by_model(
    State(store): State<Arc<RegistryStore>>,
    Path(name): Path<String>,
) -> Json<BackendList> {
    Json(BackendList {
        success: true,
        services: store.list_by_model(&name).await,
    })
}

pub(crate) async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
