use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::app::dto::HealthResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Liveness plus a round trip to the account store.
pub async fn health(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<HealthResponse>, ApiError> {
    services
        .accounts
        .ping()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: services.version.clone(),
        project: services.project_name.clone(),
        database: "connected",
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
