/*
 * Responsibility
 * - GET /health (疎通用、認証なし)
 */
use axum::Json;

use crate::api::v1::dto::{ApiResponse, HealthResponse};

pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy",
        message: "Server is running",
    }))
}
