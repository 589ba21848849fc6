/*
 * Responsibility
 * - GET /auth/session (required auth)
 * - 検証済みの identity と impersonation token の期限を返す
 */
use axum::Json;

use crate::api::v1::dto::{ApiResponse, SessionResponse};
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn session(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(SessionResponse {
        user_id: ctx.user_id,
        email: ctx.email,
        role: ctx.role,
        impersonation_expires_at: ctx.impersonation_expires_at,
    }))
}
