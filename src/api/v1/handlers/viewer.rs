/*
 * Responsibility
 * - GET /viewer (optional auth)
 * - 匿名でもログイン済みでも同じ形のレスポンス
 */
use axum::Json;

use crate::api::v1::dto::{ApiResponse, ViewerResponse};
use crate::api::v1::extractors::MaybeAuthCtx;

pub async fn viewer(MaybeAuthCtx(ctx): MaybeAuthCtx) -> Json<ApiResponse<ViewerResponse>> {
    Json(ApiResponse::ok(ViewerResponse {
        authenticated: ctx.is_some(),
        user_id: ctx.map(|ctx| ctx.user_id),
    }))
}
