//! optional 認証: 有効な bearer token があれば AuthCtx を付与、なければ匿名で続行。
//! ここでは絶対に reject しない。
//!
//! impersonation token の発行失敗も同様 (ログだけ出して identity なしで続行)。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::middleware::auth::authenticate_request;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// `router` の全 route に optional 認証をかける
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, optional_middleware))
}

async fn optional_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate_request(&state, req.headers()) {
        Ok(auth_ctx) => {
            req.extensions_mut().insert(auth_ctx);
        }
        Err(AuthError::MissingHeader) => {}
        Err(AuthError::Issue(err)) => {
            tracing::error!(error = %err, "impersonation token issuance failed, continuing anonymously");
        }
        Err(err) => {
            tracing::debug!(kind = err.kind(), "optional authentication skipped");
        }
    }

    next.run(req).await
}
