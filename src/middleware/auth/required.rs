//! required 認証: bearer token 検証 → AuthCtx を extensions に入れる。失敗なら reject。
//!
//! 失敗時のマッピング:
//! - header なし / scheme 不正 / 検証失敗 → 401
//! - impersonation token の署名失敗 → 500
//!
//! 失敗時は下流の handler を呼ばない。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::authenticate_request;
use crate::services::auth::{AuthError, fingerprint::fingerprint};
use crate::state::AppState;

/// `router` の全 route に required 認証をかける
///
/// ```ignore
/// let protected = Router::new().route("/auth/session", get(session));
/// let protected = middleware::auth::required::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn では State extractor が使えないので state を明示的に渡す
    router.route_layer(middleware::from_fn_with_state(state, required_middleware))
}

async fn required_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = match authenticate_request(&state, req.headers()) {
        Ok(ctx) => ctx,
        Err(err) => {
            log_failure(&req, &err);
            return Err(err.into());
        }
    };

    tracing::debug!(user_id = %auth_ctx.user_id, "request authenticated");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

fn log_failure(req: &Request<Body>, err: &AuthError) {
    let token_fp = crate::middleware::auth::bearer_token(req.headers())
        .ok()
        .map(fingerprint);

    match err {
        AuthError::Issue(e) => tracing::error!(
            error = %e,
            token_fp = token_fp.as_deref(),
            "impersonation token issuance failed"
        ),
        _ => tracing::warn!(
            kind = err.kind(),
            error = %err,
            token_fp = token_fp.as_deref(),
            path = %req.uri().path(),
            "authentication failed"
        ),
    }
}
