/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - required / optional 認証をどの範囲にかけるかもここで決める
 */
use axum::{Router, routing::get};

use crate::middleware::auth::{optional, required};
use crate::state::AppState;

use crate::api::v1::handlers::{health::health, session::session, viewer::viewer};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let protected = required::apply(
        Router::new().route("/auth/session", get(session)),
        state.clone(),
    );

    let personalized = optional::apply(Router::new().route("/viewer", get(viewer)), state);

    public.merge(protected).merge(personalized)
}
