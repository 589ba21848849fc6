/*!
 * 認証コンテキスト extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト (AuthCtx) を handler に渡す
 * - axum 依存の実装は core、型そのものは types に置く
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor (required)
 * - MaybeAuthCtx (optional)
 */

mod core;
mod types;

pub use self::core::{AuthCtxExtractor, MaybeAuthCtx};
pub use types::AuthCtx;
