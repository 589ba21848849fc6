//! Bearer token 認証 middleware
//!
//! - `required`: 認証できなければ 401/500 で止める
//! - `optional`: 認証できれば identity を付与、できなければ匿名のまま通す
//!
//! 手順は共通: `Authorization: Bearer <token>` を取り出して検証し、
//! impersonation token を cache から取得 (なければ発行) して `AuthCtx` を作る。
pub mod optional;
pub mod required;

use axum::http::{HeaderMap, header};

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::AuthError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// `Authorization: Bearer <token>` の token 部分
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let value = value.to_str().map_err(|_| AuthError::InvalidScheme)?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidScheme),
    }
}

pub(crate) fn authenticate_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthCtx, AuthError> {
    let token = bearer_token(headers)?;
    let authenticated = state.auth.authenticate(token)?;

    Ok(AuthCtx::new(token, authenticated))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_token_after_prefix() {
        assert_eq!(bearer_token(&headers("Bearer a.b.c")).unwrap(), "a.b.c");
    }

    #[test]
    fn missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingHeader)
        ));
    }

    #[test]
    fn rejects_other_schemes_and_empty_token() {
        for value in ["Basic dXNlcjpwYXNz", "bearer a.b.c", "Bearer", "Bearer ", "a.b.c"] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(AuthError::InvalidScheme)),
                "{value}"
            );
        }
    }
}
