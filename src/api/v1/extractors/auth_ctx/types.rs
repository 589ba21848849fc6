/*
 * Responsibility
 * - handler から見える「認証済みリクエスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型を受け取るだけ
 *
 * Notes
 * - token 検証や impersonation token 発行は middleware/services 側の責務
 * - route 側のコードとは分けて、固定の契約として保つ
 */
use std::fmt;

use axum::http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue};
use chrono::{DateTime, Utc};

use crate::config::StoreConfig;
use crate::services::auth::Authenticated;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` / `email` / `role` は検証済み bearer token の claims
/// - `access_token` は呼び出し元自身の bearer token
/// - `impersonation_token` は data store に提示するためにローカルで署名した token
#[derive(Clone)]
pub struct AuthCtx {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub access_token: String,
    pub impersonation_token: String,
    pub impersonation_expires_at: DateTime<Utc>,
}

impl fmt::Debug for AuthCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // token はログに出さない
        f.debug_struct("AuthCtx")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("impersonation_expires_at", &self.impersonation_expires_at)
            .finish_non_exhaustive()
    }
}

impl AuthCtx {
    pub fn new(access_token: impl Into<String>, authenticated: Authenticated) -> Self {
        let Authenticated { claims, credential } = authenticated;
        Self {
            user_id: claims.subject,
            email: claims.email,
            role: claims.role,
            access_token: access_token.into(),
            impersonation_token: credential.token,
            impersonation_expires_at: credential.expires_at,
        }
    }

    /// このユーザーとして data store を呼ぶときの header
    pub fn store_headers(&self, store: &StoreConfig) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", self.impersonation_token))?;
        bearer.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, bearer);

        let mut apikey = HeaderValue::from_str(&store.anon_key)?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        Ok(headers)
    }
}
