/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthService (verifier + impersonation cache), store: 下流の data store
 * - Clone 前提で持つ (内部は Arc で cheap)
 */
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub store: Option<Arc<StoreConfig>>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, store: Option<StoreConfig>) -> Self {
        Self {
            auth,
            store: store.map(Arc::new),
        }
    }
}
