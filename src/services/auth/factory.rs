/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{
    AuthService, ImpersonationCache, ImpersonationIssuer, ImpersonationService, TokenVerifier,
};
use crate::services::clock::Clock;

pub fn build_auth_service(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<Arc<AuthService>, AppError> {
    let verifier = TokenVerifier::hmac(
        config.idp_jwt_secret.as_bytes(),
        config.access_token_leeway_seconds,
    );

    let issuer = ImpersonationIssuer::new(
        config.impersonation_signing_secret().as_bytes(),
        config.impersonation_ttl_seconds,
    )
    .map_err(|e| {
        error!(error = %e, "invalid impersonation issuer configuration");
        AppError::Internal
    })?;

    let cache = ImpersonationCache::new(config.impersonation_cache_max_entries, clock.clone());
    let impersonation = ImpersonationService::new(issuer, cache, clock);

    Ok(Arc::new(AuthService::new(verifier, impersonation)))
}
