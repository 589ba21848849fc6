use std::sync::Arc;

use tracing::debug;

use crate::services::auth::cache::{DerivedCredential, ImpersonationCache};
use crate::services::auth::issuer::{ImpersonationIssuer, IssueError};
use crate::services::clock::Clock;

/// Hands out impersonation tokens: cached while fresh, re-issued otherwise.
///
/// Two requests for a subject that is not cached yet may both issue a token;
/// the last `put` wins and both tokens stay valid until their own expiry.
#[derive(Debug)]
pub struct ImpersonationService {
    issuer: ImpersonationIssuer,
    cache: ImpersonationCache,
    clock: Arc<dyn Clock>,
}

impl ImpersonationService {
    pub fn new(
        issuer: ImpersonationIssuer,
        cache: ImpersonationCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issuer,
            cache,
            clock,
        }
    }

    pub fn credential_for(&self, subject: &str) -> Result<DerivedCredential, IssueError> {
        if let Some(cached) = self.cache.get(subject) {
            debug!(subject, "impersonation token cache hit");
            return Ok(cached);
        }

        // Sign outside of any cache lock.
        let issued = self.issuer.issue(subject, self.clock.now())?;
        self.cache.put(subject, issued.token.clone(), issued.expires_at);

        debug!(subject, expires_at = %issued.expires_at, "issued impersonation token");

        Ok(DerivedCredential {
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    pub fn cache(&self) -> &ImpersonationCache {
        &self.cache
    }
}
