use std::fmt;

use crate::services::auth::cache::DerivedCredential;
use crate::services::auth::impersonation::ImpersonationService;
use crate::services::auth::issuer::IssueError;
use crate::services::auth::verifier::{TokenVerifier, VerifiedClaims, VerifyError};

/// Why a request could not be authenticated.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("invalid authorization header format")]
    InvalidScheme,
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl AuthError {
    /// Short label for logs; never includes token material.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::InvalidScheme => "invalid_scheme",
            Self::Verify(VerifyError::Malformed(_)) => "malformed_token",
            Self::Verify(VerifyError::UnexpectedSigningMethod(_)) => "unexpected_signing_method",
            Self::Verify(VerifyError::Expired) => "token_expired",
            Self::Verify(VerifyError::InvalidSignature) => "invalid_signature",
            Self::Verify(VerifyError::MissingSubject) => "missing_subject",
            Self::Verify(VerifyError::Jwt(_)) => "invalid_token",
            Self::Issue(_) => "impersonation_issue_failed",
        }
    }
}

/// A verified caller plus the impersonation token to use on its behalf.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: VerifiedClaims,
    pub credential: DerivedCredential,
}

/// Verifies inbound bearer tokens and exchanges them for impersonation tokens.
pub struct AuthService {
    verifier: TokenVerifier,
    impersonation: ImpersonationService,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("impersonation", &self.impersonation)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(verifier: TokenVerifier, impersonation: ImpersonationService) -> Self {
        Self {
            verifier,
            impersonation,
        }
    }

    /// Verify `token`, then fetch or issue the impersonation token for its subject.
    pub fn authenticate(&self, token: &str) -> Result<Authenticated, AuthError> {
        let claims = self.verifier.verify(token)?;
        let credential = self.impersonation.credential_for(&claims.subject)?;

        Ok(Authenticated { claims, credential })
    }

    pub fn impersonation(&self) -> &ImpersonationService {
        &self.impersonation
    }
}
