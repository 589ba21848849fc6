use std::fmt;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Role claim the data store's policy engine treats as a signed-in user.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Default lifetime of an impersonation token.
pub const DEFAULT_TTL_SECONDS: u64 = 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("ttl out of range: {0} seconds")]
    InvalidTtl(u64),
    #[error("failed to sign impersonation token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Claims of the locally minted impersonation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationClaims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub token: String,
    /// Equal to the signed `exp` claim (whole seconds).
    pub expires_at: DateTime<Utc>,
}

/// Signs impersonation tokens with the data store's shared secret (HS256).
#[derive(Clone)]
pub struct ImpersonationIssuer {
    encoding_key: EncodingKey,
    ttl: TimeDelta,
}

impl fmt::Debug for ImpersonationIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("ImpersonationIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ImpersonationIssuer {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Result<Self, IssueError> {
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds)
            .ok_or(IssueError::InvalidTtl(ttl_seconds))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Mint a token for `subject`, valid from `now` for the configured ttl.
    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedCredential, IssueError> {
        // `iat`/`exp` are whole seconds; the recorded expiry must not outlive `exp`.
        let now = now.trunc_subsecs(0);
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(IssueError::InvalidTtl(self.ttl.num_seconds().unsigned_abs()))?;
        let claims = ImpersonationClaims {
            sub: subject.to_string(),
            role: AUTHENTICATED_ROLE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, subject, "failed to sign impersonation token");
            IssueError::Sign(e)
        })?;

        Ok(IssuedCredential { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;
    use crate::services::auth::verifier::TokenVerifier;

    const SECRET: &[u8] = b"issuer-test-secret-0123456789abcdef";

    #[test]
    fn issues_authenticated_token_for_subject() {
        let issuer = ImpersonationIssuer::new(SECRET, DEFAULT_TTL_SECONDS).unwrap();
        let now = Utc::now();

        let issued = issuer.issue("user-42", now).unwrap();

        assert_eq!(issued.expires_at, now.trunc_subsecs(0) + TimeDelta::seconds(3600));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<ImpersonationClaims>(
            &issued.token,
            &DecodingKey::from_secret(SECRET),
            &validation,
        )
        .unwrap();

        assert_eq!(data.header.alg, Algorithm::HS256);
        assert_eq!(data.claims.sub, "user-42");
        assert_eq!(data.claims.role, AUTHENTICATED_ROLE);
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
        assert_eq!(data.claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn recorded_expiry_matches_exp_claim_for_fractional_now() {
        let issuer = ImpersonationIssuer::new(SECRET, 3600).unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 900_000_000).unwrap();

        let issued = issuer.issue("u", now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.validate_exp = false;
        let claims = jsonwebtoken::decode::<ImpersonationClaims>(
            &issued.token,
            &DecodingKey::from_secret(SECRET),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(issued.expires_at, DateTime::from_timestamp(claims.exp, 0).unwrap());
    }

    #[test]
    fn issued_token_passes_inbound_verifier() {
        let issuer = ImpersonationIssuer::new(SECRET, 120).unwrap();
        let issued = issuer.issue("user-42", Utc::now()).unwrap();

        let claims = TokenVerifier::hmac(SECRET, 0).verify(&issued.token).unwrap();

        assert_eq!(claims.subject, "user-42");
        assert_eq!(claims.role, AUTHENTICATED_ROLE);
    }

    #[test]
    fn rejects_zero_ttl() {
        assert!(matches!(
            ImpersonationIssuer::new(SECRET, 0),
            Err(IssueError::InvalidTtl(0))
        ));
        assert!(matches!(
            ImpersonationIssuer::new(SECRET, u64::MAX),
            Err(IssueError::InvalidTtl(_))
        ));
    }
}
