use std::{fmt, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;

use crate::services::auth::token_shape::{self, TokenShapeError};

/// Algorithms the identity provider may sign with. Everything else is refused
/// before the signature is looked at.
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(#[from] TokenShapeError),
    #[error("unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),
    #[error("token expired")]
    Expired,
    #[error("signature mismatch")]
    InvalidSignature,
    #[error("missing 'sub' claim")]
    MissingSubject,
    #[error("jwt verification failed: {0}")]
    Jwt(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm => Self::UnexpectedSigningMethod("rejected by key".into()),
            _ => Self::Jwt(e),
        }
    }
}

/// Claims issued by the identity provider.
#[derive(Debug, Clone, Deserialize)]
struct BearerClaims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

/// Identity facts extracted from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub email: String,
    pub role: String,
    pub expires_at: i64,
    pub issued_at: Option<i64>,
}

/// Signature + claim verification for a token that already passed the
/// structural gate.
pub trait ClaimsDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<VerifiedClaims, VerifyError>;
}

/// HMAC (shared secret) decoder.
pub struct HmacClaimsDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for HmacClaimsDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacClaimsDecoder")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl HmacClaimsDecoder {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = leeway_seconds;
        // Provider tokens carry `aud: "authenticated"`; we do not pin an audience.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl ClaimsDecoder for HmacClaimsDecoder {
    fn decode(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let header = jsonwebtoken::decode_header(token)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(VerifyError::UnexpectedSigningMethod(format!(
                "{:?}",
                header.alg
            )));
        }

        let data =
            jsonwebtoken::decode::<BearerClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(VerifyError::MissingSubject);
        }

        Ok(VerifiedClaims {
            subject: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at: claims.exp,
            issued_at: claims.iat,
        })
    }
}

/// Verifies inbound bearer tokens: structural gate first, then the decoder.
#[derive(Clone)]
pub struct TokenVerifier {
    decoder: Arc<dyn ClaimsDecoder>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn hmac(secret: &[u8], leeway_seconds: u64) -> Self {
        Self::with_decoder(Arc::new(HmacClaimsDecoder::new(secret, leeway_seconds)))
    }

    pub fn with_decoder(decoder: Arc<dyn ClaimsDecoder>) -> Self {
        Self { decoder }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        token_shape::check(token)?;
        self.decoder.decode(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &[u8] = b"verifier-test-secret-0123456789abcdef";

    fn mint(alg: Algorithm, claims: serde_json::Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret))
            .unwrap()
    }

    fn valid_claims(sub: &str) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "sub": sub,
            "email": "user@example.com",
            "role": "authenticated",
            "aud": "authenticated",
            "iat": now,
            "exp": now + 600,
        })
    }

    #[derive(Default)]
    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl ClaimsDecoder for CountingDecoder {
        fn decode(&self, _token: &str) -> Result<VerifiedClaims, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VerifyError::InvalidSignature)
        }
    }

    #[test]
    fn structural_gate_runs_before_decoder() {
        let decoder = Arc::new(CountingDecoder::default());
        let verifier = TokenVerifier::with_decoder(decoder.clone());

        for token in ["", "nodots", "one.dot", "a.b.c.d", "a.b.c.d.e.f"] {
            let err = verifier.verify(token).unwrap_err();
            assert!(matches!(err, VerifyError::Malformed(_)), "{token}: {err:?}");
        }
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);

        let _ = verifier.verify("a.b.c");
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn verifies_hs256_and_extracts_claims() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let token = mint(Algorithm::HS256, valid_claims("user-42"), SECRET);

        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.subject, "user-42");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, "authenticated");
        assert!(claims.issued_at.is_some());
    }

    #[test]
    fn accepts_other_hmac_variants() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = mint(alg, valid_claims("user-7"), SECRET);
            assert_eq!(verifier.verify(&token).unwrap().subject, "user-7");
        }
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let token = mint(Algorithm::HS256, valid_claims("user-42"), b"some-other-secret");

        assert!(matches!(
            verifier.verify(&token),
            Err(VerifyError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let now = chrono::Utc::now().timestamp();
        let claims = json!({ "sub": "user-42", "iat": now - 7200, "exp": now - 3600 });
        let token = mint(Algorithm::HS256, claims, SECRET);

        assert!(matches!(verifier.verify(&token), Err(VerifyError::Expired)));
    }

    #[test]
    fn rejects_asymmetric_algorithm_header() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let token = mint(Algorithm::HS256, valid_claims("user-42"), SECRET);
        let (_, rest) = token.split_once('.').unwrap();

        for alg in ["RS256", "ES256", "EdDSA"] {
            let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            let forged = format!("{header}.{rest}");

            let err = verifier.verify(&forged).unwrap_err();
            assert!(
                matches!(err, VerifyError::UnexpectedSigningMethod(_)),
                "{alg}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_oversized_payload_even_when_signed() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let mut claims = valid_claims("user-42");
        claims["padding"] = json!("x".repeat(7000));
        let token = mint(Algorithm::HS256, claims, SECRET);

        assert!(matches!(
            verifier.verify(&token),
            Err(VerifyError::Malformed(TokenShapeError::PayloadTooLong))
        ));
    }

    #[test]
    fn rejects_missing_subject() {
        let verifier = TokenVerifier::hmac(SECRET, 0);
        let now = chrono::Utc::now().timestamp();
        let token = mint(Algorithm::HS256, json!({ "exp": now + 60 }), SECRET);

        assert!(matches!(
            verifier.verify(&token),
            Err(VerifyError::MissingSubject)
        ));
    }
}
