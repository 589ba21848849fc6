pub mod cache;
pub mod factory;
pub mod fingerprint;
pub mod impersonation;
pub mod issuer;
pub mod service;
pub mod token_shape;
pub mod verifier;

pub use cache::{DerivedCredential, ImpersonationCache};
pub use factory::build_auth_service;
pub use impersonation::ImpersonationService;
pub use issuer::{ImpersonationIssuer, IssueError};
pub use service::{AuthError, AuthService, Authenticated};
pub use verifier::{TokenVerifier, VerifiedClaims, VerifyError};
