//! CORS policy for browser clients.
//!
//! Policy:
//! - Development: permissive (Allow-Origin: *), WITHOUT credentials.
//! - Production: exact-match allowlist from Config, WITH credentials, since the
//!   browser front end sends the bearer token on cross-origin calls.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Apply CORS policy to the given Router.
///
/// Wildcard origin is never combined with `allow_credentials(true)`.
pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        // An empty allowlist allows no origin at all.
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        // Exact match only, so a stray `*` entry matches nothing.
        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_credentials(true)
    } else {
        CorsLayer::new().allow_origin(Any)
    }
    .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(Duration::from_secs(60 * 60));

    router.layer(cors)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn production(origins: &str) -> Config {
        Config::from_source(|key| match key {
            "APP_ENV" => Some("production".into()),
            "IDP_JWT_SECRET" => Some("cors-test-secret-0123456789abcdef".into()),
            "CORS_ALLOWED_ORIGINS" => Some(origins.into()),
            _ => None,
        })
        .unwrap()
    }

    async fn allow_origin_for(config: &Config, origin: &str) -> Option<HeaderValue> {
        let router = apply(Router::new().route("/", get(|| async { "ok" })), config);
        let req = Request::get("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn production_echoes_only_listed_origins() {
        let config = production("https://shop.example.com");

        assert_eq!(
            allow_origin_for(&config, "https://shop.example.com").await,
            Some(HeaderValue::from_static("https://shop.example.com"))
        );
        assert_eq!(allow_origin_for(&config, "https://evil.example.com").await, None);
    }

    #[tokio::test]
    async fn wildcard_entry_in_production_matches_nothing() {
        let config = production("*,https://shop.example.com");

        assert_eq!(allow_origin_for(&config, "https://evil.example.com").await, None);
        assert!(
            allow_origin_for(&config, "https://shop.example.com")
                .await
                .is_some()
        );
    }
}
