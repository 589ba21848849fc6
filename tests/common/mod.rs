#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use marketplace_gateway::{
    app::{build_router, build_state},
    config::Config,
    services::clock::ManualClock,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("IDP_JWT_SECRET".into(), SECRET.into());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_source(|key| vars.get(key).cloned()).expect("test config")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
}

pub fn app() -> TestApp {
    app_with(&[])
}

pub fn app_with(extra: &[(&str, &str)]) -> TestApp {
    let config = config(extra);
    let clock = ManualClock::new(Utc::now());
    let state = build_state(&config, Arc::new(clock.clone())).expect("state");
    let router = build_router(state.clone(), &config);
    TestApp {
        router,
        state,
        clock,
    }
}

/// Bearer token as the identity provider would issue it.
pub fn idp_token(sub: &str, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": sub,
        "email": format!("{sub}@example.com"),
        "role": "authenticated",
        "aud": "authenticated",
        "iat": now,
        "exp": now + ttl_seconds,
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode")
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.expect("infallible");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}
