/*
 * Responsibility
 * - middleware 層の公開インターフェース
 * - auth (required / optional), cors, http (request id, tracing, limits), security headers
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
