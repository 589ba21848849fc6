use chrono::{DateTime, Utc};
use serde::Serialize;

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub impersonation_expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ViewerResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
}
