//! JSON envelope shared by every `/api` response.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": []
//! }
//! ```
//!
//! Successes carry `data` and an empty `errors`; failures carry `data: null`
//! and one `{code, message}` entry.

use std::time::Instant;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub meta: ApiMeta,
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// UUID v7, unique per request.
    pub request_id: String,
    /// RFC 3339.
    pub timestamp: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable, e.g. `SESSION_NOT_FOUND`.
    pub code: String,
    pub message: String,
}

/// Per-request id and clock, started at the top of each handler.
pub struct RequestTimer {
    request_id: String,
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            start: Instant::now(),
        }
    }

    /// Wrap `data` in a success envelope stamped with the elapsed time.
    pub fn finish<T: Serialize>(self, data: T) -> ApiResponse<T> {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        ApiResponse {
            data: Some(data),
            meta: ApiMeta::new(self.request_id, elapsed_ms),
            errors: Vec::new(),
        }
    }
}

impl ApiMeta {
    fn new(request_id: String, response_time_ms: u64) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms,
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope with a single error entry.
    pub fn error(code: &str, message: &str, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: None,
            meta: ApiMeta::new(request_id, response_time_ms),
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            }],
        }
    }
}

/// Always 200; callers that need another status pair the envelope with one.
impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
