use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Coarse failure classes shared by the recorder, the feed, and the points engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Consistency,
    Unavailable,
}

impl ErrorKind {
    pub const fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Consistency | ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body used by every engagement route.
pub(crate) fn error_response(kind: ErrorKind, message: String) -> Response {
    let payload = json!({
        "error": message,
        "kind": kind,
    });
    (kind.status(), Json(payload)).into_response()
}

pub(crate) fn unauthenticated() -> Response {
    let payload = json!({ "error": "missing or invalid session" });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}
