//! Explicit caller identity handed to every engagement operation.
//!
//! Authentication itself happens upstream; the host forwards the resolved user id and the
//! bearer token it validated, and nothing in this crate reads ambient auth state.

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::engagement::domain::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            token: token.into(),
        }
    }

    /// Build a session from forwarded headers. Returns `None` for anonymous callers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        Some(Self::new(user_id, token))
    }
}
