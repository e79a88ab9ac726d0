//! Success envelopes for API responses.
//!
//! Failures are rendered by [`crate::error::QueryError`].

use serde::{Deserialize, Serialize};

/// `{"success": true, "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
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

/// Trip listing envelope carrying pagination alongside the rows.
#[derive(Debug, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub data: Vec<T>,
}

/// Body of `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
