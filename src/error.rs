//! Error types for the batch pipeline and the read API.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// A guarantee established by validation did not hold further down the pipeline.
#[derive(Debug, Error, PartialEq)]
#[error("data integrity fault: {0}")]
pub struct IntegrityFault(pub String);

/// Errors raised by the batch commands (`clean`, `load`, `rank`).
///
/// Every variant is fatal to the run; a half-built store must be rebuilt.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required upstream file or store is absent.
    #[error("{} not found, run `{step}` first", path.display())]
    MissingPrerequisite { path: PathBuf, step: &'static str },

    #[error(transparent)]
    Integrity(#[from] IntegrityFault),

    /// The operator pressed ctrl+c during a batch run.
    #[error("interrupted by user")]
    Interrupted,

    #[error("invalid input {source_name}: {reason}")]
    InvalidInput { source_name: String, reason: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to read or write CSV")]
    Csv(#[from] csv::Error),

    #[error("failed to serialise JSON")]
    Json(#[from] serde_json::Error),

    #[error("database error")]
    Database(#[from] rusqlite::Error),

    #[error("failed to download input")]
    Download(#[from] reqwest::Error),

    #[error("batch worker failed")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Errors raised while answering a read request.
///
/// Isolated to the request that caused them; rendered as
/// `{"success": false, "error": ...}`.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed filter or pagination parameter.
    #[error("{0}")]
    BadRequest(String),

    #[error("store query failed: {0}")]
    Store(#[from] rusqlite::Error),

    /// Another request panicked while holding the connection.
    #[error("store connection is unavailable")]
    StoreUnavailable,

    #[error(transparent)]
    Integrity(#[from] IntegrityFault),

    #[error("query worker failed")]
    Worker(#[from] tokio::task::JoinError),
}

impl QueryError {
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::Store(_)
            | QueryError::StoreUnavailable
            | QueryError::Integrity(_)
            | QueryError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of a failed API response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let mut current: Option<&dyn std::error::Error> = Some(&self);
            while let Some(err) = current {
                error!(error = %err, "Query failed");
                current = err.source();
            }
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
