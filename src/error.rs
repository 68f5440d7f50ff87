//! Error types for cadvisor-relabel
//!
//! All errors implement `IntoResponse` for Axum handlers. Scrape requests
//! never surface these as error statuses: fetch and parse failures are
//! turned into a `relabel_success 0` marker by the scrape handler.

use crate::exposition::ParseError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Malformed exposition text: {0}")]
    Parse(#[from] ParseError),

    #[error("Mapping table rejected: {0}")]
    RefreshValidation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Fetch { .. } | Self::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            Self::Parse(_) | Self::RefreshValidation(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
