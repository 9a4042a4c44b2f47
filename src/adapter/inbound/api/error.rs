//! JSON error bodies for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ConfigError, Error, TradeError};

/// `{ "code": ..., "message": ... }` with a matching status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip)]
    status: u16,
}

impl ApiError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        Self::new(err.status_code(), err.code(), err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::UnknownKey { .. } => "unknown_key",
            ConfigError::InvalidValue { .. } | ConfigError::MissingField { .. } => "invalid_value",
            _ => "invalid_config",
        };
        Self::new(400, code, err.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Trade(inner) => inner.into(),
            Error::Config(inner) => inner.into(),
            other => {
                error!(error = %other, "Request failed");
                Self::new(500, "internal", other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
