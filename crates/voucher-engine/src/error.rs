use crate::config::ConfigError;
use crate::selection::{SelectionError, SourceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Source(SourceError),
    Selection(SelectionError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Source(err) => write!(f, "voucher source error: {}", err),
            AppError::Selection(err) => write!(f, "selection failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Source(err) => Some(err),
            AppError::Selection(err) => Some(err),
        }
    }
}

impl AppError {
    /// Process exit code: 2 when the run found no voucher, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Selection(err) if err.is_no_eligible() => 2,
            _ => 1,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Selection(SelectionError::NoEligibleVoucher) => StatusCode::NOT_FOUND,
            AppError::Selection(SelectionError::InvalidOrderAmount(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Source(_) | AppError::Selection(SelectionError::Source(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Selection(SelectionError::Cancelled)
            | AppError::Selection(SelectionError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SourceError> for AppError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<SelectionError> for AppError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_eligible_voucher_has_its_own_exit_code() {
        let err = AppError::from(SelectionError::NoEligibleVoucher);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(AppError::from(SelectionError::Cancelled).exit_code(), 1);
    }

    #[test]
    fn source_outage_maps_to_service_unavailable() {
        let err = AppError::from(SourceError::Unavailable("offline".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
