//! Error Types
//!
//! Gateway failures and product validation failures are kept apart so callers
//! can tell "the API said no" from "the form was wrong" without string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for gateway calls
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Message shown when an operation runs before `connect`
pub const NOT_CONNECTED_MESSAGE: &str = "Please initialize API connection first";

/// Request gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credentials have been set for this session
    #[error("Please initialize API connection first")]
    NotConnected,

    /// Client could not be built from the given configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Verb outside the supported set; no request was sent
    #[error("Unsupported method {0}")]
    UnsupportedMethod(String),

    /// DNS, connect, or timeout failure; no response received
    #[error("{message}")]
    Transport { message: String },

    /// Response received with a non-2xx status
    #[error("{message}")]
    Api {
        message: String,
        status: u16,
        body: Option<String>,
    },

    /// 2xx response whose body is not valid JSON
    #[error("{message}")]
    Decode {
        message: String,
        status: u16,
        body: String,
    },
}

impl GatewayError {
    /// HTTP status, when a response was received
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response text, when a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => body.as_deref(),
            Self::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Flatten into the structured record rendered by the dashboard
    pub fn record(&self) -> ErrorRecord {
        ErrorRecord {
            error: self.to_string(),
            status_code: self.status_code(),
            body: self.body().map(str::to_string),
        }
    }
}

/// Structured error record: message, optional status, optional raw body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub status_code: Option<u16>,
    pub body: Option<String>,
}

/// Product form validation failures, one per rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name too short: at least 3 characters required")]
    NameTooShort,

    #[error("invalid plan '{0}' (expected one_time | month | year)")]
    InvalidPlan(String),

    #[error("invalid price type '{0}' (expected fixed | custom | free)")]
    InvalidPriceType(String),

    #[error("fixed price (cents) is required and must be at least 50")]
    InvalidFixedAmount,

    #[error("custom price {0} is not a valid amount")]
    InvalidCustomAmount(&'static str),

    #[error("custom price {0} must be at least 50 when supplied")]
    CustomAmountTooLow(&'static str),

    #[error("custom price minimum ({minimum}) must not exceed maximum ({maximum})")]
    CustomMinExceedsMax { minimum: i64, maximum: i64 },

    #[error("one-time products cannot have a metered price")]
    MeteredOnOneTime,

    #[error("meter_id must be a valid UUID")]
    InvalidMeterId,

    #[error("unit_amount (cents) is required for metered pricing")]
    MissingUnitAmount,

    #[error("cap_amount must be a non-negative integer")]
    InvalidCapAmount,

    #[error("invalid organization id: must be a valid UUID")]
    InvalidOrganizationId,

    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid JSON in {0} field")]
    InvalidJson(&'static str),
}

/// Errors from a dashboard action that validates before calling the API
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_record() {
        let err = GatewayError::Api {
            message: "HTTP status client error (404 Not Found)".into(),
            status: 404,
            body: Some(r#"{"detail":"Not found"}"#.into()),
        };
        let record = err.record();
        assert_eq!(record.status_code, Some(404));
        assert_eq!(record.body.as_deref(), Some(r#"{"detail":"Not found"}"#));
        assert!(record.error.contains("404"));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = GatewayError::Transport { message: "connection refused".into() };
        assert_eq!(err.status_code(), None);
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_not_connected_message() {
        assert_eq!(GatewayError::NotConnected.to_string(), NOT_CONNECTED_MESSAGE);
    }
}
