//! Output Rendering
//!
//! Success payloads and error records are rendered as text the same way for
//! every dashboard action.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, GatewayError};
use crate::gateway::ApiResponse;

/// Two-space indented JSON; non-ASCII is kept as-is
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// `Error: <message> (status: <code>)`, plus the response body when present
pub fn format_error(err: &GatewayError) -> String {
    let status = err
        .status_code()
        .map_or_else(|| "n/a".to_string(), |s| s.to_string());
    let mut out = format!("Error: {err} (status: {status})");
    if let Some(body) = err.body().filter(|b| !b.is_empty()) {
        out.push_str("\nResponse body: ");
        out.push_str(body);
    }
    out
}

/// Render a gateway result
pub fn format_output(result: &Result<Value, GatewayError>) -> String {
    match result {
        Ok(value) => pretty_json(value),
        Err(err) => format_error(err),
    }
}

/// `"201 Created"` style line
pub fn status_line(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| status.to_string(), |reason| format!("{status} {reason}"))
}

/// Rendered result of one dashboard action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutput {
    /// Short status: HTTP status line, or the failure kind
    pub status: String,

    /// Pretty JSON or rendered error
    pub output: String,
}

impl ActionOutput {
    pub fn new(status: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            output: output.into(),
        }
    }

    /// Plain message with no payload, e.g. a connect status
    pub fn message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(message.clone(), message)
    }

    pub fn from_value(result: Result<Value, GatewayError>) -> Self {
        match result {
            Ok(value) => Self::new("OK", pretty_json(&value)),
            Err(err) => Self::from_gateway_error(&err),
        }
    }

    /// Render an action that returns the decoded body only
    pub fn from_action(result: Result<Value, DashboardError>) -> Self {
        match result {
            Ok(value) => Self::new("OK", pretty_json(&value)),
            Err(DashboardError::Validation(err)) => Self::message(err.to_string()),
            Err(DashboardError::Gateway(err)) => Self::from_gateway_error(&err),
        }
    }

    pub fn from_response(result: Result<ApiResponse, DashboardError>) -> Self {
        match result {
            Ok(response) => Self::new(status_line(response.status), pretty_json(&response.body)),
            Err(DashboardError::Validation(err)) => Self::message(err.to_string()),
            Err(DashboardError::Gateway(err)) => Self::from_gateway_error(&err),
        }
    }

    pub fn from_gateway_error(err: &GatewayError) -> Self {
        let status = match err {
            GatewayError::NotConnected => "Not connected".to_string(),
            GatewayError::Transport { .. } => "Request error".to_string(),
            GatewayError::Api { status, .. } | GatewayError::Decode { status, .. } => status_line(*status),
            GatewayError::Config(_) | GatewayError::UnsupportedMethod(_) => "Error".to_string(),
        };
        let output = match err {
            GatewayError::NotConnected => err.to_string(),
            _ => format_error(err),
        };
        Self::new(status, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NOT_CONNECTED_MESSAGE, ValidationError};
    use serde_json::json;

    #[test]
    fn test_pretty_json_keeps_unicode() {
        let out = pretty_json(&json!({ "name": "Kopi Susu ☕" }));
        assert_eq!(out, "{\n  \"name\": \"Kopi Susu ☕\"\n}");
    }

    #[test]
    fn test_format_error_with_body() {
        let err = GatewayError::Api {
            message: "HTTP status client error (422 Unprocessable Entity) for url (https://sandbox-api.polar.sh/v1/products/)".into(),
            status: 422,
            body: Some(r#"{"detail":[]}"#.into()),
        };
        let out = format_output(&Err(err));
        assert!(out.starts_with("Error: HTTP status client error (422"));
        assert!(out.contains("(status: 422)"));
        assert!(out.ends_with("\nResponse body: {\"detail\":[]}"));
    }

    #[test]
    fn test_format_error_without_status() {
        let err = GatewayError::Transport { message: "error sending request".into() };
        assert_eq!(format_error(&err), "Error: error sending request (status: n/a)");
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(201), "201 Created");
        assert_eq!(status_line(404), "404 Not Found");
        assert_eq!(status_line(599), "599");
    }

    #[test]
    fn test_action_output_variants() {
        let ok = ActionOutput::from_response(Ok(ApiResponse { status: 201, body: json!({ "id": "p" }) }));
        assert_eq!(ok.status, "201 Created");

        let invalid = ActionOutput::from_response(Err(ValidationError::NameTooShort.into()));
        assert_eq!(invalid.status, ValidationError::NameTooShort.to_string());
        assert_eq!(invalid.output, invalid.status);

        let offline = ActionOutput::from_value(Err(GatewayError::NotConnected));
        assert_eq!(offline.output, NOT_CONNECTED_MESSAGE);
    }

    #[test]
    fn test_from_action() {
        let ok = ActionOutput::from_action(Ok(json!({ "items": [] })));
        assert_eq!(ok.status, "OK");
        assert_eq!(ok.output, "{\n  \"items\": []\n}");

        let invalid = ActionOutput::from_action(Err(ValidationError::Required("URL").into()));
        assert_eq!(invalid.output, "URL is required");

        let missing = ActionOutput::from_action(Err(GatewayError::Api {
            message: "not found".into(),
            status: 404,
            body: None,
        }
        .into()));
        assert_eq!(missing.status, "404 Not Found");
        assert_eq!(missing.output, "Error: not found (status: 404)");
    }
}
