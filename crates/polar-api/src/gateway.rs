//! Request Gateway
//!
//! One outbound call per invocation against the configured Polar base URL.
//! Transport failures, non-2xx responses and undecodable bodies all come back
//! as a [`GatewayError`]; nothing is retried or cached.

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::{ClientConfig, Environment};
use crate::error::{GatewayError, Result};

/// Supported HTTP verbs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(GatewayError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single call: verb, path, and optional query/body data
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub data: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Successful response: status plus decoded JSON body
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Join base URL and path with exactly one slash at the boundary
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Polar API client
///
/// Holds only the configuration captured at construction: base URL, auth
/// headers and timeout. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct PolarClient {
    http: reqwest::Client,
    base_url: String,
    environment: Environment,
}

impl PolarClient {
    /// Build a client from configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.credentials.access_token
        ))
        .map_err(|e| GatewayError::Config(format!("access token is not a valid header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            environment: config.credentials.environment,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Execute a call and return only the decoded body
    pub async fn request<B>(&self, method: Method, path: &str, data: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.execute(method, path, data).await.map(|r| r.body)
    }

    /// Execute a call with the verb given as text
    ///
    /// Unknown verbs fail before any network I/O.
    pub async fn request_raw(&self, method: &str, path: &str, data: Option<&Value>) -> Result<Value> {
        let method = method.parse::<Method>()?;
        self.request(method, path, data).await
    }

    /// Execute a prepared [`RequestDescriptor`]
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        self.execute(descriptor.method, &descriptor.path, descriptor.data.as_ref())
            .await
    }

    /// Execute a call, keeping the response status
    ///
    /// `GET` sends `data` as query parameters, `POST`/`PUT` as a JSON body and
    /// `DELETE` sends neither.
    pub async fn execute<B>(&self, method: Method, path: &str, data: Option<&B>) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "Polar API request");

        let builder = match method {
            Method::Get => {
                let builder = self.http.get(&url);
                match data {
                    Some(query) => builder.query(query),
                    None => builder,
                }
            }
            Method::Post | Method::Put => {
                let builder = if method == Method::Post {
                    self.http.post(&url)
                } else {
                    self.http.put(&url)
                };
                match data {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
            Method::Delete => self.http.delete(&url),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                return GatewayError::Config(format!("invalid request data: {e}"));
            }
            tracing::warn!(method = %method, url = %url, error = %e, "Polar API transport failure");
            GatewayError::Transport { message: e.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .error_for_status_ref()
                .err()
                .map_or_else(|| format!("HTTP status {status} for url ({url})"), |e| e.to_string());
            let body = response.text().await.ok().filter(|b| !b.is_empty());

            tracing::warn!(method = %method, url = %url, status = status.as_u16(), "Polar API error response");
            return Err(GatewayError::Api {
                message,
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport { message: e.to_string() })?;

        decode_body(status.as_u16(), text).map(|body| ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

impl std::fmt::Debug for PolarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolarClient")
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Decode a 2xx body. Empty bodies become `{"status": <code>}`.
fn decode_body(status: u16, text: String) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(json!({ "status": status }));
    }

    serde_json::from_str(&text).map_err(|e| GatewayError::Decode {
        message: format!("Response is not valid JSON: {e}"),
        status,
        body: text,
    })
}
