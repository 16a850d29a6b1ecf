//! Credentials and Client Configuration

use serde::{Deserialize, Serialize};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Which Polar deployment to talk to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub const fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox { Self::Sandbox } else { Self::Production }
    }

    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox-api.polar.sh/v1",
            Self::Production => "https://api.polar.sh/v1",
        }
    }
}

/// Bearer token plus the environment it belongs to
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub environment: Environment,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, environment: Environment) -> Self {
        Self {
            access_token: access_token.into(),
            environment,
        }
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"***")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Gateway configuration captured at client construction
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub credentials: Credentials,

    /// Overrides the environment's base URL (tests, proxies)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `POLAR_ACCESS_TOKEN`, `POLAR_SANDBOX`, `POLAR_BASE_URL` and
    /// `POLAR_TIMEOUT_SECS`. Returns `None` when no token is set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("POLAR_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        let sandbox = std::env::var("POLAR_SANDBOX")
            .ok()
            .map_or(true, |v| parse_flag(&v));
        let timeout_secs = std::env::var("POLAR_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            credentials: Credentials::new(token.trim(), Environment::from_sandbox_flag(sandbox)),
            base_url: base_url_override(std::env::var("POLAR_BASE_URL").ok()),
            timeout_secs,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.credentials.environment.base_url())
    }
}

/// `POLAR_BASE_URL` value; blank means unset
fn base_url_override(raw: Option<String>) -> Option<String> {
    raw.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
