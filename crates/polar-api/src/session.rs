//! Dashboard Session
//!
//! Holds the client built from the last successful connect. The slot is
//! replaced wholesale; callers take an `Arc` snapshot and pass it on.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::{ClientConfig, Credentials, Environment};
use crate::error::{GatewayError, Result};
use crate::gateway::PolarClient;

pub const TOKEN_REQUIRED_MESSAGE: &str = "Access token is required";
pub const CONNECTED_MESSAGE: &str = "Connected to Polar";

/// Current connection, if any
#[derive(Debug, Default)]
pub struct Session {
    client: RwLock<Option<Arc<PolarClient>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect with a token and sandbox flag; returns a status message
    pub async fn connect(&self, access_token: &str, sandbox: bool) -> String {
        let credentials = Credentials::new(access_token.trim(), Environment::from_sandbox_flag(sandbox));
        self.connect_with(ClientConfig::new(credentials)).await
    }

    /// Build a client, probe it by listing organizations, and install it
    ///
    /// The previous client stays in place when the probe fails.
    pub async fn connect_with(&self, config: ClientConfig) -> String {
        if config.credentials.access_token.trim().is_empty() {
            return TOKEN_REQUIRED_MESSAGE.into();
        }

        let client = match PolarClient::new(config) {
            Ok(client) => client,
            Err(e) => return format!("Error initializing API: {e}"),
        };

        match client.list_organizations().await {
            Ok(_) => {
                tracing::info!(
                    environment = ?client.environment(),
                    base_url = %client.base_url(),
                    "Connected to Polar"
                );
                *self.client.write().await = Some(Arc::new(client));
                CONNECTED_MESSAGE.into()
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status_code(), "Polar connection probe failed");
                format!("Failed to connect: {e} | body: {}", e.body().unwrap_or("none"))
            }
        }
    }

    /// Snapshot of the current client
    pub async fn client(&self) -> Result<Arc<PolarClient>> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(GatewayError::NotConnected)
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}
