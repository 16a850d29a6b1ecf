//! HTTP Handlers
//!
//! One handler per dashboard action. Every action renders to an
//! [`ActionOutput`]; API and validation failures are reported in the body,
//! not as HTTP errors, so the frontend can show them inline.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use polar_api::{
    ActionOutput, BenefitRequest, CheckoutOptions, CheckoutRequest, DashboardError, Environment,
    PolarClient, PricingPlanInput, WebhookEndpointRequest, build_product_payload, pretty_json,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connected: bool,
}

const fn default_sandbox() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub access_token: String,
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

/// Optional organization filter for list routes
#[derive(Debug, Default, Deserialize)]
pub struct OrgQuery {
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    /// Comma-separated product ids
    pub product_ids: String,
    pub success_url: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(flatten)]
    pub options: CheckoutOptions,
}

#[derive(Debug, Deserialize)]
pub struct BenefitForm {
    pub organization_id: String,
    pub benefit_type: String,
    pub description: String,
    /// JSON object as text; blank means `{}`
    #[serde(default)]
    pub properties: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    pub organization_id: String,
    pub url: String,
    /// Comma-separated event names
    pub events: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub status: String,
    pub payload: String,
    pub curl: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Run an action against the connected client, or report "not connected"
async fn run<F, Fut>(state: &AppState, action: F) -> Json<ActionOutput>
where
    F: FnOnce(Arc<PolarClient>) -> Fut,
    Fut: Future<Output = Result<Value, DashboardError>>,
{
    let output = match state.session.client().await {
        Ok(client) => ActionOutput::from_action(action(client).await),
        Err(err) => ActionOutput::from_gateway_error(&err),
    };
    Json(output)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connected: state.session.is_connected().await,
    })
}

/// Connect with an access token
pub async fn connect(State(state): State<AppState>, Json(payload): Json<ConnectRequest>) -> Json<ActionOutput> {
    let message = state.session.connect(&payload.access_token, payload.sandbox).await;
    Json(ActionOutput::message(message))
}

pub async fn list_organizations(State(state): State<AppState>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client.list_organizations().await.map_err(DashboardError::from)
    })
    .await
}

pub async fn get_organization(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client.get_organization(&id).await.map_err(DashboardError::from)
    })
    .await
}

pub async fn list_products(State(state): State<AppState>, Query(query): Query<OrgQuery>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_products(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client.get_product(&id).await.map_err(DashboardError::from)
    })
    .await
}

/// Validate the product form and create the product
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<PricingPlanInput>,
) -> Json<ActionOutput> {
    let client = match state.session.client().await {
        Ok(client) => client,
        Err(err) => return Json(ActionOutput::from_gateway_error(&err)),
    };

    let result = client.create_product_from_input(&input).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Product creation failed");
    }
    Json(ActionOutput::from_response(result))
}

/// Build the product payload and render it without sending anything
pub async fn preview_product(
    State(state): State<AppState>,
    Json(input): Json<PricingPlanInput>,
) -> Json<PreviewResponse> {
    let payload = match build_product_payload(&input) {
        Ok(payload) => payload,
        Err(e) => {
            return Json(PreviewResponse {
                status: e.to_string(),
                payload: String::new(),
                curl: String::new(),
            });
        }
    };

    let base_url = match state.session.client().await {
        Ok(client) => client.base_url().to_string(),
        Err(_) => Environment::Sandbox.base_url().to_string(),
    };

    Json(PreviewResponse {
        status: "Dry run: no request sent".into(),
        payload: pretty_json(&payload),
        curl: payload.to_curl(&base_url).unwrap_or_default(),
    })
}

pub async fn create_checkout(State(state): State<AppState>, Json(form): Json<CheckoutForm>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        let request = CheckoutRequest::from_form(
            &form.product_ids,
            &form.success_url,
            form.customer_email.as_deref(),
            form.options,
        )?;
        Ok::<_, DashboardError>(client.create_checkout(&request).await?)
    })
    .await
}

pub async fn list_subscriptions(State(state): State<AppState>, Query(query): Query<OrgQuery>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_subscriptions(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn get_subscription(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client.get_subscription(&id).await.map_err(DashboardError::from)
    })
    .await
}

pub async fn list_orders(State(state): State<AppState>, Query(query): Query<OrgQuery>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_orders(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client.get_order(&id).await.map_err(DashboardError::from)
    })
    .await
}

pub async fn list_benefits(State(state): State<AppState>, Query(query): Query<OrgQuery>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_benefits(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn create_benefit(State(state): State<AppState>, Json(form): Json<BenefitForm>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        let request = BenefitRequest::from_form(
            &form.organization_id,
            &form.benefit_type,
            &form.description,
            &form.properties,
        )?;
        Ok::<_, DashboardError>(client.create_benefit(&request).await?)
    })
    .await
}

pub async fn list_customers(State(state): State<AppState>, Query(query): Query<OrgQuery>) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_customers(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn list_webhook_endpoints(
    State(state): State<AppState>,
    Query(query): Query<OrgQuery>,
) -> Json<ActionOutput> {
    run(&state, |client| async move {
        client
            .list_webhook_endpoints(query.organization_id.as_deref())
            .await
            .map_err(DashboardError::from)
    })
    .await
}

pub async fn create_webhook_endpoint(
    State(state): State<AppState>,
    Json(form): Json<WebhookForm>,
) -> Json<ActionOutput> {
    run(&state, |client| async move {
        let request = WebhookEndpointRequest::from_form(&form.organization_id, &form.url, &form.events)?;
        Ok::<_, DashboardError>(client.create_webhook_endpoint(&request).await?)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use polar_api::{ClientConfig, Credentials, NOT_CONNECTED_MESSAGE, TOKEN_REQUIRED_MESSAGE};

    async fn connected_state(server: &mockito::ServerGuard) -> AppState {
        let state = AppState::default();
        let config = ClientConfig::new(Credentials::new("polar_at_test", Environment::Sandbox))
            .with_base_url(server.url());
        state.session.connect_with(config).await;
        state
    }

    #[tokio::test]
    async fn test_health_reports_disconnected() {
        let Json(health) = health_check(State(AppState::default())).await;
        assert_eq!(health.status, "healthy");
        assert!(!health.connected);
    }

    #[tokio::test]
    async fn test_actions_require_connection() {
        let state = AppState::default();

        let Json(out) = list_organizations(State(state.clone())).await;
        assert_eq!(out.output, NOT_CONNECTED_MESSAGE);

        // Connection is checked before the form is validated.
        let form = CheckoutForm {
            product_ids: String::new(),
            success_url: String::new(),
            customer_email: None,
            options: CheckoutOptions::default(),
        };
        let Json(out) = create_checkout(State(state), Json(form)).await;
        assert_eq!(out.output, NOT_CONNECTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_connect_requires_token() {
        let request = ConnectRequest { access_token: String::new(), sandbox: true };
        let Json(out) = connect(State(AppState::default()), Json(request)).await;
        assert_eq!(out.output, TOKEN_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_preview_without_connection_uses_sandbox() {
        let input = PricingPlanInput {
            name: "Starter".into(),
            plan: "one_time".into(),
            price_type: "free".into(),
            ..Default::default()
        };
        let Json(preview) = preview_product(State(AppState::default()), Json(input)).await;
        assert!(preview.curl.contains("https://sandbox-api.polar.sh/v1/products/"));
        assert!(preview.payload.contains("\"amount_type\": \"free\""));
    }

    #[tokio::test]
    async fn test_preview_reports_validation_error() {
        let input = PricingPlanInput { name: "ab".into(), ..Default::default() };
        let Json(preview) = preview_product(State(AppState::default()), Json(input)).await;
        assert!(preview.status.starts_with("name too short"));
        assert!(preview.curl.is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_when_connected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/organizations/")
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/orders/")
            .with_status(200)
            .with_body(r#"{"items":[{"id":"ord_1"}]}"#)
            .create_async()
            .await;

        let state = connected_state(&server).await;
        let Json(out) = list_orders(State(state), Query(OrgQuery::default())).await;

        assert_eq!(out.status, "OK");
        assert!(out.output.contains("ord_1"));
    }

    #[tokio::test]
    async fn test_benefit_form_error_rendered() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/organizations/")
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;

        let state = connected_state(&server).await;
        let form = BenefitForm {
            organization_id: "org".into(),
            benefit_type: "custom".into(),
            description: "Perk".into(),
            properties: "{oops".into(),
        };
        let Json(out) = create_benefit(State(state), Json(form)).await;
        assert_eq!(out.output, "Invalid JSON in properties field");
    }

    #[tokio::test]
    async fn test_create_product_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/organizations/")
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/products/")
            .with_status(422)
            .with_body(r#"{"detail":"bad price"}"#)
            .create_async()
            .await;

        let state = connected_state(&server).await;
        let input = PricingPlanInput {
            name: "Pro Plan".into(),
            plan: "month".into(),
            price_type: "fixed".into(),
            fixed_amount: Some(polar_api::AmountInput::Integer(999)),
            ..Default::default()
        };
        let Json(out) = create_product(State(state), Json(input)).await;

        assert_eq!(out.status, "422 Unprocessable Entity");
        assert!(out.output.ends_with(r#"Response body: {"detail":"bad price"}"#));
    }
}
