//! Polar Resources
//!
//! Thin wrappers over [`PolarClient::request`] for the routes the dashboard
//! uses, plus the form records that feed the write routes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{DashboardError, Result, ValidationError};
use crate::gateway::{ApiResponse, Method, PolarClient};
use crate::product::{PricingPlanInput, ProductPayload, build_product_payload};

/// Trimmed, non-blank value or a "`label` is required" error
pub fn require_id<'a>(label: &'static str, value: &'a str) -> std::result::Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Required(label))
    } else {
        Ok(value)
    }
}

/// Split a comma-separated list, dropping blank entries
pub fn parse_id_list(label: &'static str, raw: &str) -> std::result::Result<Vec<String>, ValidationError> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        Err(ValidationError::Required(label))
    } else {
        Ok(items)
    }
}

/// `organization_id` query for list routes; blank means no filter
fn org_filter(organization_id: Option<&str>) -> Option<Value> {
    organization_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| json!({ "organization_id": id }))
}

/// Checkout toggles shown on the form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutOptions {
    pub allow_discount_codes: bool,
    pub require_billing_address: bool,
    pub is_business_customer: bool,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            allow_discount_codes: true,
            require_billing_address: false,
            is_business_customer: false,
        }
    }
}

/// Body for `POST /checkouts/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub products: Vec<String>,
    pub success_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(flatten)]
    pub options: CheckoutOptions,
}

impl CheckoutRequest {
    pub fn from_form(
        product_ids: &str,
        success_url: &str,
        customer_email: Option<&str>,
        options: CheckoutOptions,
    ) -> std::result::Result<Self, ValidationError> {
        require_id("Product IDs", product_ids)?;
        let success_url = require_id("Success URL", success_url)?;
        let products = parse_id_list("At least one product ID", product_ids)?;

        Ok(Self {
            products,
            success_url: success_url.to_string(),
            customer_email: customer_email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            options,
        })
    }
}

/// Body for `POST /benefits/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitRequest {
    pub organization_id: String,
    #[serde(rename = "type")]
    pub benefit_type: String,
    pub description: String,
    pub properties: Value,
}

impl BenefitRequest {
    /// `properties_json` may be blank (empty object) but must parse otherwise
    pub fn from_form(
        organization_id: &str,
        benefit_type: &str,
        description: &str,
        properties_json: &str,
    ) -> std::result::Result<Self, ValidationError> {
        let organization_id = require_id("Organization ID", organization_id)?;
        let benefit_type = require_id("Benefit type", benefit_type)?;
        let description = require_id("Description", description)?;

        let properties = if properties_json.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(properties_json).map_err(|_| ValidationError::InvalidJson("properties"))?
        };

        Ok(Self {
            organization_id: organization_id.to_string(),
            benefit_type: benefit_type.to_string(),
            description: description.to_string(),
            properties,
        })
    }
}

/// Body for `POST /webhooks/endpoints/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEndpointRequest {
    pub organization_id: String,
    pub url: String,
    pub events: Vec<String>,
}

impl WebhookEndpointRequest {
    pub fn from_form(
        organization_id: &str,
        url: &str,
        events: &str,
    ) -> std::result::Result<Self, ValidationError> {
        let organization_id = require_id("Organization ID", organization_id)?;
        let url = require_id("URL", url)?;
        let events = parse_id_list("Events", events)?;

        Ok(Self {
            organization_id: organization_id.to_string(),
            url: url.to_string(),
            events,
        })
    }
}

impl PolarClient {
    pub async fn list_organizations(&self) -> Result<Value> {
        self.request::<Value>(Method::Get, "/organizations/", None).await
    }

    pub async fn get_organization(&self, organization_id: &str) -> Result<Value> {
        self.request::<Value>(Method::Get, &format!("/organizations/{organization_id}/"), None)
            .await
    }

    pub async fn list_products(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/products/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Value> {
        self.request::<Value>(Method::Get, &format!("/products/{product_id}/"), None)
            .await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<ApiResponse> {
        self.execute(Method::Post, "/products/", Some(payload)).await
    }

    /// Validate the form, then create the product
    ///
    /// Validation failures return before any request is sent.
    pub async fn create_product_from_input(
        &self,
        input: &PricingPlanInput,
    ) -> std::result::Result<ApiResponse, DashboardError> {
        let payload = build_product_payload(input)?;
        tracing::info!(name = %payload.name, prices = payload.prices.len(), "Creating product");
        Ok(self.create_product(&payload).await?)
    }

    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<Value> {
        self.request(Method::Post, "/checkouts/", Some(request)).await
    }

    pub async fn list_subscriptions(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/subscriptions/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Value> {
        self.request::<Value>(Method::Get, &format!("/subscriptions/{subscription_id}/"), None)
            .await
    }

    pub async fn list_orders(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/orders/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Value> {
        self.request::<Value>(Method::Get, &format!("/orders/{order_id}/"), None)
            .await
    }

    pub async fn list_benefits(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/benefits/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn create_benefit(&self, request: &BenefitRequest) -> Result<Value> {
        self.request(Method::Post, "/benefits/", Some(request)).await
    }

    pub async fn list_customers(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/customers/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn list_webhook_endpoints(&self, organization_id: Option<&str>) -> Result<Value> {
        self.request(Method::Get, "/webhooks/endpoints/", org_filter(organization_id).as_ref())
            .await
    }

    pub async fn create_webhook_endpoint(&self, request: &WebhookEndpointRequest) -> Result<Value> {
        self.request(Method::Post, "/webhooks/endpoints/", Some(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, Credentials, Environment};
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> PolarClient {
        let config = ClientConfig::new(Credentials::new("polar_at_test", Environment::Sandbox))
            .with_base_url(server.url());
        PolarClient::new(config).unwrap()
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(
            parse_id_list("ids", " a, b,,c ,").unwrap(),
            vec!["a".to_string(), "b".into(), "c".into()]
        );
        assert_eq!(parse_id_list("Events", " , ,"), Err(ValidationError::Required("Events")));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("Order ID", "  o1 "), Ok("o1"));
        assert_eq!(
            require_id("Order ID", "   ").unwrap_err().to_string(),
            "Order ID is required"
        );
    }

    #[test]
    fn test_org_filter() {
        assert_eq!(org_filter(None), None);
        assert_eq!(org_filter(Some("  ")), None);
        assert_eq!(org_filter(Some("org")), Some(json!({ "organization_id": "org" })));
    }

    #[test]
    fn test_checkout_from_form() {
        let request = CheckoutRequest::from_form(
            "p1, p2",
            "https://example.com/success",
            Some(" "),
            CheckoutOptions::default(),
        )
        .unwrap();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "products": ["p1", "p2"],
                "success_url": "https://example.com/success",
                "allow_discount_codes": true,
                "require_billing_address": false,
                "is_business_customer": false
            })
        );

        assert_eq!(
            CheckoutRequest::from_form(" , ", "https://example.com", None, CheckoutOptions::default()),
            Err(ValidationError::Required("At least one product ID"))
        );
        assert_eq!(
            CheckoutRequest::from_form("p1", "", None, CheckoutOptions::default()),
            Err(ValidationError::Required("Success URL"))
        );
    }

    #[test]
    fn test_benefit_from_form() {
        let request = BenefitRequest::from_form("org", "custom", "Discord access", "").unwrap();
        assert_eq!(request.properties, json!({}));
        assert_eq!(serde_json::to_value(&request).unwrap()["type"], "custom");

        assert_eq!(
            BenefitRequest::from_form("org", "custom", "Discord access", "{not json"),
            Err(ValidationError::InvalidJson("properties"))
        );
        assert_eq!(
            BenefitRequest::from_form("", "custom", "x", ""),
            Err(ValidationError::Required("Organization ID"))
        );
    }

    #[test]
    fn test_webhook_from_form() {
        let request = WebhookEndpointRequest::from_form(
            "org",
            "https://example.com/hook",
            "order.created, subscription.updated",
        )
        .unwrap();
        assert_eq!(request.events, vec!["order.created", "subscription.updated"]);
    }

    #[tokio::test]
    async fn test_list_products_with_org_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/products/")
            .match_query(Matcher::UrlEncoded("organization_id".into(), "org-9".into()))
            .with_status(200)
            .with_body(r#"{"items":[{"id":"p1"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let body = client.list_products(Some(" org-9 ")).await.unwrap();

        assert_eq!(body["items"][0]["id"], "p1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_subscription_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/subscriptions/sub_1/")
            .with_status(200)
            .with_body(r#"{"id":"sub_1","status":"active"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let body = client.get_subscription("sub_1").await.unwrap();
        assert_eq!(body["status"], "active");
    }

    #[tokio::test]
    async fn test_create_product_from_input_posts_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/products/")
            .match_body(Matcher::PartialJson(json!({
                "name": "Pro Plan",
                "recurring_interval": "month",
                "prices": [{ "amount_type": "fixed", "price_currency": "usd", "price_amount": 999 }]
            })))
            .with_status(201)
            .with_body(r#"{"id":"prod_1"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let input = PricingPlanInput {
            name: "Pro Plan".into(),
            plan: "month".into(),
            price_type: "fixed".into(),
            fixed_amount: Some(crate::product::AmountInput::Integer(999)),
            ..Default::default()
        };

        let response = client.create_product_from_input(&input).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body["id"], "prod_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_product_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/products/")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        let input = PricingPlanInput {
            name: "x".into(),
            ..Default::default()
        };

        let err = client.create_product_from_input(&input).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(ValidationError::NameTooShort)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_webhook_endpoint_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhooks/endpoints/")
            .match_body(Matcher::Json(json!({
                "organization_id": "org",
                "url": "https://example.com/hook",
                "events": ["order.created"]
            })))
            .with_status(201)
            .with_body(r#"{"id":"we_1"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let request = WebhookEndpointRequest::from_form("org", "https://example.com/hook", "order.created").unwrap();
        client.create_webhook_endpoint(&request).await.unwrap();
        mock.assert_async().await;
    }
}
