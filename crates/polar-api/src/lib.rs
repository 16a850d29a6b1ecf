//! # polar-api
//!
//! Polar.sh API access for the polar-dash dashboard.
//!
//! ## Components
//!
//! ```text
//! ┌──────────────┐   ProductPayload   ┌──────────────┐   HTTPS + Bearer   ┌─────────────┐
//! │ Product      │───────────────────▶│ PolarClient  │───────────────────▶│  Polar API  │
//! │ Builder      │                    │ (gateway)    │◀───────────────────│  sandbox /  │
//! │ (pure)       │                    │              │   JSON / error     │  production │
//! └──────────────┘                    └──────────────┘                    └─────────────┘
//! ```
//!
//! - **Product builder**: validates raw form fields and produces a
//!   [`ProductPayload`], or a [`ValidationError`] naming the broken rule.
//!   No I/O.
//! - **Gateway**: [`PolarClient`] sends one request per call and folds
//!   transport failures, non-2xx statuses and bad JSON into [`GatewayError`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polar_api::{ClientConfig, Credentials, Environment, PolarClient, PricingPlanInput};
//!
//! let client = PolarClient::new(ClientConfig::new(Credentials::new(
//!     "polar_at_xxx",
//!     Environment::Sandbox,
//! )))?;
//!
//! let input = PricingPlanInput {
//!     name: "Pro Plan".into(),
//!     plan: "month".into(),
//!     price_type: "fixed".into(),
//!     fixed_amount: Some(999.into()),
//!     ..Default::default()
//! };
//!
//! let created = client.create_product_from_input(&input).await?;
//! println!("{}", polar_api::pretty_json(&created.body));
//! ```

mod config;
mod error;
mod format;
mod gateway;
mod product;
mod resources;
mod session;

pub use config::{ClientConfig, Credentials, DEFAULT_TIMEOUT_SECS, Environment};
pub use error::{DashboardError, ErrorRecord, GatewayError, NOT_CONNECTED_MESSAGE, Result, ValidationError};
pub use format::{ActionOutput, format_error, format_output, pretty_json, status_line};
pub use gateway::{ApiResponse, Method, PolarClient, RequestDescriptor, join_url};
pub use product::{
    AmountInput, Currency, MIN_NAME_LEN, MIN_PRICE_CENTS, Plan, PriceSpec, PriceType, PricingPlanInput,
    ProductPayload, RecurringInterval, build_product_payload, is_uuid,
};
pub use resources::{
    BenefitRequest, CheckoutOptions, CheckoutRequest, WebhookEndpointRequest, parse_id_list, require_id,
};
pub use session::{CONNECTED_MESSAGE, Session, TOKEN_REQUIRED_MESSAGE};
