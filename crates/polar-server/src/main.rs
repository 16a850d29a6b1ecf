//! polar-dash HTTP Server
//!
//! Axum-based JSON backend for the Polar.sh dashboard. Each tab of the
//! dashboard maps to one route; responses carry a status line and the
//! rendered output.

mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use polar_api::{ClientConfig, CONNECTED_MESSAGE};

use crate::handlers::{
    connect, create_benefit, create_checkout, create_product, create_webhook_endpoint, get_order,
    get_organization, get_product, get_subscription, health_check, list_benefits, list_customers,
    list_orders, list_organizations, list_products, list_subscriptions, list_webhook_endpoints,
    preview_product,
};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & session
        .route("/health", get(health_check))
        .route("/api/connect", post(connect))

        // Catalog
        .route("/api/organizations", get(list_organizations))
        .route("/api/organizations/{id}", get(get_organization))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/preview", post(preview_product))
        .route("/api/products/{id}", get(get_product))

        // Sales
        .route("/api/checkouts", post(create_checkout))
        .route("/api/subscriptions", get(list_subscriptions))
        .route("/api/subscriptions/{id}", get(get_subscription))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/customers", get(list_customers))

        // Benefits & webhooks
        .route("/api/benefits", get(list_benefits).post(create_benefit))
        .route("/api/webhooks", get(list_webhook_endpoints).post(create_webhook_endpoint))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let state = AppState::default();

    // Auto-connect when a token is configured
    if let Some(config) = ClientConfig::from_env() {
        let message = state.session.connect_with(config).await;
        if message == CONNECTED_MESSAGE {
            tracing::info!("✓ {message}");
        } else {
            tracing::warn!("⚠ {message}");
        }
    } else {
        tracing::info!("POLAR_ACCESS_TOKEN not set - connect via POST /api/connect");
    }

    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:7860".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 polar-dash server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  POST /api/connect            - Connect with an access token");
    tracing::info!("  GET  /api/organizations      - List organizations");
    tracing::info!("  GET  /api/products           - List products");
    tracing::info!("  POST /api/products           - Create product");
    tracing::info!("  POST /api/products/preview   - Dry run product payload");
    tracing::info!("  POST /api/checkouts          - Create checkout");
    tracing::info!("  GET  /api/subscriptions      - List subscriptions");
    tracing::info!("  GET  /api/orders             - List orders");
    tracing::info!("  GET  /api/benefits           - List benefits");
    tracing::info!("  GET  /api/customers          - List customers");
    tracing::info!("  GET  /api/webhooks           - List webhook endpoints");

    axum::serve(listener, app).await?;

    Ok(())
}
