use std::sync::Arc;

use anyhow::Context;

use assetflow_payments::{MockGateway, PaymentGateway, StripeGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    assetflow_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let gateway: Arc<dyn PaymentGateway> = match std::env::var("STRIPE_SECRET_KEY") {
        Ok(key) => Arc::new(StripeGateway::new(key)),
        Err(_) => {
            tracing::warn!("STRIPE_SECRET_KEY not set; payment intents use the mock gateway");
            Arc::new(MockGateway)
        }
    };

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = assetflow_api::app::build_app(&jwt_secret, gateway);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
