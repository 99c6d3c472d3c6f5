//! Smoke check against a live cart/merchant deployment.
//!
//! This example shows how to:
//! - Configure a client with retries and a fixed backoff
//! - Validate the health endpoint contract
//! - Send an idempotent POST and inspect the response metadata
//!
//! Run with: `cargo run --example merchant_smoke -- https://cart.local`

use cart_client::{contract, Client};
use serde_json::{json, Value};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("cart_client=debug,merchant_smoke=info")
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://cart.local".to_string());

    let client = Client::builder()
        .base_url(&base_url)?
        .timeout(Duration::from_secs(3))
        .retries(2)
        .retry_backoff(Duration::from_millis(250))
        .default_header("User-Agent", "cart-smoke/0.1")?
        .build()?;

    println!("=== Health ===");
    let health = client.get("/health").await;
    println!("Status: {} ({} attempt(s))", health.status, health.attempts);
    match health.json::<Value>() {
        Ok(body) => match contract::validate_health_response(&body) {
            Ok(()) => println!("Health contract: ok"),
            Err(e) => println!("Health contract violated: {}", e),
        },
        Err(e) => println!("Health body is not JSON: {}", e),
    }
    println!();

    println!("=== Merchant connect ===");
    let response = client
        .post_with_headers(
            "/merchant/connect",
            [("Idempotency-Key", "smoke-connect-1")],
            &json!({ "merchantId": "123" }),
        )
        .await?;

    println!("Status: {}", response.status);
    println!("Latency: {:?}", response.latency);
    println!("Was retried: {}", response.was_retried());
    println!("API version: {:?}", response.header("X-API-Version"));
    if let Some(error) = &response.transport_error {
        println!("Upstream unavailable: {}", error);
    }
    println!("Body: {}", response.text());

    Ok(())
}
