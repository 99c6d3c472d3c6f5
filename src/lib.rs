//! # cart-client - a retrying HTTP client for API tests
//!
//! `cart-client` drives contract, integration and smoke tests against external
//! merchant APIs. It wraps `reqwest` with bounded retries and turns network
//! failure into a controlled response instead of an error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cart_client::{contract, Client};
//! use serde_json::{json, Value};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .base_url("https://cart.local")?
//!         .timeout(Duration::from_secs(2))
//!         .retries(1)
//!         .retry_backoff(Duration::from_millis(100))
//!         .build()?;
//!
//!     // Health check plus contract validation
//!     let health = client.get("/health").await;
//!     assert_eq!(health.status_code(), 200);
//!     contract::validate_health_response(&health.json::<Value>()?)?;
//!
//!     // Idempotent POST
//!     let switched = client
//!         .post_with_headers(
//!             "/card-switch",
//!             [("Idempotency-Key", "idem-123")],
//!             &json!({ "cardId": "abc" }),
//!         )
//!         .await?;
//!     println!("{} after {} attempt(s)", switched.status, switched.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Retry behavior
//!
//! - Statuses 429, 500, 502, 503 and 504 are retried while attempts remain.
//!   When attempts run out the last of them is returned unchanged.
//! - Every other status is returned on the attempt that produced it.
//! - Transport failures (timeouts, refused connections, DNS errors) are retried
//!   too. If the final attempt fails, the client returns a synthetic `504`
//!   with body `{"error":"timeout"}`.
//! - The delay between attempts is fixed and never applied after the last one.
//!
//! ## Transports
//!
//! Requests go through the [`Transport`] trait. [`ReqwestTransport`] is the
//! default; any implementation can be plugged in with
//! [`ClientBuilder::transport`], which is how scripted test doubles replace
//! the network.

mod client;
pub mod contract;
mod error;
pub mod metadata;
mod response;
pub mod retry;
mod transport;

pub use client::{Client, ClientBuilder, ClientConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use metadata::RequestMetadata;
pub use response::{Response, TIMEOUT_BODY};
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport, TransportRequest};
