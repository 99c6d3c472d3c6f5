//! Error types.
//!
//! Network outcomes never surface as [`Error`]: the client turns every transport
//! failure into a [`Response`](crate::Response). This type only covers problems
//! that happen before a request is sent (configuration, request body
//! serialization) or after one is received (decoding the body).

use http::StatusCode;
use std::fmt;

/// The main error type of the crate.
///
/// # Examples
///
/// ```no_run
/// use cart_client::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().base_url("https://cart.local")?.build()?;
/// let response = client.get("/health").await;
///
/// match response.json::<serde_json::Value>() {
///     Ok(body) => println!("Body: {}", body),
///     Err(Error::DeserializationFailed { raw_response, status, .. }) => {
///         eprintln!("Status {} with non-JSON body: {}", status, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid configuration was provided.
    ///
    /// This covers a missing base URL as well as invalid header names or values.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid base URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to serialize the request body to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Failed to deserialize the response body into the expected type.
    ///
    /// The raw body and status are kept so contract failures can be debugged
    /// from the test output alone.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },
}

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failed network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The attempt exceeded the per-attempt timeout.
    Timeout,
    /// The connection could not be established (refused, reset, TLS failure).
    Connect,
    /// The host name could not be resolved.
    Dns,
    /// Anything else, including failures while reading the response body.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A network call that produced no HTTP response.
///
/// Returned by [`Transport`](crate::Transport) implementations. The client
/// retries on it and, once attempts run out, maps it onto the synthetic
/// timeout response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Transport error ({kind}): {message}")]
pub struct TransportError {
    /// What kind of failure occurred.
    pub kind: TransportErrorKind,
    /// Human-readable description from the underlying transport.
    pub message: String,
}

impl TransportError {
    /// Creates a new `TransportError`.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`TransportErrorKind::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Shorthand for a [`TransportErrorKind::Connect`] error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            if source_chain_mentions(&err, "dns error") {
                TransportErrorKind::Dns
            } else {
                TransportErrorKind::Connect
            }
        } else {
            TransportErrorKind::Other
        };

        Self::new(kind, err.to_string())
    }
}

fn source_chain_mentions(err: &(dyn std::error::Error + 'static), needle: &str) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = e.source();
    }
    false
}
