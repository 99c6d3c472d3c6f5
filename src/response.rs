//! The uniform result of every request.
//!
//! A [`Response`] is either what the upstream sent back or the synthetic
//! timeout response built when no attempt produced one. Callers inspect both
//! the same way.

use crate::error::TransportError;
use crate::Error;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;

/// Body of the synthetic timeout response.
pub const TIMEOUT_BODY: &str = r#"{"error":"timeout"}"#;

/// An HTTP response, real or synthetic.
///
/// # Examples
///
/// ```no_run
/// use cart_client::Client;
///
/// # async fn example() -> Result<(), cart_client::Error> {
/// let client = Client::builder().base_url("https://cart.local")?.build()?;
/// let response = client.get("/merchant/status").await;
///
/// println!("Status: {}", response.status);
/// println!("Attempts: {}", response.attempts);
/// println!("API version: {:?}", response.header("X-API-Version"));
///
/// if response.is_synthetic() {
///     println!("Upstream unavailable: {:?}", response.transport_error);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body.
    pub body: Bytes,

    /// The number of attempts made to produce this response.
    pub attempts: usize,

    /// Time from the first attempt until this response was returned,
    /// including backoff delays.
    pub latency: Duration,

    /// The transport failure this response stands in for.
    ///
    /// `Some` only on a synthetic timeout response built after a failed attempt.
    pub transport_error: Option<TransportError>,

    synthetic: bool,
}

impl Response {
    /// Wraps a response received from the network.
    pub fn from_http(response: http::Response<Bytes>, attempts: usize, latency: Duration) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
            attempts,
            latency,
            transport_error: None,
            synthetic: false,
        }
    }

    /// Builds the synthetic timeout response: status 504 with a JSON body of
    /// `{"error":"timeout"}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cart_client::{Response, TransportError};
    /// use std::time::Duration;
    ///
    /// let response = Response::timeout(
    ///     2,
    ///     Duration::from_millis(30),
    ///     Some(TransportError::connect("connection refused")),
    /// );
    ///
    /// assert_eq!(response.status_code(), 504);
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// assert_eq!(
    ///     response.json::<serde_json::Value>().unwrap()["error"],
    ///     "timeout"
    /// );
    /// ```
    pub fn timeout(attempts: usize, latency: Duration, error: Option<TransportError>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            headers,
            body: Bytes::from_static(TIMEOUT_BODY.as_bytes()),
            attempts,
            latency,
            transport_error: error,
            synthetic: true,
        }
    }

    /// Returns the status code as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns `true` for 2xx responses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns `true` if this response was fabricated by the client rather than
    /// received from the upstream.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name. Lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body if the body is
    /// not valid JSON for `T`.
    pub fn json<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                status = self.status.as_u16(),
                raw_response = %self.text(),
                "Failed to deserialize response"
            );

            Error::DeserializationFailed {
                raw_response: self.text().into_owned(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn received(status: u16, body: &'static str) -> Response {
        let response = http::Response::builder()
            .status(status)
            .header("X-API-Version", "v1")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        Response::from_http(response, 1, Duration::from_millis(5))
    }

    #[test]
    fn test_timeout_response_shape() {
        let response = Response::timeout(3, Duration::ZERO, None);
        assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.text(), TIMEOUT_BODY);
        assert_eq!(
            response.json::<Value>().unwrap(),
            serde_json::json!({"error": "timeout"})
        );
        assert!(response.was_retried());
        assert!(response.is_synthetic());
        assert!(response.transport_error.is_none());
    }

    #[test]
    fn test_timeout_response_keeps_transport_error() {
        let error = TransportError::connect("connection refused");
        let response = Response::timeout(1, Duration::ZERO, Some(error.clone()));
        assert!(response.is_synthetic());
        assert_eq!(response.transport_error, Some(error));
    }

    #[test]
    fn test_received_504_is_not_synthetic() {
        let response = received(504, TIMEOUT_BODY);
        assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
        assert!(!response.is_synthetic());
    }

    #[test]
    fn test_received_response_is_not_synthetic() {
        let response = received(200, r#"{"status":"ok"}"#);
        assert!(!response.is_synthetic());
        assert!(response.is_success());
        assert_eq!(response.header("x-api-version"), Some("v1"));
    }

    #[test]
    fn test_json_error_keeps_raw_body() {
        let response = received(502, "<html>bad gateway</html>");
        match response.json::<Value>() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "<html>bad gateway</html>");
                assert_eq!(status.as_u16(), 502);
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
    }
}
