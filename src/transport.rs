//! The network capability the client depends on.
//!
//! [`Client`](crate::Client) never talks to `reqwest` directly. It hands each
//! attempt to a [`Transport`], which either produces a response or fails. Tests
//! can substitute a transport that replays scripted outcomes.

use crate::error::TransportError;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use std::future::Future;
use std::time::Duration;

/// One network attempt, fully resolved.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute request URL.
    pub url: String,
    /// Headers to send.
    pub headers: HeaderMap,
    /// JSON body to send, if any.
    pub body: Option<Bytes>,
    /// Upper bound for this attempt.
    pub timeout: Duration,
}

/// Sends a single HTTP request.
///
/// Implementations must enforce `request.timeout` themselves and report any
/// failure to obtain a complete response as a [`TransportError`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use cart_client::{Transport, TransportError, TransportRequest};
///
/// /// Answers every request with the same status.
/// struct Fixed(u16);
///
/// impl Transport for Fixed {
///     async fn send(
///         &self,
///         _request: TransportRequest,
///     ) -> Result<http::Response<Bytes>, TransportError> {
///         Ok(http::Response::builder()
///             .status(self.0)
///             .body(Bytes::new())
///             .expect("static response"))
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Performs the request.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<http::Response<Bytes>, TransportError>> + Send;
}

/// The default transport, backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing `reqwest` client.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<http::Response<Bytes>, TransportError> {
        let mut headers = request.headers;
        if request.body.is_some() {
            // A caller-supplied content type is kept as-is.
            headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
        }

        let mut builder = self
            .http_client
            .request(request.method, request.url.as_str())
            .headers(headers)
            .timeout(request.timeout);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut converted = http::Response::new(body);
        *converted.status_mut() = status;
        *converted.version_mut() = version;
        *converted.headers_mut() = headers;
        Ok(converted)
    }
}
