//! HTTP client with bounded retries.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    metadata::RequestMetadata,
    retry::{Decision, Outcome, RetryPolicy},
    transport::{ReqwestTransport, Transport, TransportRequest},
    Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Per-attempt timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable settings shared by every request a [`Client`] makes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address, without a trailing slash.
    pub base_url: String,

    /// Upper bound for each individual attempt.
    pub timeout: Duration,

    /// Retry count and fixed backoff.
    pub retry_policy: RetryPolicy,

    /// Headers sent with every request. Per-request headers win on conflict.
    pub default_headers: HeaderMap,
}

impl ClientConfig {
    /// Joins `path` onto the base URL with exactly one `/` in between.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), cart_client::Error> {
    /// let client = cart_client::Client::builder()
    ///     .base_url("https://cart.local/")?
    ///     .build()?;
    ///
    /// assert_eq!(client.config().url("/health"), "https://cart.local/health");
    /// assert_eq!(client.config().url("health"), "https://cart.local/health");
    /// # Ok(())
    /// # }
    /// ```
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// An HTTP client that retries transient failures and never fails a call.
///
/// Every request returns a [`Response`]. If the upstream cannot be reached
/// after all attempts, the response is a synthetic `504` with body
/// `{"error":"timeout"}` (see [`Response::timeout`]).
///
/// The client is cheap to clone and meant to be reused.
///
/// # Examples
///
/// ```no_run
/// use cart_client::Client;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), cart_client::Error> {
/// let client = Client::builder()
///     .base_url("https://cart.local")?
///     .timeout(Duration::from_secs(2))
///     .retries(1)
///     .retry_backoff(Duration::from_millis(100))
///     .build()?;
///
/// let health = client.get("/health").await;
/// println!("Health: {}", health.status);
///
/// let connected = client
///     .post("/merchant/connect", &json!({ "merchantId": "123" }))
///     .await?;
/// println!("Connect: {} after {} attempt(s)", connected.status, connected.attempts);
/// # Ok(())
/// # }
/// ```
pub struct Client<T = ReqwestTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    transport: T,
    config: ClientConfig,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Client {
    /// Creates a new `ClientBuilder` using the default `reqwest` transport.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Returns the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Executes a request, retrying transient failures.
    ///
    /// Statuses 429, 500, 502, 503 and 504 are retried while attempts remain;
    /// once they run out the last such response is returned as-is. Any other
    /// status is returned at once. Transport failures are retried the same way,
    /// and if the final attempt also fails the synthetic timeout response is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cart_client::{Client, RequestMetadata};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), cart_client::Error> {
    /// let client = Client::builder().base_url("https://cart.local")?.retries(1).build()?;
    ///
    /// let request = RequestMetadata::new(Method::POST, "/card-switch")
    ///     .with_header("Idempotency-Key", "idem-123")?
    ///     .with_json(&serde_json::json!({ "cardId": "abc" }))?;
    ///
    /// let response = client.call(request).await;
    /// println!("{} {}", response.status, response.text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, metadata: RequestMetadata) -> Response {
        let config = &self.inner.config;
        let policy = config.retry_policy;
        let url = config.url(&metadata.path);
        let headers = self.merge_headers(&metadata.headers);
        let body = metadata.body().cloned();

        let start_time = Instant::now();
        let total_attempts = policy.total_attempts();
        let mut last_response = None;

        for attempt in 0..total_attempts {
            let attempts_made = attempt + 1;

            tracing::debug!(
                method = %metadata.method,
                url = %url,
                attempt = attempts_made,
                "Executing HTTP request"
            );

            let request = TransportRequest {
                method: metadata.method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
                timeout: config.timeout,
            };

            let decision = match self.inner.transport.send(request).await {
                Ok(http_response) => {
                    let response =
                        Response::from_http(http_response, attempts_made, start_time.elapsed());

                    tracing::info!(
                        status = response.status_code(),
                        latency_ms = response.latency.as_millis(),
                        attempts = attempts_made,
                        "Received HTTP response"
                    );

                    let decision = policy.decide(attempt, Outcome::Responded(response.status));
                    if decision == Decision::Return {
                        return response;
                    }

                    tracing::warn!(
                        status = response.status_code(),
                        attempt = attempts_made,
                        method = %metadata.method,
                        path = %metadata.path,
                        "Retryable status received"
                    );
                    last_response = Some(response);
                    decision
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempts_made,
                        method = %metadata.method,
                        path = %metadata.path,
                        "Request failed"
                    );

                    match policy.decide(attempt, Outcome::Failed(&e)) {
                        Decision::GiveUp | Decision::Return => {
                            tracing::error!(
                                error = %e,
                                attempts = attempts_made,
                                "Upstream unavailable - returning timeout response"
                            );
                            return Response::timeout(
                                attempts_made,
                                start_time.elapsed(),
                                Some(e),
                            );
                        }
                        retry => retry,
                    }
                }
            };

            if let Decision::Retry { delay } = decision {
                if !delay.is_zero() {
                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        attempt = attempts_made,
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // Unreachable while total_attempts >= 1, which RetryPolicy guarantees.
        last_response
            .unwrap_or_else(|| Response::timeout(total_attempts, start_time.elapsed(), None))
    }

    fn merge_headers(&self, request_headers: &HeaderMap) -> HeaderMap {
        let mut headers = self.inner.config.default_headers.clone();
        for name in request_headers.keys() {
            headers.remove(name);
            for value in request_headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        headers
    }

    /// Makes a GET request to the specified path.
    pub async fn get(&self, path: impl Into<String>) -> Response {
        self.call(RequestMetadata::new(Method::GET, path)).await
    }

    /// Makes a GET request with extra headers.
    ///
    /// # Errors
    ///
    /// Returns an error if a header name or value is invalid. Network failures
    /// are reported through the returned [`Response`].
    pub async fn get_with_headers<K, V>(
        &self,
        path: impl Into<String>,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Response>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let metadata = RequestMetadata::new(Method::GET, path).with_headers(headers)?;
        Ok(self.call(metadata).await)
    }

    /// Makes a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized. Network failures are
    /// reported through the returned [`Response`].
    pub async fn post<B>(&self, path: impl Into<String>, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let metadata = RequestMetadata::new(Method::POST, path).with_json(body)?;
        Ok(self.call(metadata).await)
    }

    /// Makes a POST request with a JSON body and extra headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized or a header is invalid.
    pub async fn post_with_headers<B, K, V>(
        &self,
        path: impl Into<String>,
        headers: impl IntoIterator<Item = (K, V)>,
        body: &B,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let metadata = RequestMetadata::new(Method::POST, path)
            .with_headers(headers)?
            .with_json(body)?;
        Ok(self.call(metadata).await)
    }

    /// Makes a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub async fn put<B>(&self, path: impl Into<String>, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let metadata = RequestMetadata::new(Method::PUT, path).with_json(body)?;
        Ok(self.call(metadata).await)
    }

    /// Makes a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub async fn patch<B>(&self, path: impl Into<String>, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let metadata = RequestMetadata::new(Method::PATCH, path).with_json(body)?;
        Ok(self.call(metadata).await)
    }

    /// Makes a DELETE request to the specified path.
    pub async fn delete(&self, path: impl Into<String>) -> Response {
        self.call(RequestMetadata::new(Method::DELETE, path)).await
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use cart_client::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), cart_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://merchant.example")?
///     .timeout(Duration::from_secs(3))
///     .retries(2)
///     .retry_backoff(Duration::from_millis(250))
///     .default_header("User-Agent", "cart-tests/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<T = ReqwestTransport> {
    base_url: Option<String>,
    default_headers: HeaderMap,
    timeout: Duration,
    retry_policy: RetryPolicy,
    transport: T,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// Defaults: 5 second timeout, no retries, no backoff.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::none(),
            transport: ReqwestTransport::new(),
        }
    }
}

impl<T: Transport> ClientBuilder<T> {
    /// Sets the base URL for all requests. Trailing slashes are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        Url::parse(url)?;
        self.base_url = Some(url.trim_end_matches('/').to_string());
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a failed attempt is retried.
    pub fn retries(mut self, max_retries: usize) -> Self {
        self.retry_policy.max_retries = max_retries;
        self
    }

    /// Sets the fixed delay between attempts.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_policy.backoff = backoff;
        self
    }

    /// Sets retry count and backoff at once.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Replaces the transport used to send requests.
    pub fn transport<U: Transport>(self, transport: U) -> ClientBuilder<U> {
        ClientBuilder {
            base_url: self.base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            transport,
        }
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided.
    pub fn build(self) -> Result<Client<T>> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                config: ClientConfig {
                    base_url,
                    timeout: self.timeout,
                    retry_policy: self.retry_policy,
                    default_headers: self.default_headers,
                },
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
