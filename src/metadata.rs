//! Request descriptors.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// Everything needed to describe a single logical request.
///
/// A request may carry an already-serialized JSON payload, a structured body,
/// or both. When both are present the structured body is the one sent.
///
/// # Examples
///
/// ```
/// use cart_client::RequestMetadata;
/// use http::Method;
/// use serde_json::json;
///
/// # fn main() -> Result<(), cart_client::Error> {
/// let request = RequestMetadata::new(Method::POST, "/card-switch")
///     .with_header("Idempotency-Key", "idem-123")?
///     .with_json(&json!({ "cardId": "abc" }))?;
///
/// assert_eq!(request.body().unwrap().as_ref(), br#"{"cardId":"abc"}"#);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The request path, joined onto the client's base URL.
    pub path: String,

    /// Headers for this request.
    pub headers: HeaderMap,

    payload: Option<Bytes>,
    json: Option<Bytes>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            payload: None,
            json: None,
        }
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds several headers to the request.
    ///
    /// # Errors
    ///
    /// Returns an error on the first invalid header name or value.
    pub fn with_headers<K, V>(
        self,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, crate::Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .try_fold(self, |request, (name, value)| request.with_header(name, value))
    }

    /// Sets an already-serialized JSON payload.
    ///
    /// Ignored if a structured body is also set with [`with_json`](Self::with_json).
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Sets a structured body, serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`](crate::Error::SerializationFailed)
    /// if `body` cannot be serialized.
    pub fn with_json<T>(mut self, body: &T) -> Result<Self, crate::Error>
    where
        T: Serialize + ?Sized,
    {
        let json =
            serde_json::to_vec(body).map_err(|e| crate::Error::SerializationFailed(e.to_string()))?;
        self.json = Some(Bytes::from(json));
        Ok(self)
    }

    /// Returns the body that will be sent, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.json.as_ref().or(self.payload.as_ref())
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}
