//! HTTP/1.x response builder and wire serialization.
//!
//! Provides a fluent builder API for constructing HTTP responses and
//! serializing them to a byte buffer for transmission over TCP.

use bytes::{BufMut, BytesMut};

use super::{Headers, StatusCode};

/// Body of the built-in response sent when no route matches.
pub const NOT_FOUND_BODY: &str = "<h1>Not Found</h1>";

/// An HTTP response, ready to be serialized and sent.
///
/// Serialization writes exactly what the response holds: the status line,
/// the headers, a blank line and the body. No `Content-Length`, `Connection`
/// or `Content-Type` header is added on the handler's behalf.
///
/// # Examples
///
/// ```
/// use routeline::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::OK)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.into_bytes();
/// assert_eq!(
///     &bytes[..],
///     b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"status\":\"ok\"}"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    status_text: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status, no headers and an empty body.
    ///
    /// The reason phrase is left empty and resolved from the status registry
    /// at serialization time.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            status_text: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// The fallback response for requests that match no route.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .status_text("Not Found")
            .header("Content-Type", "text/html")
            .body(NOT_FOUND_BODY)
    }

    /// Overrides the reason phrase written on the status line.
    #[must_use]
    pub fn status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Sets a response header. Setting the same name twice keeps the last value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason phrase that will be written on the status line.
    ///
    /// An explicitly set phrase wins; otherwise the registry's canonical
    /// phrase is used, or an empty string for codes it does not know.
    pub fn reason(&self) -> &str {
        if self.status_text.is_empty() {
            self.status.canonical_reason().unwrap_or("")
        } else {
            &self.status_text
        }
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the response body.
    pub fn body_ref(&self) -> &[u8] {
        &self.body
    }

    /// Serializes the response into a `BytesMut` buffer using HTTP/1.1 wire format.
    pub fn into_bytes(self) -> BytesMut {
        let estimated_size = 64 + self.headers.len() * 48 + self.body.len();
        let mut buf = BytesMut::with_capacity(estimated_size);

        // Status line
        buf.put_slice(b"HTTP/1.1 ");
        buf.put_slice(self.status.as_u16().to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.reason().as_bytes());
        buf.put_slice(b"\r\n");

        // Headers, each as `name: value\r\n`
        buf.put_slice(self.headers.to_string().as_bytes());

        // Header/body separator
        buf.put_slice(b"\r\n");

        if !self.body.is_empty() {
            buf.put_slice(&self.body);
        }

        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}
