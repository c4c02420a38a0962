//! HTTP/1.x request parsing.
//!
//! A request is read line by line from an [`AsyncBufRead`] source: one request
//! line, a header block terminated by an empty line, then an optional body whose
//! length is taken from `Content-Length`.

use std::str;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::{Headers, Method};

/// Header that declares the body length. Matched exactly as received.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Size caps applied while reading one request.
///
/// `max_head_size` bounds the request line and header block together,
/// terminators included. `max_body_size` bounds the declared `Content-Length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_head_size: usize,
    pub max_body_size: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_head_size: 8 * 1024 * 1024,
            max_body_size: 8 * 1024 * 1024,
        }
    }
}

/// Errors that can occur while reading an HTTP request off the wire.
///
/// Every variant is fatal to the connection it occurred on.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("connection closed before a request line was received")]
    ConnectionClosed,

    #[error("malformed request line: {line:?}")]
    MalformedRequestLine { line: String },

    #[error("request line or header is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid Content-Length value: {value:?}")]
    InvalidContentLength { value: String },

    #[error("request line and headers exceed the maximum of {max} bytes")]
    HeadersTooLarge { max: usize },

    #[error("declared body of {length} bytes exceeds the maximum of {max} bytes")]
    BodyTooLarge { length: usize, max: usize },

    #[error("body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: usize, received: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully parsed HTTP request.
///
/// Produced once per connection by [`Request::read_from`], or assembled by hand
/// with [`Request::new`] and the builder methods.
///
/// # Examples
///
/// ```
/// use routeline::http::{Method, Request, request::RequestLimits};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut raw: &[u8] = b"POST /api/data HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
/// let request = Request::read_from(&mut raw, RequestLimits::default()).await.unwrap();
///
/// assert_eq!(request.method(), &Method::Post);
/// assert_eq!(request.path(), "/api/data");
/// assert_eq!(request.headers().get("Content-Length"), Some("5"));
/// assert_eq!(&request.body()[..], b"hello");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Creates a request with no headers, an empty body and version `HTTP/1.1`.
    pub fn new(method: impl Into<Method>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            version: "HTTP/1.1".to_owned(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Sets a header (last write wins).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Reads exactly one request from `reader`.
    ///
    /// Lines may end in CRLF or a bare LF. Header lines without a colon are
    /// skipped. End of stream inside the header block ends the block. When a
    /// `Content-Length` header is present the body is read until that many
    /// bytes have arrived, however the transport fragments them.
    ///
    /// # Errors
    ///
    /// - [`ParseError::ConnectionClosed`]: the stream ended before any request line.
    /// - [`ParseError::MalformedRequestLine`]: the request line does not split into
    ///   exactly three space-separated tokens, the method is empty, or the path does
    ///   not start with `/`.
    /// - [`ParseError::InvalidUtf8`]: a line is not valid UTF-8.
    /// - [`ParseError::HeadersTooLarge`]: the request line and headers exceed
    ///   `limits.max_head_size` bytes.
    /// - [`ParseError::InvalidContentLength`]: `Content-Length` is not a non-negative integer.
    /// - [`ParseError::BodyTooLarge`]: `Content-Length` exceeds `limits.max_body_size`.
    /// - [`ParseError::IncompleteBody`]: the stream ended before the full body arrived.
    /// - [`ParseError::Io`]: the underlying read failed.
    pub async fn read_from<R>(reader: &mut R, limits: RequestLimits) -> Result<Self, ParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::with_capacity(128);
        let mut head = HeadBudget {
            remaining: limits.max_head_size,
            max: limits.max_head_size,
        };

        let request_line = read_line(reader, &mut line, &mut head)
            .await?
            .ok_or(ParseError::ConnectionClosed)?;
        let (method, path, version) = parse_request_line(&request_line)?;

        let mut headers = Headers::new();
        while let Some(header_line) = read_line(reader, &mut line, &mut head).await? {
            if header_line.is_empty() {
                break;
            }
            if let Some((name, value)) = header_line.split_once(':') {
                headers.insert(name.trim(), value.trim());
            }
        }

        let body = match declared_length(&headers)? {
            Some(length) if length > limits.max_body_size => {
                return Err(ParseError::BodyTooLarge {
                    length,
                    max: limits.max_body_size,
                });
            }
            Some(length) => read_body(reader, length).await?,
            None => Bytes::new(),
        };

        Ok(Self {
            method,
            path,
            version,
            headers,
            body,
        })
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path exactly as it appeared on the request line.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the protocol version token, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `Content-Length` header parsed as a `usize`, if present and valid.
    pub fn content_length(&self) -> Option<usize> {
        declared_length(&self.headers).ok().flatten()
    }

    /// Deserializes the body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body)
    }
}

// Bytes of request line and headers still allowed on this request.
struct HeadBudget {
    remaining: usize,
    max: usize,
}

// Reads one line into `buf`, stripping the LF or CRLF terminator.
// Returns `None` at end of stream. A final line without a terminator is returned as-is.
// Never reads past the head budget.
async fn read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    head: &mut HeadBudget,
) -> Result<Option<String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(head.remaining as u64)
        .read_until(b'\n', buf)
        .await?;
    head.remaining -= read;

    if head.remaining == 0 && buf.last() != Some(&b'\n') {
        return Err(ParseError::HeadersTooLarge { max: head.max });
    }
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    let line = str::from_utf8(buf).map_err(|_| ParseError::InvalidUtf8)?;
    Ok(Some(line.to_owned()))
}

fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let mut tokens = line.split(' ');
    match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some(method), Some(path), Some(version), None)
            if !method.is_empty() && path.starts_with('/') =>
        {
            Ok((Method::from(method), path.to_owned(), version.to_owned()))
        }
        _ => Err(ParseError::MalformedRequestLine {
            line: line.to_owned(),
        }),
    }
}

// An absent or empty `Content-Length` means no body.
fn declared_length(headers: &Headers) -> Result<Option<usize>, ParseError> {
    match headers.get(CONTENT_LENGTH) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ParseError::InvalidContentLength {
                value: value.to_owned(),
            }),
    }
}

async fn read_body<R>(reader: &mut R, length: usize) -> Result<Bytes, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::with_capacity(length);
    (&mut *reader).take(length as u64).read_to_end(&mut body).await?;

    if body.len() < length {
        return Err(ParseError::IncompleteBody {
            expected: length,
            received: body.len(),
        });
    }
    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;
    use tokio::io::{AsyncWriteExt, BufReader};

    use super::*;

    const LIMIT: usize = 1024;

    const LIMITS: RequestLimits = RequestLimits {
        max_head_size: LIMIT,
        max_body_size: LIMIT,
    };

    async fn parse(raw: &[u8]) -> Result<Request, ParseError> {
        let mut reader = raw;
        Request::read_from(&mut reader, LIMITS).await
    }

    #[tokio::test]
    async fn parse_simple_get() {
        let req = parse(b"GET /home HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/home");
        assert_eq!(req.version(), "HTTP/1.1");
        assert_eq!(req.headers().get("Host"), Some("localhost"));
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn bare_lf_line_endings() {
        let req = parse(b"GET /home HTTP/1.0\nAccept: */*\n\n").await.unwrap();
        assert_eq!(req.path(), "/home");
        assert_eq!(req.version(), "HTTP/1.0");
        assert_eq!(req.headers().get("Accept"), Some("*/*"));
    }

    #[tokio::test]
    async fn query_string_stays_in_path() {
        let req = parse(b"GET /search?q=rust HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(req.path(), "/search?q=rust");
    }

    #[tokio::test]
    async fn too_few_tokens_is_malformed() {
        let err = parse(b"GET /home\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { line } if line == "GET /home"));
    }

    #[tokio::test]
    async fn too_many_tokens_is_malformed() {
        let err = parse(b"GET /home HTTP/1.1 extra\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[tokio::test]
    async fn empty_method_or_relative_path_is_malformed() {
        assert!(matches!(
            parse(b" /home HTTP/1.1\r\n\r\n").await,
            Err(ParseError::MalformedRequestLine { .. })
        ));
        assert!(matches!(
            parse(b"GET home HTTP/1.1\r\n\r\n").await,
            Err(ParseError::MalformedRequestLine { .. })
        ));
        assert!(matches!(
            parse(b"GET  /home HTTP/1.1\r\n\r\n").await,
            Err(ParseError::MalformedRequestLine { .. })
        ));
    }

    #[tokio::test]
    async fn empty_stream_is_connection_closed() {
        assert!(matches!(parse(b"").await, Err(ParseError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn non_utf8_request_line() {
        assert!(matches!(
            parse(b"GET /\xff HTTP/1.1\r\n\r\n").await,
            Err(ParseError::InvalidUtf8)
        ));
    }

    #[tokio::test]
    async fn header_line_not_utf8_is_error() {
        assert!(matches!(
            parse(b"GET / HTTP/1.1\r\nX: \xff\r\n\r\n").await,
            Err(ParseError::InvalidUtf8)
        ));
    }

    #[tokio::test]
    async fn oversized_header_line_is_rejected() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat_n(b'a', 4 * LIMIT));
        raw.extend_from_slice(b"\r\n\r\n");

        let err = parse(&raw).await.unwrap_err();
        assert!(matches!(err, ParseError::HeadersTooLarge { max: LIMIT }));
    }

    #[tokio::test]
    async fn unterminated_request_line_over_limit_is_rejected() {
        let raw = vec![b'G'; 2 * LIMIT];
        assert!(matches!(
            parse(&raw).await,
            Err(ParseError::HeadersTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn head_exactly_at_limit_is_accepted() {
        let head = b"GET / HTTP/1.1\r\nX: y\r\n\r\n";
        let limits = RequestLimits {
            max_head_size: head.len(),
            max_body_size: 0,
        };
        let mut reader = &head[..];
        let req = Request::read_from(&mut reader, limits).await.unwrap();
        assert_eq!(req.headers().get("X"), Some("y"));

        let mut reader = &head[..];
        let limits = RequestLimits {
            max_head_size: head.len() - 1,
            ..limits
        };
        assert!(matches!(
            Request::read_from(&mut reader, limits).await,
            Err(ParseError::HeadersTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn header_names_and_values_are_trimmed() {
        let req = parse(b"GET / HTTP/1.1\r\n  X-Pad  :   spaced value  \r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.headers().get("X-Pad"), Some("spaced value"));
    }

    #[tokio::test]
    async fn header_value_splits_on_first_colon() {
        let req = parse(b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.headers().get("Host"), Some("localhost:8080"));
    }

    #[tokio::test]
    async fn lines_without_colon_are_skipped() {
        let req = parse(b"GET / HTTP/1.1\r\nnot a header\r\nX-Ok: yes\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.headers().get("X-Ok"), Some("yes"));
    }

    #[tokio::test]
    async fn duplicate_headers_last_write_wins() {
        let req = parse(b"GET / HTTP/1.1\r\nX-Id: 1\r\nX-Id: 2\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.headers().get("X-Id"), Some("2"));
    }

    #[tokio::test]
    async fn eof_inside_headers_ends_header_block() {
        let req = parse(b"GET /home HTTP/1.1\r\nHost: localhost\r\n")
            .await
            .unwrap();
        assert_eq!(req.path(), "/home");
        assert_eq!(req.headers().get("Host"), Some("localhost"));
    }

    #[tokio::test]
    async fn content_length_reads_body() {
        let req = parse(b"POST /api/data HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&req.body()[..], b"hello");
    }

    #[tokio::test]
    async fn bytes_beyond_content_length_are_left_unread() {
        let mut reader: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcdef";
        let req = Request::read_from(&mut reader, LIMITS).await.unwrap();
        assert_eq!(&req.body()[..], b"abc");
        assert_eq!(reader, b"def");
    }

    #[tokio::test]
    async fn lowercase_content_length_is_not_a_body_declaration() {
        let req = parse(b"POST / HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello")
            .await
            .unwrap();
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_content_length() {
        let err = parse(b"POST / HTTP/1.1\r\nContent-Length: five\r\n\r\nhello")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength { value } if value == "five"));
    }

    #[tokio::test]
    async fn negative_content_length() {
        assert!(matches!(
            parse(b"POST / HTTP/1.1\r\nContent-Length: -1\r\n\r\n").await,
            Err(ParseError::InvalidContentLength { .. })
        ));
    }

    #[tokio::test]
    async fn content_length_over_limit() {
        let err = parse(b"POST / HTTP/1.1\r\nContent-Length: 4096\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::BodyTooLarge { length: 4096, max: LIMIT }));
    }

    #[tokio::test]
    async fn short_body_is_an_error() {
        let err = parse(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::IncompleteBody {
                expected: 10,
                received: 5
            }
        ));
    }

    // The body is read until Content-Length bytes arrive, not in a single read.
    #[tokio::test]
    async fn body_split_across_fragments_is_read_completely() {
        let (client, server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            let mut client = client;
            client
                .write_all(b"POST /api/data HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b" world").await.unwrap();
            client
        });

        let mut reader = BufReader::new(server);
        let req = Request::read_from(&mut reader, LIMITS).await.unwrap();
        assert_eq!(&req.body()[..], b"hello world");
        writer.await.unwrap();
    }

    #[test]
    fn json_body() {
        #[derive(Deserialize)]
        struct Payload {
            name: String,
        }

        let req = Request::new("POST", "/api/data").body_bytes(&br#"{"name":"routeline"}"#[..]);
        let payload: Payload = req.json().unwrap();
        assert_eq!(payload.name, "routeline");
    }
}
