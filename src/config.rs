//! Server configuration.
//!
//! The defaults reproduce the classic behavior: listen on port 8080 on every
//! interface, no read or write deadlines. Deadlines are opt-in; without them a
//! client that stops sending holds its connection task until the transport
//! gives up.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use routeline::Config;
//!
//! let config = Config::default()
//!     .addr("127.0.0.1:0")
//!     .read_timeout(Duration::from_secs(5))
//!     .max_body_size(64 * 1024);
//!
//! assert_eq!(config.bind_addr(), "127.0.0.1:0");
//! assert_eq!(config.request_limits().max_body_size, 64 * 1024);
//! assert_eq!(config.read_timeout_duration(), Some(Duration::from_secs(5)));
//! ```

use std::time::Duration;

use crate::http::request::RequestLimits;

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8080;

/// Largest `Content-Length` accepted by default (8 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Largest request line plus header block accepted by default (8 MiB).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024 * 1024;

/// Listener address, request size limits and I/O deadlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    addr: String,
    max_header_size: usize,
    max_body_size: usize,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl Config {
    /// Sets the address to bind, e.g. `"127.0.0.1:8080"`.
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Sets the largest size of the request line and headers together.
    ///
    /// Requests with a larger head are dropped without a response.
    #[must_use]
    pub fn max_header_size(mut self, bytes: usize) -> Self {
        self.max_header_size = bytes;
        self
    }

    /// Sets the largest `Content-Length` a request may declare.
    ///
    /// Requests declaring more are dropped without a response.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Sets the deadline for reading one complete request (line, headers and body).
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sets the deadline for writing the response.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Address the listener binds to.
    pub fn bind_addr(&self) -> &str {
        &self.addr
    }

    /// Head and body size caps handed to the request parser.
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_head_size: self.max_header_size,
            max_body_size: self.max_body_size,
        }
    }

    /// Deadline for reading one request, if any.
    pub fn read_timeout_duration(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Deadline for writing the response, if any.
    pub fn write_timeout_duration(&self) -> Option<Duration> {
        self.write_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(
            config.request_limits(),
            RequestLimits {
                max_head_size: DEFAULT_MAX_HEADER_SIZE,
                max_body_size: DEFAULT_MAX_BODY_SIZE,
            }
        );
        assert_eq!(config.read_timeout_duration(), None);
        assert_eq!(config.write_timeout_duration(), None);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::default()
            .addr("127.0.0.1:9000")
            .max_header_size(256)
            .max_body_size(10)
            .write_timeout(Duration::from_millis(250));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.request_limits().max_head_size, 256);
        assert_eq!(config.request_limits().max_body_size, 10);
        assert_eq!(config.write_timeout_duration(), Some(Duration::from_millis(250)));
    }
}
