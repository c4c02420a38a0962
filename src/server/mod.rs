//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and serves exactly one request per connection:
//! every accepted stream is handed to its own Tokio task, which parses the
//! request, dispatches it through the [`Router`], writes the response and
//! closes the socket. Connections are never reused.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::router::Router;

pub mod connection;

pub use connection::{ConnectionError, serve_connection};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// The routeline HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use routeline::{Response, Router, Server, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.get("/hello", |_req| async {
///         Response::new(StatusCode::OK).body("Hello!")
///     });
///
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(router).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<Config>,
}

impl Server {
    /// Binds the server to the given TCP address with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        Self::with_config(Config::default().addr(addr.as_ref())).await
    }

    /// Binds the server to the address in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn with_config(config: Config) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests through `router`.
    ///
    /// The router is frozen from this point on: it is moved behind an [`Arc`]
    /// and only read by the connection tasks. A failed `accept` is logged and
    /// the loop keeps going, so this method runs until the process is
    /// terminated.
    pub async fn run(self, router: Router) -> Result<(), ServerError> {
        let router = Arc::new(router);
        info!(address = %self.local_addr, routes = router.len(), "routeline listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let router = Arc::clone(&router);
            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                match serve_connection(stream, &router, &config).await {
                    Ok(()) => debug!(peer = %peer_addr, "connection closed"),
                    Err(e) if e.is_idle_close() => {
                        debug!(peer = %peer_addr, "connection closed before a request was sent");
                    }
                    Err(e) => warn!(peer = %peer_addr, error = %e, "connection dropped"),
                }
            });
        }
    }
}
