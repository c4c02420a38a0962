//! Per-connection request handling.
//!
//! Each connection carries exactly one exchange:
//!
//! ```text
//! AwaitRequestLine → ReadHeaders → (ReadBody) → Dispatch → WriteResponse → Close
//! ```
//!
//! Any failure before dispatch closes the connection without writing a single
//! byte. Dispatch cannot fail, so a request that parses always gets a response.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::debug;

use crate::config::Config;
use crate::http::{ParseError, Request};
use crate::router::Router;

/// Why a connection ended without completing its exchange.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("timed out after {after:?} while {stage}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectionError {
    /// Returns `true` when the peer went away before sending anything.
    pub fn is_idle_close(&self) -> bool {
        matches!(self, Self::Parse(ParseError::ConnectionClosed))
    }
}

/// Serves a single request on `stream`, then closes it.
///
/// `stream` can be any bidirectional byte stream: a [`TcpStream`](tokio::net::TcpStream)
/// in production, an in-memory duplex pipe in tests.
///
/// # Errors
///
/// Returns [`ConnectionError::Parse`] when the request cannot be read, in which
/// case nothing has been written; [`ConnectionError::Timeout`] when a configured
/// deadline expires; [`ConnectionError::Io`] when writing the response fails.
pub async fn serve_connection<S>(
    stream: S,
    router: &Router,
    config: &Config,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);

    let request = with_deadline(
        config.read_timeout_duration(),
        "reading request",
        Request::read_from(&mut stream, config.request_limits()),
    )
    .await?;

    debug!(
        method = %request.method(),
        path = request.path(),
        version = request.version(),
        "request line"
    );
    debug!(headers = ?request.headers(), body_len = request.body().len(), "request headers");

    let response = router.dispatch(request).await;
    debug!(status = response.status().as_u16(), "dispatched");

    let bytes = response.into_bytes();
    with_deadline(config.write_timeout_duration(), "writing response", async {
        stream.write_all(&bytes).await?;
        stream.flush().await?;
        stream.shutdown().await
    })
    .await
}

async fn with_deadline<F, T, E>(
    deadline: Option<Duration>,
    stage: &'static str,
    fut: F,
) -> Result<T, ConnectionError>
where
    F: Future<Output = Result<T, E>>,
    ConnectionError: From<E>,
{
    let result = match deadline {
        Some(after) => timeout(after, fut)
            .await
            .map_err(|_| ConnectionError::Timeout { stage, after })?,
        None => fut.await,
    };
    Ok(result?)
}
