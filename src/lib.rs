//! # routeline
//!
//! A minimal HTTP/1.x server: one request per TCP connection, routed by an
//! exact `"METHOD PATH"` match.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use routeline::{Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.get("/", |_req: Request| async {
//!         Response::new(StatusCode::OK)
//!             .header("Content-Type", "text/plain")
//!             .body("Hello, World!")
//!     });
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server.run(router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::Config;
pub use http::{Headers, Method, ParseError, Request, RequestLimits, Response, StatusCode};
pub use router::Router;
pub use server::{ConnectionError, Server, ServerError};
