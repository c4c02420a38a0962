//! Request routing: map an exact method and path to a handler function.
//!
//! A [`Router`] is a table keyed by the *route key*, the string
//! `"METHOD PATH"` (method, one space, path). Lookup is an exact string
//! comparison: there are no wildcards, prefixes, path parameters, trailing-slash
//! normalization or percent-decoding. `GET /home` and `GET /home/` are
//! different routes, and so are `GET /home` and `get /home`.
//!
//! Routes are registered while the router is still owned mutably, before it is
//! handed to [`Server::run`](crate::server::Server::run). After that it is only
//! shared behind an [`Arc`] and can no longer change.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::{Method, Request, Response};

/// Type-erased, heap-allocated async handler that turns a [`Request`] into a
/// [`Response`].
///
/// In practice you never construct this type directly; use [`Router::route`] or
/// one of the method-specific helpers instead.
pub type Handler =
    Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Request) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait through the blanket impl below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given request, boxing the returned future.
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(request))
    }
}

/// Builds the route key for a method and path.
///
/// # Examples
///
/// ```
/// assert_eq!(routeline::router::route_key("GET", "/home"), "GET /home");
/// ```
pub fn route_key(method: &str, path: &str) -> String {
    let mut key = String::with_capacity(method.len() + 1 + path.len());
    key.push_str(method);
    key.push(' ');
    key.push_str(path);
    key
}

/// Exact-match HTTP request router.
///
/// Registering a second handler under an existing route key silently replaces
/// the first one: the last registration wins. When no route matches,
/// [`Router::dispatch`] answers with [`Response::not_found`].
///
/// # Examples
///
/// ```rust,no_run
/// use routeline::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/ping", |_req| async { Response::new(StatusCode::OK) });
/// router.route("BREW", "/coffee", |_req| async { Response::new(418) });
///
/// assert!(router.lookup("GET", "/ping").is_some());
/// assert!(router.lookup("GET", "/ping/").is_none());
/// ```
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use routeline::Router;
    ///
    /// let router = Router::new();
    /// assert!(router.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under the route key `"METHOD PATH"`.
    ///
    /// Returns `true` if an earlier handler for the same key was replaced.
    pub fn route(
        &mut self,
        method: impl Into<Method>,
        path: &str,
        handler: impl IntoHandler,
    ) -> bool {
        let method = method.into();
        let key = route_key(method.as_str(), path);
        let handler: Handler = Arc::new(move |req| handler.call(req));

        let replaced = self.routes.insert(key, handler).is_some();
        if replaced {
            debug!(method = %method, path, "route re-registered, previous handler replaced");
        }
        replaced
    }

    /// Register a handler for `GET` requests to exactly `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) -> bool {
        self.route(Method::Get, path, handler)
    }

    /// Register a handler for `POST` requests to exactly `path`.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) -> bool {
        self.route(Method::Post, path, handler)
    }

    /// Register a handler for `PUT` requests to exactly `path`.
    pub fn put(&mut self, path: &str, handler: impl IntoHandler) -> bool {
        self.route(Method::Put, path, handler)
    }

    /// Register a handler for `DELETE` requests to exactly `path`.
    pub fn delete(&mut self, path: &str, handler: impl IntoHandler) -> bool {
        self.route(Method::Delete, path, handler)
    }

    /// Return the number of distinct route keys registered.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up the handler registered for exactly `method` and `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Option<&Handler> {
        self.routes.get(&route_key(method, path))
    }

    /// Dispatch `request` to its handler and return the handler's response.
    ///
    /// Never fails: an unmatched request gets the built-in `404 Not Found`
    /// response.
    pub async fn dispatch(&self, request: Request) -> Response {
        match self.lookup(request.method().as_str(), request.path()) {
            Some(handler) => handler(request).await,
            None => {
                debug!(method = %request.method(), path = request.path(), "no route matched");
                Response::not_found()
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.routes.keys().collect();
        keys.sort();
        f.debug_struct("Router").field("routes", &keys).finish()
    }
}
