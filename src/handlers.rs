//! The stock routes served by the `routeline` binary.

use crate::{Request, Response, Router, StatusCode};

/// `GET /home`: a static HTML page.
pub async fn home(_request: Request) -> Response {
    Response::new(StatusCode::OK)
        .header("Content-Type", "text/html")
        .body("<h1>Home</h1>")
}

/// `POST /api/data`: acknowledges the request and echoes its body inside JSON.
///
/// The body is pasted into the JSON template as-is, without escaping, so a
/// body containing `"` or `\` produces a document that is not valid JSON.
pub async fn receive_data(request: Request) -> Response {
    let body = String::from_utf8_lossy(request.body());
    Response::new(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(format!(
            r#"{{"message": "Dados recebidos", "body": "{body}"}}"#
        ))
}

/// Builds the router with the stock routes registered.
pub fn default_router() -> Router {
    let mut router = Router::new();
    router.get("/home", home);
    router.post("/api/data", receive_data);
    router
}
