use axum::{middleware::Next, response::Response};

/// Logs one line per handled request with the response status.
pub async fn trace_requests(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(%method, %path, status = response.status().as_u16(), "handled request");
    response
}
