//! Synthetic responses served when the network is unavailable.

use shelter_core::Response;

/// 503 JSON payload for API calls that failed or timed out.
pub fn api_offline() -> Response {
    let body = serde_json::json!({ "error": "Network error", "offline": true });
    Response::new(503)
        .with_header("Content-Type", "application/json")
        .with_body(body.to_string())
}

/// 404 placeholder for images that are neither cached nor reachable.
pub fn image_unavailable() -> Response {
    Response::new(404)
        .with_header("Content-Type", "text/plain")
        .with_body("Image not available")
}

/// Empty stylesheet for unreachable third-party CSS, so pages still render.
pub fn empty_stylesheet() -> Response {
    Response::new(200)
        .with_header("Content-Type", "text/css")
        .with_body("/* stylesheet unavailable offline */")
}
