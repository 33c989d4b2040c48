//! Synthesized responses for when neither network nor cache can answer.

use serde::Serialize;

use crate::http::{Destination, Response};

pub const PAGE_UNAVAILABLE: &str = "Offline - Page not available";
pub const API_UNAVAILABLE: &str = "Offline - API not available";
pub const RESOURCE_UNAVAILABLE: &str = "Offline - Resource not available";

/// Neutral grey 100x100 square.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><rect fill="#e5e7eb" width="100" height="100"/></svg>"##;

const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";

#[derive(Serialize)]
struct OfflineApiBody {
    error: &'static str,
    cached: bool,
    offline: bool,
}

fn service_unavailable(body: &'static str) -> Response {
    Response::new(503)
        .with_status_text("Service Unavailable")
        .with_header("Content-Type", TEXT_PLAIN)
        .with_body(body)
}

/// Navigation with no network, no cached copy and no offline page.
pub fn page_unavailable() -> Response {
    service_unavailable(PAGE_UNAVAILABLE)
}

/// Default-strategy request with nothing to serve.
pub fn resource_unavailable() -> Response {
    service_unavailable(RESOURCE_UNAVAILABLE)
}

/// API call with no network and no cached copy.
pub fn api_unavailable() -> Response {
    let body = OfflineApiBody { error: API_UNAVAILABLE, cached: false, offline: true };
    Response::new(503)
        .with_header("Content-Type", "application/json")
        .with_body(serde_json::to_vec(&body).unwrap_or_default())
}

pub fn image_placeholder() -> Response {
    Response::new(200)
        .with_header("Content-Type", "image/svg+xml")
        .with_body(PLACEHOLDER_SVG)
}

/// Empty stylesheet or script, so the page still parses.
pub fn empty_asset(destination: Destination) -> Response {
    let content_type = match destination {
        Destination::Style => "text/css",
        _ => "application/javascript",
    };
    Response::new(200).with_header("Content-Type", content_type)
}
