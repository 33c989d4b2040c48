//! Request classification.
//!
//! Every intercepted GET resolves to exactly one [`Strategy`]. Predicates are
//! evaluated in a fixed priority order and the first match wins, so a
//! navigation to `/api/...` is still a document and an image served from a
//! backend-service host is still an API call.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::http::{Destination, Request, RequestMode};

/// Caching strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Network-first with offline page fallback.
    Document,
    /// Network-first, stored in the api or dynamic partition.
    Api,
    /// Cache-first with placeholder fallback.
    Image,
    /// Stale-while-revalidate.
    StyleScript,
    /// Network-first into the dynamic partition.
    Default,
}

/// Classification rules derived from configuration.
#[derive(Debug, Clone)]
pub struct Router {
    api_prefix: String,
    backend_host_patterns: Vec<String>,
    image_extensions: Vec<String>,
}

impl Router {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_prefix: config.api_prefix.clone(),
            backend_host_patterns: config.backend_host_patterns.clone(),
            image_extensions: config
                .image_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Select the strategy for a request.
    ///
    /// Returns `None` for non-GET requests, which are never intercepted.
    pub fn classify(&self, request: &Request) -> Option<Strategy> {
        if !request.is_get() {
            return None;
        }

        let strategy = if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
            Strategy::Document
        } else if self.is_api(request) {
            Strategy::Api
        } else if request.destination == Destination::Image || self.has_image_extension(request) {
            Strategy::Image
        } else if matches!(request.destination, Destination::Style | Destination::Script) {
            Strategy::StyleScript
        } else {
            Strategy::Default
        };

        Some(strategy)
    }

    /// Whether the path falls under the same-origin API prefix.
    pub fn is_api_path(&self, request: &Request) -> bool {
        request.url.path().starts_with(&self.api_prefix)
    }

    fn is_api(&self, request: &Request) -> bool {
        if self.is_api_path(request) {
            return true;
        }
        let host = request.url.host_str().unwrap_or("");
        self.backend_host_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && host.contains(pattern.as_str()))
    }

    fn has_image_extension(&self, request: &Request) -> bool {
        let path = request.url.path();
        let Some((_, ext)) = path.rsplit_once('.') else {
            return false;
        };
        if ext.contains('/') {
            return false;
        }
        let ext = ext.to_ascii_lowercase();
        self.image_extensions.iter().any(|e| *e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(&AppConfig::default())
    }

    fn get(url: &str) -> Request {
        Request::get(url).unwrap()
    }

    #[test]
    fn test_non_get_not_intercepted() {
        let req = Request::new("POST", "http://localhost:3000/api/items").unwrap();
        assert_eq!(router().classify(&req), None);
    }

    #[test]
    fn test_navigation_is_document() {
        let req = Request::navigate("http://localhost:3000/competitions").unwrap();
        assert_eq!(router().classify(&req), Some(Strategy::Document));
    }

    #[test]
    fn test_document_destination_without_navigate_mode() {
        let req = get("http://localhost:3000/").with_destination(Destination::Document);
        assert_eq!(router().classify(&req), Some(Strategy::Document));
    }

    #[test]
    fn test_navigation_wins_over_api_prefix() {
        let req = Request::navigate("http://localhost:3000/api/export").unwrap();
        assert_eq!(router().classify(&req), Some(Strategy::Document));
    }

    #[test]
    fn test_api_prefix() {
        assert_eq!(router().classify(&get("http://localhost:3000/api/items")), Some(Strategy::Api));
    }

    #[test]
    fn test_api_prefix_requires_trailing_segment() {
        assert_eq!(router().classify(&get("http://localhost:3000/apix")), Some(Strategy::Default));
    }

    #[test]
    fn test_backend_host_is_api() {
        let req = get("https://abc.supabase.co/rest/v1/competitions");
        assert_eq!(router().classify(&req), Some(Strategy::Api));
        let req = get("https://fonts.googleapis.com/css2?family=Inter");
        assert_eq!(router().classify(&req), Some(Strategy::Api));
    }

    #[test]
    fn test_backend_image_is_api() {
        let req = get("https://abc.supabase.co/storage/v1/poster.png").with_destination(Destination::Image);
        assert_eq!(router().classify(&req), Some(Strategy::Api));
    }

    #[test]
    fn test_image_destination() {
        let req = get("http://localhost:3000/_next/image?url=x").with_destination(Destination::Image);
        assert_eq!(router().classify(&req), Some(Strategy::Image));
    }

    #[test]
    fn test_image_extension_case_insensitive() {
        assert_eq!(router().classify(&get("http://localhost:3000/logo.PNG")), Some(Strategy::Image));
        assert_eq!(router().classify(&get("http://localhost:3000/a/b.webp?v=2")), Some(Strategy::Image));
    }

    #[test]
    fn test_extension_must_end_path() {
        assert_eq!(router().classify(&get("http://localhost:3000/logo.png/raw")), Some(Strategy::Default));
        assert_eq!(router().classify(&get("http://localhost:3000/logo.pngx")), Some(Strategy::Default));
    }

    #[test]
    fn test_style_and_script() {
        let style = get("http://localhost:3000/app.css").with_destination(Destination::Style);
        let script = get("http://localhost:3000/app.js").with_destination(Destination::Script);
        assert_eq!(router().classify(&style), Some(Strategy::StyleScript));
        assert_eq!(router().classify(&script), Some(Strategy::StyleScript));
    }

    #[test]
    fn test_script_without_destination_is_default() {
        assert_eq!(router().classify(&get("http://localhost:3000/app.js")), Some(Strategy::Default));
    }

    #[test]
    fn test_font_is_default() {
        let req = get("http://localhost:3000/inter.woff2").with_destination(Destination::Font);
        assert_eq!(router().classify(&req), Some(Strategy::Default));
    }
}
