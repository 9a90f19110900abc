use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// CORS for the calculator pages, which are served from the Mini App origin.
/// Without a configured origin any origin is accepted.
pub fn webapp_cors(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match allowed_origin {
        Some(origin) => match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS_ALLOWED_ORIGIN, allowing any origin");
                layer.allow_origin(Any)
            }
        },
        None => layer.allow_origin(Any),
    }
}
