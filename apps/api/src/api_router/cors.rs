use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use resoluty_core::AppError;
use tower_http::cors::{Any, CorsLayer};

pub(super) fn build_cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, AppError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let Some(origin) = allowed_origin else {
        return Ok(layer.allow_origin(Any));
    };

    Ok(layer
        .allow_origin(HeaderValue::from_str(origin).map_err(|error| {
            AppError::Validation(format!("invalid CORS_ALLOWED_ORIGIN: {error}"))
        })?)
        .allow_credentials(true))
}
