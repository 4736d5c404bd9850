use axum::Router;
use axum::routing::{get, post};
use resoluty_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;

pub fn build_router(
    app_state: AppState,
    cors_allowed_origin: Option<&str>,
) -> Result<Router, AppError> {
    let sheets_routes = Router::new()
        .route(
            "/api/sheets/test",
            get(handlers::sheets::test_connection_handler),
        )
        .route(
            "/api/sheets/write",
            post(handlers::sheets::write_values_handler),
        )
        .route(
            "/api/sheets/append",
            post(handlers::sheets::append_values_handler),
        )
        .route(
            "/api/sheets/read/{range}",
            get(handlers::sheets::read_values_handler),
        )
        .route("/api/sheets/log", post(handlers::logs::log_handler))
        .route(
            "/api/sheets/headers",
            post(handlers::logs::create_headers_handler),
        );

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .merge(sheets_routes)
        .route("/api/emit", post(handlers::realtime::emit_handler))
        .route("/api/stats", get(handlers::stats::stats_handler))
        .route(
            "/api/session/gate",
            get(handlers::session::session_gate_handler),
        )
        .route("/ws", get(handlers::realtime::realtime_socket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(cors_allowed_origin)?)
        .with_state(app_state))
}
