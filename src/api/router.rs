use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::{require_admin, require_auth};
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    let admin = Router::new()
        .route("/api/control/pause", post(handlers::control::pause))
        .route("/api/control/resume", post(handlers::control::resume))
        .route("/api/control/status", get(handlers::control::status))
        .layer(middleware::from_fn(require_admin));

    // Protected API routes, require a Bearer JWT
    let protected = Router::new()
        // Signals
        .route("/api/signals", get(handlers::signals::list).post(handlers::signals::publish))
        .route("/api/signals/:id/close", post(handlers::signals::close))
        .route("/api/signals/:id/cancel", post(handlers::signals::cancel))
        .route("/api/signals/:id/copy", post(handlers::signals::copy))
        // Follows
        .route("/api/follows", get(handlers::follows::list).post(handlers::follows::create))
        .route(
            "/api/follows/:trader_id",
            put(handlers::follows::update).delete(handlers::follows::remove),
        )
        // Risk
        .route("/api/risk-settings", get(handlers::risk::get).put(handlers::risk::save))
        // Copy trades
        .route("/api/copy-trades", get(handlers::copy_trades::list))
        .route("/api/copy-trades/:id/close", post(handlers::copy_trades::close))
        // Analytics
        .route("/api/analytics/followers", get(handlers::analytics::followers))
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
