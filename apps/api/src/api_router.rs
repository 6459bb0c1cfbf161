use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState) -> Router {
    let cron_routes = Router::new()
        .route(
            "/api/cron",
            get(handlers::cron::refresh_snapshot_handler)
                .post(handlers::cron::refresh_snapshot_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_cron_secret,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/api/x-count", get(handlers::counts::count_handler))
        .route("/api/hashtag", get(handlers::hashtag::snapshot_handler))
        .merge(cron_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer())
        .with_state(app_state)
}
