//! Router configuration for the read API.

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Paths listed by the index route, in registration order.
pub const ENDPOINTS: [&str; 9] = [
    "/api/stats",
    "/api/boroughs",
    "/api/trips",
    "/api/trips/by-borough",
    "/api/trips/by-hour",
    "/api/trips/by-day",
    "/api/zones",
    "/api/trips/top-routes",
    "/api/zone-rankings",
];

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // the dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/stats", get(handlers::stats))
        .route("/api/boroughs", get(handlers::boroughs))
        .route("/api/trips", get(handlers::trips))
        .route("/api/trips/by-borough", get(handlers::trips_by_borough))
        .route("/api/trips/by-hour", get(handlers::trips_by_hour))
        .route("/api/trips/by-day", get(handlers::trips_by_day))
        .route("/api/trips/top-routes", get(handlers::top_routes))
        .route("/api/zones", get(handlers::zones))
        .route("/api/zone-rankings", get(handlers::zone_rankings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
