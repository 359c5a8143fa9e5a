use axum::routing::{get, put, MethodRouter};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, climate, geocode, health, predict};
use crate::state::AppState;

/// Register `method_router` at `path` with and without a trailing slash.
fn api_route(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    let method_router = method_router.fallback(handlers::method_not_allowed);
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

/// All API routes with the shared layers applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new();
    router = api_route(router, "/api/healthcheck", get(health::healthcheck));
    router = api_route(router, "/api/geocode", get(geocode::geocode));
    router = api_route(router, "/api/climate", get(climate::climate));
    router = api_route(router, "/api/predict", put(predict::predict));

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
