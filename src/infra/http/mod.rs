pub mod api;
mod middleware;

pub use api::{ApiState, WRITE_BODY_LIMIT, build_api_router};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use axum::{Router, middleware as axum_middleware};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::cache::CacheState;

/// Full application router with the shared HTTP stack applied.
pub fn build_router(state: ApiState, cache: CacheState) -> Router {
    with_http_layers(build_api_router(state, cache))
}

/// Layers listed innermost first. Panics are converted before the failure
/// logger runs, and responses are compressed after the request id is set.
fn with_http_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .layer(CompressionLayer::new())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
