pub mod error;
pub mod handlers;
pub mod listing;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};

use crate::cache::{CacheState, response_cache_layer};

use listing::validate_listing;

/// Request body cap for insert and update routes.
pub const WRITE_BODY_LIMIT: usize = 1 << 20;

/// Story, topic and health routes.
///
/// Listing routes validate their query before the cache sees the request;
/// detail routes are cached directly. Writes are never cached.
pub fn build_api_router(state: ApiState, cache: CacheState) -> Router {
    let story_listing = state.story_listing;
    let topic_listing = state.topic_listing;

    Router::new()
        .route(
            "/api/stories/",
            get(handlers::list_stories)
                .layer(from_fn_with_state(cache.clone(), response_cache_layer))
                .layer(from_fn_with_state(story_listing, validate_listing)),
        )
        .route(
            "/api/stories/insert",
            post(handlers::create_story).layer(DefaultBodyLimit::max(WRITE_BODY_LIMIT)),
        )
        .route(
            "/api/stories/{key}",
            get(handlers::get_story)
                .layer(from_fn_with_state(cache.clone(), response_cache_layer)),
        )
        .route(
            "/api/stories/{key}/update",
            patch(handlers::update_story).layer(DefaultBodyLimit::max(WRITE_BODY_LIMIT)),
        )
        .route("/api/stories/{key}/delete", delete(handlers::delete_story))
        .route(
            "/api/topics/",
            get(handlers::list_topics)
                .layer(from_fn_with_state(cache.clone(), response_cache_layer))
                .layer(from_fn_with_state(topic_listing, validate_listing)),
        )
        .route(
            "/api/topics/insert",
            post(handlers::create_topic).layer(DefaultBodyLimit::max(WRITE_BODY_LIMIT)),
        )
        .route(
            "/api/topics/{key}",
            get(handlers::get_topic).layer(from_fn_with_state(cache, response_cache_layer)),
        )
        .route(
            "/api/topics/{key}/update",
            patch(handlers::update_topic).layer(DefaultBodyLimit::max(WRITE_BODY_LIMIT)),
        )
        .route("/api/topics/{key}/delete", delete(handlers::delete_topic))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
