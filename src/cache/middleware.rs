//! Cache-aside middleware for read endpoints.
//!
//! Serves stored JSON bodies on a hit and captures the handler's body on a
//! miss. Every store failure degrades to a miss; the cache never turns a
//! servable request into an error.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig,
    capture::WriteThrough,
    keys::{CacheKeyBuilder, raw_key},
    metrics,
    store::CacheStore,
};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub keys: CacheKeyBuilder,
    store: Option<Arc<dyn CacheStore>>,
}

impl CacheState {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            keys: CacheKeyBuilder::new(config.namespace.clone()),
            config,
            store: Some(store),
        }
    }

    /// State with no backing store; every request passes through.
    pub fn disabled(config: CacheConfig) -> Self {
        Self {
            keys: CacheKeyBuilder::new(config.namespace.clone()),
            config,
            store: None,
        }
    }

    pub fn active_store(&self) -> Option<&Arc<dyn CacheStore>> {
        if self.config.enabled {
            self.store.as_ref()
        } else {
            None
        }
    }
}

/// Middleware for response caching.
///
/// Lookup tries the raw request target first, then the normalized key.
/// Misses run the handler and write its first body chunk through under the
/// normalized key when the status is `200 OK`.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(store) = cache.active_store().cloned() else {
        return next.run(request).await;
    };

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let raw = raw_key(request.uri());
    let key = cache.keys.build(request.uri());

    if let Some(body) = lookup(store.as_ref(), &raw).await {
        metrics::record_hit("raw");
        debug!(cache = "response", outcome = "hit", key = %raw, "serving cached response");
        return cached_response(body);
    }

    if let Some(body) = lookup(store.as_ref(), &key).await {
        metrics::record_hit("normalized");
        debug!(cache = "response", outcome = "hit", key = %key, "serving cached response");
        return cached_response(body);
    }

    metrics::record_miss();
    debug!(cache = "response", outcome = "miss", key = %key, "cache miss, executing handler");

    let response = next.run(request).await;
    WriteThrough::new(store, key, cache.config.ttl())
        .capture(response)
        .await
}

async fn lookup(store: &dyn CacheStore, key: &str) -> Option<Bytes> {
    match store.get(key).await {
        Ok(found) => found,
        Err(err) => {
            metrics::record_error("get");
            warn!(cache = "response", outcome = "error", key, error = %err, "cache lookup failed; treating as miss");
            None
        }
    }
}

fn cached_response(body: Bytes) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_UTF8),
    );
    response
}
