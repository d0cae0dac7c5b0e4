//! Write-through capture of a handler's response body.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::StatusCode,
    response::Response,
};
use futures::{StreamExt, stream};
use tracing::{debug, warn};

use super::metrics;
use super::store::CacheStore;

/// Wraps a miss response so its first body chunk is stored under `key`.
///
/// Only `200 OK` responses are written. The chunk is stored before it is
/// forwarded, and every chunk after the first passes through untouched.
/// Store failures are logged and counted but never change the response.
pub struct WriteThrough {
    store: Arc<dyn CacheStore>,
    key: String,
    ttl: Duration,
}

impl WriteThrough {
    pub fn new(store: Arc<dyn CacheStore>, key: String, ttl: Duration) -> Self {
        Self { store, key, ttl }
    }

    pub async fn capture(self, response: Response) -> Response {
        let (parts, body) = response.into_parts();
        let mut chunks = body.into_data_stream();
        let first = chunks.next().await;

        if parts.status == StatusCode::OK
            && let Some(Ok(chunk)) = &first
        {
            self.store_chunk(chunk.clone()).await;
        }

        let body = Body::from_stream(stream::iter(first).chain(chunks));
        Response::from_parts(parts, body)
    }

    async fn store_chunk(&self, chunk: bytes::Bytes) {
        let size = chunk.len();
        match self
            .store
            .set_with_expiry(&self.key, chunk, self.ttl)
            .await
        {
            Ok(()) => {
                metrics::record_write();
                debug!(cache = "response", outcome = "stored", key = %self.key, size, "cached response body");
            }
            Err(err) => {
                metrics::record_error("set");
                warn!(cache = "response", outcome = "error", key = %self.key, error = %err, "failed to cache response body");
            }
        }
    }
}
