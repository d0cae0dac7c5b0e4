//! Cache key derivation.
//!
//! A key is the namespace, the non-empty path segments, then one
//! `name=value` token per allow-listed listing parameter in fixed order, all
//! joined with `:`. Parameters outside the allow-list never reach the key, so
//! arbitrary query strings cannot inflate the keyspace.

use axum::http::Uri;

/// Listing parameters that participate in the key, in key order.
pub const KEY_PARAMS: [&str; 6] = ["page", "limit", "sort-by", "order", "status", "topic"];

const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Normalized key for a request URI.
    pub fn build(&self, uri: &Uri) -> String {
        self.build_parts(uri.path(), uri.query())
    }

    fn build_parts(&self, path: &str, query: Option<&str>) -> String {
        let mut key = self.namespace.clone();

        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            key.push(SEPARATOR);
            key.push_str(segment);
        }

        let values = first_values(query.unwrap_or(""));
        for (name, value) in KEY_PARAMS.iter().zip(values) {
            key.push(SEPARATOR);
            key.push_str(name);
            key.push('=');
            key.push_str(value.as_deref().unwrap_or(""));
        }

        key
    }
}

/// Exact-match key for the raw request target (path plus original query).
pub fn raw_key(uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    }
}

fn first_values(query: &str) -> [Option<String>; KEY_PARAMS.len()] {
    let mut values: [Option<String>; KEY_PARAMS.len()] = Default::default();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if let Some(index) = KEY_PARAMS.iter().position(|param| *param == name) {
            values[index].get_or_insert_with(|| value.into_owned());
        }
    }
    values
}
