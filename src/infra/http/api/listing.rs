//! Listing parameter validation.
//!
//! Runs outside the response cache so a malformed listing request is
//! answered with 400 before any cache or database call.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::pagination::{ListingPolicy, ListingQuery, ListingRequest};

use super::error::ApiError;

pub async fn validate_listing(
    State(policy): State<ListingPolicy>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let query = ListingQuery::from_query(request.uri().query().unwrap_or(""));

    match ListingRequest::parse(&query, &policy) {
        Ok(listing) => {
            request.extensions_mut().insert(listing);
            next.run(request).await
        }
        Err(err) => ApiError::invalid_query(err.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn app(policy: ListingPolicy) -> Router {
        Router::new()
            .route(
                "/items",
                get(|Extension(listing): Extension<ListingRequest>| async move {
                    format!("{}:{}", listing.page, listing.paging.limit())
                }),
            )
            .layer(middleware::from_fn_with_state(policy, validate_listing))
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn valid_requests_reach_the_handler() {
        let app = app(ListingPolicy::stories(20, 100));
        assert_eq!(status_of(app, "/items?page=2&limit=5").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_sort_fields_are_rejected() {
        let app = app(ListingPolicy::stories(20, 100));
        assert_eq!(
            status_of(app, "/items?sort-by=name").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn topic_listings_require_sort_and_order() {
        let app = app(ListingPolicy::topics(20, 100));
        assert_eq!(
            status_of(app.clone(), "/items").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(app, "/items?sort-by=createdAt&order=asc").await,
            StatusCode::OK
        );
    }
}
