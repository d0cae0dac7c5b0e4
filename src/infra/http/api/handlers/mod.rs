//! API handlers organized by resource type.
//!
//! Helper functions for error conversion are defined here and shared across modules.

mod health;
mod stories;
mod topics;

pub use health::*;
pub use stories::*;
pub use topics::*;

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;

use crate::application::repos::RepoError;
use crate::application::stories::StoryServiceError;
use crate::application::topics::TopicServiceError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

/// Detail routes accept either a numeric id or a slug in the same segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DetailKey {
    Id(i64),
    Slug(String),
}

impl DetailKey {
    pub(crate) fn parse(raw: String) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Slug(raw),
        }
    }
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                "Request body too large",
                None,
            )
        } else {
            ApiError::bad_request("Invalid request body", Some(rejection.body_text()))
        }
    })
}

pub(crate) fn numeric_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request("Invalid id", Some(rejection.body_text())))
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::Pagination(p) => ApiError::invalid_query(p.to_string()),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            None,
        )
        .with_detail(message),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            None,
        )
        .with_detail(message),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(format!("{entity} not found")),
        ),
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
    }
}

pub(crate) fn story_to_api(err: StoryServiceError) -> ApiError {
    match err {
        StoryServiceError::Domain(domain) => domain_to_api(domain),
        StoryServiceError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn topic_to_api(err: TopicServiceError) -> ApiError {
    match err {
        TopicServiceError::Domain(domain) => domain_to_api(domain),
        TopicServiceError::Repo(repo) => repo_to_api(repo),
    }
}
