//! Topic handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chronicle_api_types::{
    MessageResponse, Pagination, TopicCreateRequest, TopicResponse, TopicUpdateRequest,
    TopicsResponse,
};

use crate::application::pagination::ListingRequest;
use crate::application::topics::{CreateTopicCommand, UpdateTopicCommand};

use super::{DetailKey, json_body, numeric_id, topic_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn list_topics(
    State(state): State<ApiState>,
    Extension(listing): Extension<ListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.topics.list(&listing).await.map_err(topic_to_api)?;

    Ok(Json(TopicsResponse {
        status: StatusCode::OK.as_u16(),
        pagination: Pagination::new(
            page.total,
            listing.page,
            u64::from(listing.paging.limit()),
        ),
        topics: page.items,
    }))
}

pub async fn get_topic(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = match DetailKey::parse(key) {
        DetailKey::Id(id) => state.topics.find_by_id(id).await,
        DetailKey::Slug(slug) => state.topics.find_by_slug(&slug).await,
    }
    .map_err(topic_to_api)?;

    Ok(Json(TopicResponse {
        status: StatusCode::OK.as_u16(),
        topic,
    }))
}

pub async fn create_topic(
    State(state): State<ApiState>,
    payload: Result<Json<TopicCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;

    let topic = state
        .topics
        .create(CreateTopicCommand { name: request.name })
        .await
        .map_err(topic_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(TopicResponse {
            status: StatusCode::CREATED.as_u16(),
            topic,
        }),
    ))
}

pub async fn update_topic(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TopicUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = numeric_id(path)?;
    let request = json_body(payload)?;

    let topic = state
        .topics
        .update(UpdateTopicCommand {
            id,
            name: request.name,
        })
        .await
        .map_err(topic_to_api)?;

    Ok(Json(TopicResponse {
        status: StatusCode::OK.as_u16(),
        topic,
    }))
}

pub async fn delete_topic(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = numeric_id(path)?;
    state.topics.delete(id).await.map_err(topic_to_api)?;

    Ok(Json(MessageResponse {
        status: StatusCode::OK.as_u16(),
        message: "Topic Deleted".to_string(),
    }))
}
