//! Story handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chronicle_api_types::{
    MessageResponse, Pagination, StoriesResponse, StoryCreateRequest, StoryResponse,
    StoryUpdateRequest,
};

use crate::application::pagination::ListingRequest;
use crate::application::stories::{CreateStoryCommand, UpdateStoryCommand};

use super::{DetailKey, json_body, numeric_id, story_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn list_stories(
    State(state): State<ApiState>,
    Extension(listing): Extension<ListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.stories.list(&listing).await.map_err(story_to_api)?;

    Ok(Json(StoriesResponse {
        status: StatusCode::OK.as_u16(),
        pagination: Pagination::new(
            page.total,
            listing.page,
            u64::from(listing.paging.limit()),
        ),
        stories: page.items,
    }))
}

pub async fn get_story(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let story = match DetailKey::parse(key) {
        DetailKey::Id(id) => state.stories.find_by_id(id).await,
        DetailKey::Slug(slug) => state.stories.find_by_slug(&slug).await,
    }
    .map_err(story_to_api)?;

    Ok(Json(StoryResponse {
        status: StatusCode::OK.as_u16(),
        story,
    }))
}

pub async fn create_story(
    State(state): State<ApiState>,
    payload: Result<Json<StoryCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;

    let command = CreateStoryCommand {
        title: request.title,
        excerpt: request.excerpt,
        content: request.content,
        reporter: request.reporter,
        editor: request.editor,
        author: request.author,
        status: request.status,
        media: request.media,
        topic_ids: request.topics,
    };

    let story = state.stories.create(command).await.map_err(story_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(StoryResponse {
            status: StatusCode::CREATED.as_u16(),
            story,
        }),
    ))
}

pub async fn update_story(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StoryUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = numeric_id(path)?;
    let request = json_body(payload)?;

    let command = UpdateStoryCommand {
        id,
        title: request.title,
        excerpt: request.excerpt,
        content: request.content,
        reporter: request.reporter,
        editor: request.editor,
        author: request.author,
        status: request.status,
        media: request.media,
        topic_ids: request.topics,
    };

    let story = state.stories.update(command).await.map_err(story_to_api)?;

    Ok(Json(StoryResponse {
        status: StatusCode::OK.as_u16(),
        story,
    }))
}

pub async fn delete_story(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = numeric_id(path)?;
    state.stories.delete(id).await.map_err(story_to_api)?;

    Ok(Json(MessageResponse {
        status: StatusCode::OK.as_u16(),
        message: "Story Deleted".to_string(),
    }))
}
