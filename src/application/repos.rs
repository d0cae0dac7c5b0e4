//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{FilterSpec, OffsetPage, PaginationError, PagingSpec};
use crate::domain::entities::{StoryRecord, TopicRecord};
use crate::domain::types::StoryStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateStoryParams {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub reporter: String,
    pub editor: String,
    pub author: String,
    pub status: StoryStatus,
    pub media: Option<serde_json::Value>,
    pub topic_ids: Vec<i64>,
}

/// Full replacement values for a story row.
///
/// `topic_ids` of `None` leaves the story's associations untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStoryParams {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub reporter: String,
    pub editor: String,
    pub author: String,
    pub status: StoryStatus,
    pub media: Option<serde_json::Value>,
    pub topic_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone)]
pub struct CreateTopicParams {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTopicParams {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[async_trait]
pub trait StoriesRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<StoryRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<StoryRecord>, RepoError>;

    async fn find_by_filter(
        &self,
        filter: &FilterSpec,
        paging: &PagingSpec,
    ) -> Result<OffsetPage<StoryRecord>, RepoError>;
}

#[async_trait]
pub trait StoriesWriteRepo: Send + Sync {
    async fn insert_story(&self, params: CreateStoryParams) -> Result<StoryRecord, RepoError>;

    async fn update_story(&self, params: UpdateStoryParams) -> Result<StoryRecord, RepoError>;

    /// Removes the story and its topic associations.
    async fn delete_story(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TopicsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<TopicRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TopicRecord>, RepoError>;

    async fn find_by_filter(
        &self,
        filter: &FilterSpec,
        paging: &PagingSpec,
    ) -> Result<OffsetPage<TopicRecord>, RepoError>;
}

#[async_trait]
pub trait TopicsWriteRepo: Send + Sync {
    async fn insert_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError>;

    async fn update_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError>;

    async fn delete_topic(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
