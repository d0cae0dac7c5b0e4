use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::pagination::{ListingRequest, OffsetPage};
use crate::application::repos::{
    CreateStoryParams, RepoError, StoriesRepo, StoriesWriteRepo, UpdateStoryParams,
};
use crate::domain::entities::StoryRecord;
use crate::domain::error::DomainError;
use crate::domain::slug::derive_slug;
use crate::domain::types::StoryStatus;

#[derive(Debug, Error)]
pub enum StoryServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateStoryCommand {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub reporter: String,
    pub editor: String,
    pub author: String,
    pub status: Option<StoryStatus>,
    pub media: Option<serde_json::Value>,
    pub topic_ids: Vec<i64>,
}

/// Partial update; `None` and blank strings keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateStoryCommand {
    pub id: i64,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub reporter: Option<String>,
    pub editor: Option<String>,
    pub author: Option<String>,
    pub status: Option<StoryStatus>,
    pub media: Option<serde_json::Value>,
    pub topic_ids: Option<Vec<i64>>,
}

impl UpdateStoryCommand {
    /// Overlay the supplied fields on `existing`. A new title regenerates the slug.
    pub fn merge_into(self, existing: &StoryRecord) -> Result<UpdateStoryParams, DomainError> {
        let (title, slug) = match supplied(self.title) {
            Some(title) => {
                let slug =
                    derive_slug(&title).map_err(|err| DomainError::validation(err.to_string()))?;
                (title, slug)
            }
            None => (existing.title.clone(), existing.slug.clone()),
        };

        Ok(UpdateStoryParams {
            id: existing.id,
            title,
            slug,
            excerpt: supplied(self.excerpt).unwrap_or_else(|| existing.excerpt.clone()),
            content: supplied(self.content).unwrap_or_else(|| existing.content.clone()),
            reporter: supplied(self.reporter).unwrap_or_else(|| existing.reporter.clone()),
            editor: supplied(self.editor).unwrap_or_else(|| existing.editor.clone()),
            author: supplied(self.author).unwrap_or_else(|| existing.author.clone()),
            status: self.status.unwrap_or(existing.status),
            media: self.media.or_else(|| existing.media.clone()),
            topic_ids: self
                .topic_ids
                .filter(|ids| !ids.is_empty())
                .map(dedup_ids),
        })
    }
}

#[derive(Clone)]
pub struct StoryService {
    reader: Arc<dyn StoriesRepo>,
    writer: Arc<dyn StoriesWriteRepo>,
}

impl StoryService {
    pub fn new(reader: Arc<dyn StoriesRepo>, writer: Arc<dyn StoriesWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(
        &self,
        request: &ListingRequest,
    ) -> Result<OffsetPage<StoryRecord>, StoryServiceError> {
        self.reader
            .find_by_filter(&request.filter, &request.paging)
            .await
            .map_err(StoryServiceError::from)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<StoryRecord, StoryServiceError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("story").into())
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<StoryRecord, StoryServiceError> {
        self.reader
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("story").into())
    }

    pub async fn create(
        &self,
        command: CreateStoryCommand,
    ) -> Result<StoryRecord, StoryServiceError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.excerpt, "excerpt")?;
        ensure_non_empty(&command.content, "content")?;
        ensure_non_empty(&command.reporter, "reporter")?;
        ensure_non_empty(&command.editor, "editor")?;
        ensure_non_empty(&command.author, "author")?;

        let slug =
            derive_slug(&command.title).map_err(|err| DomainError::validation(err.to_string()))?;

        let params = CreateStoryParams {
            title: command.title,
            slug,
            excerpt: command.excerpt,
            content: command.content,
            reporter: command.reporter,
            editor: command.editor,
            author: command.author,
            status: command.status.unwrap_or_default(),
            media: command.media,
            topic_ids: dedup_ids(command.topic_ids),
        };

        let story = self.writer.insert_story(params).await?;
        info!(story_id = story.id, slug = %story.slug, "story created");
        Ok(story)
    }

    pub async fn update(
        &self,
        command: UpdateStoryCommand,
    ) -> Result<StoryRecord, StoryServiceError> {
        let existing = self.find_by_id(command.id).await?;
        let params = command.merge_into(&existing)?;

        let story = self.writer.update_story(params).await?;
        info!(story_id = story.id, slug = %story.slug, "story updated");
        Ok(story)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoryServiceError> {
        self.writer.delete_story(id).await?;
        info!(story_id = id, "story deleted");
        Ok(())
    }
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
