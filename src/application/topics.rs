use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::pagination::{ListingRequest, OffsetPage};
use crate::application::repos::{
    CreateTopicParams, RepoError, TopicsRepo, TopicsWriteRepo, UpdateTopicParams,
};
use crate::domain::entities::TopicRecord;
use crate::domain::error::DomainError;
use crate::domain::slug::derive_slug;

#[derive(Debug, Error)]
pub enum TopicServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateTopicCommand {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTopicCommand {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct TopicService {
    reader: Arc<dyn TopicsRepo>,
    writer: Arc<dyn TopicsWriteRepo>,
}

impl TopicService {
    pub fn new(reader: Arc<dyn TopicsRepo>, writer: Arc<dyn TopicsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(
        &self,
        request: &ListingRequest,
    ) -> Result<OffsetPage<TopicRecord>, TopicServiceError> {
        self.reader
            .find_by_filter(&request.filter, &request.paging)
            .await
            .map_err(TopicServiceError::from)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<TopicRecord, TopicServiceError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("topic").into())
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<TopicRecord, TopicServiceError> {
        self.reader
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("topic").into())
    }

    pub async fn create(
        &self,
        command: CreateTopicCommand,
    ) -> Result<TopicRecord, TopicServiceError> {
        let name = command.name.trim().to_string();
        let slug = derive_slug(&name).map_err(|err| DomainError::validation(err.to_string()))?;

        let topic = self
            .writer
            .insert_topic(CreateTopicParams { name, slug })
            .await?;
        info!(topic_id = topic.id, slug = %topic.slug, "topic created");
        Ok(topic)
    }

    pub async fn update(
        &self,
        command: UpdateTopicCommand,
    ) -> Result<TopicRecord, TopicServiceError> {
        let existing = self.find_by_id(command.id).await?;

        let params = match command.name.filter(|name| !name.trim().is_empty()) {
            Some(name) => {
                let name = name.trim().to_string();
                let slug =
                    derive_slug(&name).map_err(|err| DomainError::validation(err.to_string()))?;
                UpdateTopicParams {
                    id: existing.id,
                    name,
                    slug,
                }
            }
            None => UpdateTopicParams {
                id: existing.id,
                name: existing.name,
                slug: existing.slug,
            },
        };

        let topic = self.writer.update_topic(params).await?;
        info!(topic_id = topic.id, slug = %topic.slug, "topic updated");
        Ok(topic)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TopicServiceError> {
        self.writer.delete_topic(id).await?;
        info!(topic_id = id, "topic deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    use crate::application::pagination::{FilterSpec, PagingSpec};

    fn sample_topic(id: i64) -> TopicRecord {
        TopicRecord {
            id,
            name: "Politics".into(),
            slug: "politics".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    struct StubTopics {
        record: Option<TopicRecord>,
    }

    #[async_trait]
    impl TopicsRepo for StubTopics {
        async fn find_by_id(&self, id: i64) -> Result<Option<TopicRecord>, RepoError> {
            Ok(self.record.clone().filter(|topic| topic.id == id))
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<TopicRecord>, RepoError> {
            Ok(self.record.clone().filter(|topic| topic.slug == slug))
        }

        async fn find_by_filter(
            &self,
            _filter: &FilterSpec,
            _paging: &PagingSpec,
        ) -> Result<OffsetPage<TopicRecord>, RepoError> {
            Ok(OffsetPage::new(Vec::new(), 0))
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        updated: Mutex<Vec<UpdateTopicParams>>,
    }

    #[async_trait]
    impl TopicsWriteRepo for RecordingWriter {
        async fn insert_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError> {
            let mut topic = sample_topic(1);
            topic.name = params.name;
            topic.slug = params.slug;
            Ok(topic)
        }

        async fn update_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError> {
            self.updated.lock().unwrap().push(params.clone());
            let mut topic = sample_topic(params.id);
            topic.name = params.name;
            topic.slug = params.slug;
            Ok(topic)
        }

        async fn delete_topic(&self, _id: i64) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_names() {
        let service = TopicService::new(
            Arc::new(StubTopics { record: None }),
            Arc::new(RecordingWriter::default()),
        );
        let err = service
            .create(CreateTopicCommand { name: "  ".into() })
            .await
            .expect_err("blank");
        assert!(matches!(
            err,
            TopicServiceError::Domain(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn create_derives_slug() {
        let service = TopicService::new(
            Arc::new(StubTopics { record: None }),
            Arc::new(RecordingWriter::default()),
        );
        let topic = service
            .create(CreateTopicCommand {
                name: "World Cup 2026".into(),
            })
            .await
            .expect("create");
        assert_eq!(topic.slug, "world-cup-2026");
    }

    #[tokio::test]
    async fn update_without_name_keeps_existing_values() {
        let writer = Arc::new(RecordingWriter::default());
        let service = TopicService::new(
            Arc::new(StubTopics {
                record: Some(sample_topic(5)),
            }),
            writer.clone(),
        );

        service
            .update(UpdateTopicCommand { id: 5, name: None })
            .await
            .expect("update");

        let updated = writer.updated.lock().unwrap();
        assert_eq!(
            updated[0],
            UpdateTopicParams {
                id: 5,
                name: "Politics".into(),
                slug: "politics".into(),
            }
        );
    }

    #[tokio::test]
    async fn update_with_name_regenerates_slug() {
        let writer = Arc::new(RecordingWriter::default());
        let service = TopicService::new(
            Arc::new(StubTopics {
                record: Some(sample_topic(5)),
            }),
            writer.clone(),
        );

        let topic = service
            .update(UpdateTopicCommand {
                id: 5,
                name: Some("Local Politics".into()),
            })
            .await
            .expect("update");
        assert_eq!(topic.slug, "local-politics");
    }
}
