use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::pagination::{FilterSpec, OffsetPage, PagingSpec, SortField};
use crate::application::repos::{
    CreateTopicParams, RepoError, TopicsRepo, TopicsWriteRepo, UpdateTopicParams,
};
use crate::domain::entities::TopicRecord;

use super::associations::ChildRow;
use super::table::{EntityTable, TableRepository};
use super::{PostgresRepositories, map_sqlx_error};

pub(super) const TOPIC_COLUMNS: &[&str] = &["id", "name", "slug", "created_at", "updated_at"];

pub(crate) static TOPICS: EntityTable = EntityTable {
    name: "topics",
    alias: "t",
    columns: TOPIC_COLUMNS,
    sortable: &[SortField::CreatedAt, SortField::UpdatedAt],
    status_column: None,
    association: None,
};

#[derive(sqlx::FromRow)]
pub(super) struct TopicRow {
    id: i64,
    name: String,
    slug: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TopicRow> for TopicRecord {
    fn from(row: TopicRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl ChildRow for TopicRecord {
    fn child_id(&self) -> i64 {
        self.id
    }
}

impl PostgresRepositories {
    fn topics(&self) -> TableRepository<'_> {
        TableRepository::new(self.pool(), &TOPICS)
    }
}

#[async_trait]
impl TopicsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<TopicRecord>, RepoError> {
        let row = self.topics().find_by_id::<TopicRow>(id).await?;
        Ok(row.map(TopicRecord::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TopicRecord>, RepoError> {
        let row = self.topics().find_by_slug::<TopicRow>(slug).await?;
        Ok(row.map(TopicRecord::from))
    }

    async fn find_by_filter(
        &self,
        filter: &FilterSpec,
        paging: &PagingSpec,
    ) -> Result<OffsetPage<TopicRecord>, RepoError> {
        let page = self
            .topics()
            .find_by_filter::<TopicRow>(filter, paging)
            .await?;

        Ok(OffsetPage::new(
            page.items.into_iter().map(TopicRecord::from).collect(),
            page.total,
        ))
    }
}

#[async_trait]
impl TopicsWriteRepo for PostgresRepositories {
    async fn insert_topic(&self, params: CreateTopicParams) -> Result<TopicRecord, RepoError> {
        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            INSERT INTO topics (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at, updated_at
            "#,
        )
        .bind(params.name)
        .bind(params.slug)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TopicRecord::from(row))
    }

    async fn update_topic(&self, params: UpdateTopicParams) -> Result<TopicRecord, RepoError> {
        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            UPDATE topics
            SET name = $2,
                slug = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, slug, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.slug)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(TopicRecord::from(row))
    }

    async fn delete_topic(&self, id: i64) -> Result<(), RepoError> {
        // topic_stories rows go with the topic via ON DELETE CASCADE.
        let result = sqlx::query(
            r#"
            DELETE FROM topics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
