use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;

use crate::application::pagination::{FilterSpec, OffsetPage, PagingSpec, SortField};
use crate::application::repos::{
    CreateStoryParams, RepoError, StoriesRepo, StoriesWriteRepo, UpdateStoryParams,
};
use crate::domain::entities::{StoryRecord, TopicRecord};
use crate::domain::types::StoryStatus;

use super::associations::{HasChildren, attach_children};
use super::table::{Association, EntityTable, TableRepository};
use super::topics::{TOPIC_COLUMNS, TopicRow};
use super::{PostgresRepositories, map_sqlx_error};

static TOPIC_LINK: Association = Association {
    junction: "topic_stories",
    parent_column: "story_id",
    child_column: "topic_id",
    child_table: "topics",
    child_columns: TOPIC_COLUMNS,
};

pub(crate) static STORIES: EntityTable = EntityTable {
    name: "stories",
    alias: "s",
    columns: &[
        "id",
        "title",
        "slug",
        "excerpt",
        "content",
        "reporter",
        "editor",
        "author",
        "status",
        "media",
        "likes",
        "shares",
        "views",
        "created_at",
        "updated_at",
    ],
    sortable: &[SortField::CreatedAt, SortField::UpdatedAt],
    status_column: Some("status"),
    association: Some(&TOPIC_LINK),
};

#[derive(sqlx::FromRow)]
struct StoryRow {
    id: i64,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    reporter: String,
    editor: String,
    author: String,
    status: StoryStatus,
    media: Option<Value>,
    likes: i32,
    shares: i32,
    views: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<StoryRow> for StoryRecord {
    fn from(row: StoryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            reporter: row.reporter,
            editor: row.editor,
            author: row.author,
            status: row.status,
            media: row.media,
            likes: row.likes,
            shares: row.shares,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
            topics: Vec::new(),
        }
    }
}

impl HasChildren for StoryRecord {
    type Child = TopicRecord;

    fn parent_id(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, children: Vec<TopicRecord>) {
        self.topics = children;
    }
}

impl PostgresRepositories {
    fn stories(&self) -> TableRepository<'_> {
        TableRepository::new(self.pool(), &STORIES)
    }

    async fn with_topics(&self, rows: Vec<StoryRow>) -> Result<Vec<StoryRecord>, RepoError> {
        let mut stories: Vec<StoryRecord> = rows.into_iter().map(StoryRecord::from).collect();
        attach_children::<StoryRecord, TopicRow>(self.pool(), &TOPIC_LINK, &mut stories).await?;
        Ok(stories)
    }

    async fn load_story(&self, id: i64) -> Result<StoryRecord, RepoError> {
        StoriesRepo::find_by_id(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn replace_story_topics(
        tx: &mut Transaction<'_, Postgres>,
        story_id: i64,
        topic_ids: &[i64],
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            DELETE FROM topic_stories
            WHERE story_id = $1
            "#,
        )
        .bind(story_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Self::link_story_topics(tx, story_id, topic_ids).await
    }

    async fn link_story_topics(
        tx: &mut Transaction<'_, Postgres>,
        story_id: i64,
        topic_ids: &[i64],
    ) -> Result<(), RepoError> {
        if topic_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO topic_stories (story_id, topic_id)
            SELECT $1, topic_id
            FROM UNNEST($2::bigint[]) AS topic_id
            "#,
        )
        .bind(story_id)
        .bind(topic_ids)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl StoriesRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<StoryRecord>, RepoError> {
        let Some(row) = self.stories().find_by_id::<StoryRow>(id).await? else {
            return Ok(None);
        };
        Ok(self.with_topics(vec![row]).await?.pop())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<StoryRecord>, RepoError> {
        let Some(row) = self.stories().find_by_slug::<StoryRow>(slug).await? else {
            return Ok(None);
        };
        Ok(self.with_topics(vec![row]).await?.pop())
    }

    async fn find_by_filter(
        &self,
        filter: &FilterSpec,
        paging: &PagingSpec,
    ) -> Result<OffsetPage<StoryRecord>, RepoError> {
        let page = self
            .stories()
            .find_by_filter::<StoryRow>(filter, paging)
            .await?;
        let stories = self.with_topics(page.items).await?;

        Ok(OffsetPage::new(stories, page.total))
    }
}

#[async_trait]
impl StoriesWriteRepo for PostgresRepositories {
    async fn insert_story(&self, params: CreateStoryParams) -> Result<StoryRecord, RepoError> {
        let CreateStoryParams {
            title,
            slug,
            excerpt,
            content,
            reporter,
            editor,
            author,
            status,
            media,
            topic_ids,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stories (
                title, slug, excerpt, content, reporter, editor, author, status, media
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(slug)
        .bind(excerpt)
        .bind(content)
        .bind(reporter)
        .bind(editor)
        .bind(author)
        .bind(status)
        .bind(media)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        Self::link_story_topics(&mut tx, id, &topic_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_story(id).await
    }

    async fn update_story(&self, params: UpdateStoryParams) -> Result<StoryRecord, RepoError> {
        let UpdateStoryParams {
            id,
            title,
            slug,
            excerpt,
            content,
            reporter,
            editor,
            author,
            status,
            media,
            topic_ids,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            UPDATE stories
            SET title = $2,
                slug = $3,
                excerpt = $4,
                content = $5,
                reporter = $6,
                editor = $7,
                author = $8,
                status = $9,
                media = $10,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(slug)
        .bind(excerpt)
        .bind(content)
        .bind(reporter)
        .bind(editor)
        .bind(author)
        .bind(status)
        .bind(media)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        if let Some(topic_ids) = topic_ids {
            Self::replace_story_topics(&mut tx, id, &topic_ids).await?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        self.load_story(id).await
    }

    async fn delete_story(&self, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            DELETE FROM topic_stories
            WHERE story_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            DELETE FROM stories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
