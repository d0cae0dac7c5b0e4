use serde::Serialize;
use time::OffsetDateTime;

use super::types::StoryStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A story together with the topics it is filed under.
///
/// `topics` is always present; a story without associations carries an
/// empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
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
    pub likes: i32,
    pub shares: i32,
    pub views: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub topics: Vec<TopicRecord>,
}
