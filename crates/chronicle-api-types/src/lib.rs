//! Request and response payloads shared by the Chronicle HTTP API and its clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Editorial state of a story.
///
/// The published state travels as `Publish` on the wire; `Published` is
/// accepted on input as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "story_status", rename_all = "snake_case")
)]
pub enum StoryStatus {
    #[default]
    Draft,
    #[serde(rename = "Publish", alias = "Published")]
    Published,
    Deleted,
}

impl StoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Draft => "Draft",
            StoryStatus::Published => "Publish",
            StoryStatus::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown status `{}` (expected Draft, Publish or Deleted)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for StoryStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Draft" => Ok(StoryStatus::Draft),
            "Publish" | "Published" => Ok(StoryStatus::Published),
            "Deleted" => Ok(StoryStatus::Deleted),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCreateRequest {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub reporter: String,
    pub editor: String,
    pub author: String,
    #[serde(default)]
    pub status: Option<StoryStatus>,
    #[serde(default)]
    pub media: Option<serde_json::Value>,
    #[serde(default)]
    pub topics: Vec<i64>,
}

/// Partial story update; absent or empty fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub status: Option<StoryStatus>,
    #[serde(default)]
    pub media: Option<serde_json::Value>,
    #[serde(default)]
    pub topics: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_items: u64,
    pub page: u64,
    pub items_per_page: u64,
    pub total_page: u64,
}

impl Pagination {
    pub fn new(total_items: u64, page: u64, items_per_page: u64) -> Self {
        let total_page = if items_per_page == 0 {
            0
        } else {
            total_items.div_ceil(items_per_page)
        };
        Self {
            total_items,
            page,
            items_per_page,
            total_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoriesResponse<S> {
    pub status: u16,
    pub stories: Vec<S>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryResponse<S> {
    pub status: u16,
    pub story: S,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse<T> {
    pub status: u16,
    pub topics: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResponse<T> {
    pub status: u16,
    pub topic: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: u16,
    pub message: String,
}
