//! Shared domain enumerations aligned with persisted database enums.

pub use chronicle_api_types::{StoryStatus, UnknownStatus};
