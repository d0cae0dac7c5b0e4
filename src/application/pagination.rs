//! Offset pagination, sorting and filter parsing shared by listing endpoints.
//!
//! Raw query parameters are resolved into typed [`PagingSpec`] and
//! [`FilterSpec`] values here. Sort field and direction are enums, so a
//! value outside the allow-list cannot reach the persistence layer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::types::StoryStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("`{param}` must be an integer, got `{value}`")]
    InvalidNumber { param: &'static str, value: String },
    #[error("`{param}` must not be negative")]
    Negative { param: &'static str },
    #[error("`{param}` is required")]
    Missing { param: &'static str },
    #[error("unsupported sort field `{0}` (expected createdAt or updatedAt)")]
    UnknownSortField(String),
    #[error("unsupported sort order `{0}` (expected asc or desc)")]
    UnknownSortOrder(String),
    #[error("sort field `{0}` is not sortable for this listing")]
    UnsupportedSortField(SortField),
    #[error("{0}")]
    InvalidStatus(String),
    #[error("`limit` must not exceed {max}")]
    LimitTooLarge { max: u32 },
    #[error("limit must be greater than zero")]
    ZeroLimit,
    #[error("requested page is out of range")]
    OffsetOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_param(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortField {
    type Err = PaginationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            other => Err(PaginationError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = PaginationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PaginationError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Validated limit/offset window plus ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingSpec {
    limit: u32,
    offset: u64,
    sort: SortField,
    order: SortOrder,
}

impl PagingSpec {
    pub fn new(
        limit: u32,
        offset: u64,
        sort: SortField,
        order: SortOrder,
    ) -> Result<Self, PaginationError> {
        if limit == 0 {
            return Err(PaginationError::ZeroLimit);
        }
        Ok(Self {
            limit,
            offset,
            sort,
            order,
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub status: Option<StoryStatus>,
    pub topic: Option<i64>,
}

/// One page of results plus the unbounded total for the same filter.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Listing parameters exactly as they arrive on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
    pub topic: Option<String>,
}

impl ListingQuery {
    /// Percent-decodes `query`; the first occurrence of a repeated parameter wins.
    pub fn from_query(query: &str) -> Self {
        let mut parsed = Self::default();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match name.as_ref() {
                "page" => &mut parsed.page,
                "limit" => &mut parsed.limit,
                "sort-by" => &mut parsed.sort_by,
                "order" => &mut parsed.order,
                "status" => &mut parsed.status,
                "topic" => &mut parsed.topic,
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }
        parsed
    }
}

/// Defaults and bounds applied while resolving a [`ListingQuery`].
///
/// A `None` default makes the parameter mandatory. Listings without
/// `filterable` ignore `status` and `topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    pub default_limit: u32,
    pub max_limit: u32,
    pub default_sort: Option<SortField>,
    pub default_order: Option<SortOrder>,
    pub filterable: bool,
}

impl ListingPolicy {
    /// Stories default to the most recently updated first.
    pub fn stories(default_limit: u32, max_limit: u32) -> Self {
        Self {
            default_limit,
            max_limit,
            default_sort: Some(SortField::UpdatedAt),
            default_order: Some(SortOrder::Desc),
            filterable: true,
        }
    }

    /// Topics require an explicit `sort-by` and `order`.
    pub fn topics(default_limit: u32, max_limit: u32) -> Self {
        Self {
            default_limit,
            max_limit,
            default_sort: None,
            default_order: None,
            filterable: false,
        }
    }
}

/// A fully validated listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingRequest {
    pub page: u64,
    pub filter: FilterSpec,
    pub paging: PagingSpec,
}

impl ListingRequest {
    pub fn parse(query: &ListingQuery, policy: &ListingPolicy) -> Result<Self, PaginationError> {
        let limit = match parse_integer("limit", query.limit.as_deref())? {
            None | Some(0) => policy.default_limit,
            Some(value) => u32::try_from(value)
                .ok()
                .filter(|limit| *limit <= policy.max_limit)
                .ok_or(PaginationError::LimitTooLarge {
                    max: policy.max_limit,
                })?,
        };

        let page = match parse_integer("page", query.page.as_deref()) {
            Ok(Some(value)) if value > 0 => value,
            Ok(_) | Err(PaginationError::Negative { .. }) => 1,
            Err(err) => return Err(err),
        };

        let sort = match non_empty(query.sort_by.as_deref()) {
            Some(raw) => raw.parse()?,
            None => policy
                .default_sort
                .ok_or(PaginationError::Missing { param: "sort-by" })?,
        };

        let order = match non_empty(query.order.as_deref()) {
            Some(raw) => raw.parse()?,
            None => policy
                .default_order
                .ok_or(PaginationError::Missing { param: "order" })?,
        };

        let filter = if policy.filterable {
            parse_filter(query)?
        } else {
            FilterSpec::default()
        };

        let offset = (page - 1)
            .checked_mul(u64::from(limit))
            .ok_or(PaginationError::OffsetOverflow)?;

        Ok(Self {
            page,
            filter,
            paging: PagingSpec::new(limit, offset, sort, order)?,
        })
    }
}

fn parse_filter(query: &ListingQuery) -> Result<FilterSpec, PaginationError> {
    let status = non_empty(query.status.as_deref())
        .map(|raw| {
            raw.parse::<StoryStatus>()
                .map_err(|err| PaginationError::InvalidStatus(err.to_string()))
        })
        .transpose()?;

    let topic = match non_empty(query.topic.as_deref()) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| PaginationError::InvalidNumber {
            param: "topic",
            value: raw.to_string(),
        })?),
        None => None,
    };

    Ok(FilterSpec { status, topic })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_integer(param: &'static str, raw: Option<&str>) -> Result<Option<u64>, PaginationError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    let value: i64 = raw.parse().map_err(|_| PaginationError::InvalidNumber {
        param,
        value: raw.to_string(),
    })?;
    if value < 0 {
        return Err(PaginationError::Negative { param });
    }
    Ok(Some(value as u64))
}
