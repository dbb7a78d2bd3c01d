//! Validation rules for listing parameters
//!
//! Raw query-string values arrive as text and leave as typed, allow-listed
//! values. Nothing in here touches storage; the topic check takes the live
//! slug list as an argument.

use serde::Deserialize;
use std::str::FromStr;

use crate::errors::{AppError, Result};

/// Page size when `limit` is absent
pub const DEFAULT_LIMIT: u64 = 10;

/// Page number when `p` is absent
pub const DEFAULT_PAGE: u64 = 1;

/// Columns an article listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Author,
    Title,
    ArticleId,
    Topic,
    CreatedAt,
    Votes,
    CommentCount,
}

impl SortColumn {
    pub const ALL: [SortColumn; 7] = [
        SortColumn::Author,
        SortColumn::Title,
        SortColumn::ArticleId,
        SortColumn::Topic,
        SortColumn::CreatedAt,
        SortColumn::Votes,
        SortColumn::CommentCount,
    ];

    /// Query-string token for this column
    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::Author => "author",
            SortColumn::Title => "title",
            SortColumn::ArticleId => "article_id",
            SortColumn::Topic => "topic",
            SortColumn::CreatedAt => "created_at",
            SortColumn::Votes => "votes",
            SortColumn::CommentCount => "comment_count",
        }
    }
}

impl FromStr for SortColumn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or(AppError::InvalidQuery { param: "sort_by" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::InvalidQuery { param: "order" }),
        }
    }
}

impl From<SortOrder> for sea_orm::Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl Pagination {
    /// Parse raw `limit` and `p` values, applying defaults for absent ones.
    ///
    /// Pages start at 1; anything lower would produce a negative offset and is
    /// reported as a negative page number.
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Result<Self> {
        let limit = match limit {
            Some(raw) => parse_integer(raw)?,
            None => DEFAULT_LIMIT as i64,
        };
        if limit < 0 {
            return Err(AppError::NegativeLimit);
        }

        let page = match page {
            Some(raw) => parse_integer(raw)?,
            None => DEFAULT_PAGE as i64,
        };
        if page < 1 {
            return Err(AppError::NegativePage);
        }

        // offset must fit a BIGINT
        limit.checked_mul(page - 1).ok_or(AppError::InvalidInput)?;

        Ok(Self {
            limit: u64::try_from(limit).map_err(|_| AppError::InvalidInput)?,
            page: u64::try_from(page).map_err(|_| AppError::InvalidInput)?,
        })
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        self.limit * (self.page - 1)
    }
}

fn parse_integer(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| AppError::InvalidInput)
}

/// Raw query string of `GET /api/articles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleListQuery {
    pub topic: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub p: Option<String>,
}

/// Validated article listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleListParams {
    pub topic: Option<String>,
    pub sort: SortColumn,
    pub order: SortOrder,
    pub pagination: Pagination,
}

impl Default for ArticleListParams {
    fn default() -> Self {
        Self {
            topic: None,
            sort: SortColumn::CreatedAt,
            order: SortOrder::Desc,
            pagination: Pagination::default(),
        }
    }
}

impl ArticleListQuery {
    /// Check everything that can be checked without storage.
    ///
    /// With neither `sort_by` nor `order` the listing is newest first; `order`
    /// alone applies to `created_at`; `sort_by` alone sorts ascending.
    pub fn validate(self) -> Result<ArticleListParams> {
        let sort_by = self.sort_by.as_deref().map(str::parse::<SortColumn>).transpose()?;
        let order = self.order.as_deref().map(str::parse::<SortOrder>).transpose()?;

        let (sort, order) = match (sort_by, order) {
            (None, None) => (SortColumn::CreatedAt, SortOrder::Desc),
            (None, Some(order)) => (SortColumn::CreatedAt, order),
            (Some(sort), None) => (sort, SortOrder::Asc),
            (Some(sort), Some(order)) => (sort, order),
        };

        let pagination = Pagination::parse(self.limit.as_deref(), self.p.as_deref())?;

        Ok(ArticleListParams {
            topic: self.topic,
            sort,
            order,
            pagination,
        })
    }
}

impl ArticleListParams {
    /// Reject a topic filter that names no existing topic
    pub fn ensure_known_topic(&self, known_slugs: &[String]) -> Result<()> {
        match &self.topic {
            Some(topic) if !known_slugs.iter().any(|slug| slug == topic) => {
                Err(AppError::InvalidQuery { param: "topic" })
            }
            _ => Ok(()),
        }
    }
}

/// Raw query string of `GET /api/articles/{article_id}/comments`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentListQuery {
    pub limit: Option<String>,
    pub p: Option<String>,
}

impl CommentListQuery {
    pub fn validate(self) -> Result<Pagination> {
        Pagination::parse(self.limit.as_deref(), self.p.as_deref())
    }
}
