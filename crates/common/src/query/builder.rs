//! Statement builders for listings and vote updates
//!
//! Every value a client supplies travels as a bound parameter. The only text
//! spliced into SQL comes from the fixed lookup tables below, keyed by enums
//! that validation has already produced.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, JoinType, Order, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Statement, Value,
};

use super::params::{ArticleListParams, Pagination, SortColumn};
use crate::db::models::{
    ArticleColumn, ArticleEntity, ArticleRelation, CommentColumn, CommentEntity,
};

const COMMENT_COUNT: &str = "COUNT(comments.comment_id)";
const TOTAL_COUNT: &str = "COUNT(*) OVER ()";

/// ORDER BY expression for a sort column
fn sort_expression(column: SortColumn) -> &'static str {
    match column {
        SortColumn::Author => "articles.author",
        SortColumn::Title => "articles.title",
        SortColumn::ArticleId => "articles.article_id",
        SortColumn::Topic => "articles.topic",
        SortColumn::CreatedAt => "articles.created_at",
        SortColumn::Votes => "articles.votes",
        SortColumn::CommentCount => "comment_count",
    }
}

/// One page of article summaries with per-article comment counts.
///
/// `total_count` is a window over the grouped rows, so it reports every
/// article matching the filter regardless of LIMIT. Ties on the sort key fall
/// back to `article_id` in the same direction to keep pages stable.
pub fn article_listing(params: &ArticleListParams) -> Select<ArticleEntity> {
    let order: Order = params.order.into();

    let mut select = ArticleEntity::find()
        .select_only()
        .columns([
            ArticleColumn::Author,
            ArticleColumn::Title,
            ArticleColumn::ArticleId,
            ArticleColumn::Topic,
            ArticleColumn::CreatedAt,
            ArticleColumn::Votes,
            ArticleColumn::ArticleImgUrl,
        ])
        .column_as(Expr::cust(COMMENT_COUNT), "comment_count")
        .column_as(Expr::cust(TOTAL_COUNT), "total_count")
        .join(JoinType::LeftJoin, ArticleRelation::Comments.def());

    if let Some(topic) = &params.topic {
        select = select.filter(ArticleColumn::Topic.eq(topic.as_str()));
    }

    select
        .group_by(ArticleColumn::ArticleId)
        .order_by(Expr::cust(sort_expression(params.sort)), order.clone())
        .order_by(ArticleColumn::ArticleId, order)
        .limit(params.pagination.limit)
        .offset(params.pagination.offset())
}

/// A single article with its comment count
pub fn article_detail(article_id: i32) -> Select<ArticleEntity> {
    ArticleEntity::find_by_id(article_id)
        .column_as(Expr::cust(COMMENT_COUNT), "comment_count")
        .join(JoinType::LeftJoin, ArticleRelation::Comments.def())
        .group_by(ArticleColumn::ArticleId)
}

/// One page of an article's comments, newest first
pub fn comment_listing(article_id: i32, pagination: &Pagination) -> Select<CommentEntity> {
    CommentEntity::find()
        .column_as(Expr::cust(TOTAL_COUNT), "total_count")
        .filter(CommentColumn::ArticleId.eq(article_id))
        .order_by_desc(CommentColumn::CreatedAt)
        .order_by_desc(CommentColumn::CommentId)
        .limit(pagination.limit)
        .offset(pagination.offset())
}

/// Rows that carry a vote tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Article,
    Comment,
}

impl VoteTarget {
    pub fn entity(self) -> &'static str {
        match self {
            VoteTarget::Article => "article",
            VoteTarget::Comment => "comment",
        }
    }

    fn table(self) -> &'static str {
        match self {
            VoteTarget::Article => "articles",
            VoteTarget::Comment => "comments",
        }
    }

    fn key(self) -> &'static str {
        match self {
            VoteTarget::Article => "article_id",
            VoteTarget::Comment => "comment_id",
        }
    }
}

/// Add `delta` to a row's votes in one statement and return the updated row.
///
/// The addition happens in the database, so concurrent increments never lose
/// updates. An empty result means the row does not exist.
pub fn vote_increment(target: VoteTarget, id: i32, delta: i32) -> Statement {
    let sql = format!(
        "UPDATE {} SET votes = votes + $1 WHERE {} = $2 RETURNING *",
        target.table(),
        target.key()
    );
    Statement::from_sql_and_values(DbBackend::Postgres, sql, [Value::from(delta), Value::from(id)])
}
