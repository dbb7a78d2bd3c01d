//! Listing parameters and the statements built from them

pub mod builder;
pub mod params;

pub use builder::{article_detail, article_listing, comment_listing, vote_increment, VoteTarget};
pub use params::{
    ArticleListParams, ArticleListQuery, CommentListQuery, Pagination, SortColumn, SortOrder,
    DEFAULT_LIMIT, DEFAULT_PAGE,
};
