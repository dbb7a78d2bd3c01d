//! End-to-end checks against a real PostgreSQL.
//!
//! Ignored by default. Run with a reachable database:
//!
//! ```text
//! NEWSBOARD_TEST_DATABASE_URL=postgres://localhost/nc_news_test \
//!     cargo test -p newsboard-common --test postgres_listing -- --ignored
//! ```
//!
//! Each run migrates a fresh schema and drops it afterwards.

use newsboard_common::config::DatabaseConfig;
use newsboard_common::db::models::{NewArticle, NewComment, NewTopic, NewUser};
use newsboard_common::db::{DbPool, Repository};
use newsboard_common::query::{ArticleListQuery, Pagination};
use sea_orm::{ConnectionTrait, Database};

const DATABASE_URL_VAR: &str = "NEWSBOARD_TEST_DATABASE_URL";

fn list(query: ArticleListQuery) -> newsboard_common::query::ArticleListParams {
    query.validate().expect("valid listing query")
}

fn article(author: &str, topic: &str, n: usize) -> NewArticle {
    NewArticle {
        author: author.to_string(),
        title: format!("Article number {n}"),
        body: format!("Body of article {n}"),
        topic: topic.to_string(),
        article_img_url: None,
    }
}

fn database_url() -> String {
    std::env::var(DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{DATABASE_URL_VAR} must point at a PostgreSQL database"))
}

#[tokio::test]
#[ignore = "needs PostgreSQL; set NEWSBOARD_TEST_DATABASE_URL and pass --ignored"]
async fn test_listing_votes_and_references() {
    let url = database_url();

    let schema = format!("newsboard_test_{}", std::process::id());
    let admin = Database::connect(url.as_str()).await.unwrap();
    admin
        .execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
        .await
        .unwrap();

    let config = DatabaseConfig {
        url: url.clone(),
        max_connections: 4,
        min_connections: 1,
        schema: Some(schema.clone()),
        ..DatabaseConfig::default()
    };
    let pool = DbPool::new(&config).await.unwrap();
    pool.migrate().await.unwrap();
    let repo = Repository::new(pool);

    // Seed
    for slug in ["mitch", "cats", "paper"] {
        repo.create_topic(NewTopic {
            slug: slug.to_string(),
            description: format!("all about {slug}"),
        })
        .await
        .unwrap();
    }
    for username in ["butter_bridge", "icellusedkars"] {
        repo.create_user(NewUser {
            username: username.to_string(),
            name: "jonny".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap();
    }
    let mut ids = Vec::new();
    for n in 0..13 {
        let topic = if n == 0 { "cats" } else { "mitch" };
        ids.push(repo.create_article(article("butter_bridge", topic, n)).await.unwrap().article_id);
    }

    // Duplicate topic slugs are conflicts
    let err = repo
        .create_topic(NewTopic { slug: "cats".to_string(), description: "again".to_string() })
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 409);

    // Pagination with total_count
    let page = repo
        .list_articles(list(ArticleListQuery {
            limit: Some("5".to_string()),
            p: Some("2".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(page.len(), 5);
    assert!(page.iter().all(|a| a.total_count == 13));

    // Known topic with no articles
    let empty = repo
        .list_articles(list(ArticleListQuery { topic: Some("paper".to_string()), ..Default::default() }))
        .await
        .unwrap();
    assert!(empty.is_empty());

    // Comment counts and votes ordering
    for body in ["first", "second"] {
        repo.create_comment(
            ids[3],
            NewComment {
                username: Some("icellusedkars".to_string()),
                body: Some(body.to_string()),
            },
        )
        .await
        .unwrap();
    }
    repo.increment_article_votes(ids[5], 50).await.unwrap();
    repo.increment_article_votes(ids[7], 10).await.unwrap();

    let by_votes = repo
        .list_articles(list(ArticleListQuery {
            sort_by: Some("votes".to_string()),
            order: Some("desc".to_string()),
            limit: Some("20".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert!(by_votes.windows(2).all(|pair| pair[0].votes >= pair[1].votes));
    assert_eq!(by_votes[0].article_id, ids[5]);

    let by_comments = repo
        .list_articles(list(ArticleListQuery {
            sort_by: Some("comment_count".to_string()),
            order: Some("desc".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(by_comments[0].article_id, ids[3]);
    assert_eq!(by_comments[0].comment_count, 2);

    let comments = repo.list_comments(ids[3], Pagination::default()).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].body, "second");
    assert!(comments.iter().all(|c| c.total_count == 2));

    // Votes round trip
    let before = repo.get_article(ids[1]).await.unwrap().votes;
    repo.increment_article_votes(ids[1], 1000).await.unwrap();
    let after = repo.increment_article_votes(ids[1], -1000).await.unwrap();
    assert_eq!(after.votes, before);

    // Missing references write nothing
    let err = repo.create_article(article("rogue", "mitch", 99)).await.unwrap_err();
    assert_eq!(err.to_string(), "rogue user does not exist");
    let err = repo.create_article(article("butter_bridge", "dogs", 99)).await.unwrap_err();
    assert_eq!(err.to_string(), "dogs topic does not exist");
    let all = repo.list_articles(list(ArticleListQuery::default())).await.unwrap();
    assert_eq!(all[0].total_count, 13);

    // Deletes cascade to comments
    repo.delete_article(ids[3]).await.unwrap();
    let err = repo.get_article(ids[3]).await.unwrap_err();
    assert_eq!(err.to_string(), format!("article {} does not exist", ids[3]));
    let err = repo.delete_article(ids[3]).await.unwrap_err();
    assert_eq!(err.status_code().as_u16(), 404);

    repo.delete_user("butter_bridge").await.unwrap();
    let remaining = repo.list_articles(list(ArticleListQuery::default())).await.unwrap();
    assert!(remaining.is_empty());

    admin
        .execute_unprepared(&format!("DROP SCHEMA {schema} CASCADE"))
        .await
        .unwrap();
}
