//! Newsboard API Gateway
//!
//! The entry point for all external API requests.
//! Handles:
//! - Request routing and parsing
//! - Rate limiting and concurrency limits
//! - Observability (logging, metrics, request ids)

mod extract;
mod handlers;
mod middleware;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use newsboard_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        "Starting Newsboard API Gateway v{}",
        newsboard_common::VERSION
    );

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!(%metrics_addr, "Prometheus exporter listening");
    }

    // Initialize database connection
    info!(read_url_configured = config.database.read_url.is_some(), "Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let state = AppState {
        config: config.clone(),
        db,
    };
    let app = create_router(state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Bound the drain after a shutdown signal
    let shutdown = Arc::new(Notify::new());
    let signalled = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signalled.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = shutdown.notified() => {
            match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    timeout_secs = config.server.shutdown_timeout_secs,
                    "Graceful shutdown timed out, dropping open connections"
                ),
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut app = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Endpoint descriptor
        .route("/api", get(handlers::api::endpoints))

        // Topics and users
        .route(
            "/api/topics",
            get(handlers::topics::list_topics).post(handlers::topics::create_topic),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{username}",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )

        // Articles
        .route(
            "/api/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/api/articles/{article_id}",
            get(handlers::articles::get_article)
                .patch(handlers::articles::vote_on_article)
                .delete(handlers::articles::delete_article),
        )

        // Comments
        .route(
            "/api/articles/{article_id}/comments",
            get(handlers::comments::list_comments).post(handlers::comments::create_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            patch(handlers::comments::vote_on_comment).delete(handlers::comments::delete_comment),
        )
        .route_layer(from_fn(middleware::metrics::track_metrics))
        .method_not_allowed_fallback(handlers::not_found)
        .fallback(handlers::not_found);

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(&state.config.rate_limit);
        app = app.layer(from_fn_with_state(limiter, middleware::rate_limit::rate_limit));
    }

    app.layer(ConcurrencyLimitLayer::new(state.config.server.max_concurrent_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use newsboard_common::config::RateLimitConfig;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult};
    use tower::ServiceExt;

    fn app_with(db: MockDatabase) -> Router {
        create_router(AppState {
            config: Arc::new(AppConfig::default()),
            db: DbPool::from_connection(db.into_connection()),
        })
    }

    /// Router whose database fails every call; proves a request never reached storage
    fn app() -> Router {
        app_with(MockDatabase::new(DbBackend::Postgres))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_endpoint_descriptor() {
        let (status, body) = send(app(), Method::GET, "/api", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("GET /api/topics").is_some());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(app(), Method::GET, "/api/not-a-route", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Not found");
    }

    #[tokio::test]
    async fn test_unsupported_method_on_known_path() {
        for (method, uri) in [
            (Method::PUT, "/api/articles"),
            (Method::DELETE, "/api/topics"),
            (Method::GET, "/api/comments/1"),
        ] {
            let (status, body) = send(app(), method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["msg"], "Not found");
        }
    }

    #[tokio::test]
    async fn test_invalid_listing_queries_never_reach_storage() {
        let cases = [
            ("/api/articles?sort_by=body", "invalid query: sort_by"),
            ("/api/articles?order=sideways", "invalid query: order"),
            ("/api/articles?limit=-1", "negative limit number"),
            ("/api/articles?p=-1", "negative page number"),
            ("/api/articles?limit=ten", "invalid input"),
            ("/api/articles/1/comments?p=0", "negative page number"),
        ];

        for (uri, message) in cases {
            let (status, body) = send(app(), Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["msg"], message, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_non_integer_ids() {
        let (status, body) = send(app(), Method::GET, "/api/articles/banana", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "invalid input");

        let (status, _) = send(app(), Method::DELETE, "/api/comments/one", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_integer_vote_increment() {
        let (status, body) = send(
            app(),
            Method::PATCH,
            "/api/articles/1",
            Some(r#"{"inc_votes": "sausage"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "invalid input");

        let (status, _) = send(app(), Method::PATCH, "/api/comments/1", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comment_with_non_string_body() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/api/articles/1/comments",
            Some(r#"{"username": "butter_bridge", "body": 10}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "invalid input");
    }

    #[tokio::test]
    async fn test_delete_missing_comment() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 0 }]);

        let (status, body) = send(app_with(db), Method::DELETE, "/api/comments/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "comment 5 does not exist");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_article_returns_no_content() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }]);

        let (status, body) = send(app_with(db), Method::DELETE, "/api/articles/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_storage_failure_is_opaque() {
        let (status, body) = send(app(), Method::GET, "/api/topics", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["msg"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_readiness_reports_database_down() {
        let (status, body) = send(app(), Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["database"]["status"], "down");

        let (status, _) = send(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_past_burst() {
        let config = AppConfig {
            rate_limit: RateLimitConfig {
                requests_per_second: 1,
                burst: 1,
                enabled: true,
            },
            ..AppConfig::default()
        };
        let app = create_router(AppState {
            config: Arc::new(config),
            db: DbPool::from_connection(MockDatabase::new(DbBackend::Postgres).into_connection()),
        });

        let (status, _) = send(app.clone(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["msg"], "too many requests");
    }
}
