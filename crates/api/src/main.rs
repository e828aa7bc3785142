use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradepulse_core::llm::openai::OpenAiClient;
use tradepulse_core::news::newsapi::NewsApiClient;
use tradepulse_core::storage::users::{PgUserRepository, UserRepository};

mod error;
mod handlers;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradepulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match tradepulse_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let news = NewsApiClient::from_settings(&settings)?;
    let llm = OpenAiClient::from_settings(&settings)?;
    tracing::info!(model = llm.model(), "chat client ready");

    let state = AppState {
        users: pool.map(|p| Arc::new(PgUserRepository::new(p)) as Arc<dyn UserRepository>),
        news: Arc::new(news),
        llm: Arc::new(llm),
        expose_error_details: settings.expose_error_details,
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/news-sentiment", get(handlers::news_sentiment))
        .route("/summarize-week", post(handlers::summarize_week));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tradepulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tradepulse_core::domain::news::NewsArticle;
    use tradepulse_core::domain::user::User;
    use tradepulse_core::testing::{FakeChat, FakeNews, FakeUsers};

    fn app(news: FakeNews, chat: FakeChat) -> Router {
        let users = FakeUsers::ok(vec![User {
            id: 7,
            username: "trader".to_string(),
        }]);
        router(AppState::with_fakes(Some(users), news, chat))
    }

    fn request(method: Method, uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (status, body) = send(
            app(FakeNews::articles(vec![]), FakeChat::reply("")),
            request(Method::GET, "/healthz", None, ""),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn users_route_lists_rows() {
        let (status, body) = send(
            app(FakeNews::articles(vec![]), FakeChat::reply("")),
            request(Method::GET, "/api/users", None, ""),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!([{"id": 7, "username": "trader"}]));
    }

    #[tokio::test]
    async fn news_sentiment_route_reads_query() {
        let news = FakeNews::articles(vec![NewsArticle {
            title: Some("GBP rallies".to_string()),
            description: Some("Pound strengthens on data".to_string()),
            url: Some("https://x".to_string()),
            published_at: Some("2024-01-01".to_string()),
        }]);

        let (status, body) = send(
            app(news.clone(), FakeChat::reply("Positive")),
            request(
                Method::GET,
                "/api/news-sentiment?symbol=GBPUSD&count=3",
                None,
                "",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({
                "title": "GBP rallies",
                "sentiment": "positive",
                "description": "Pound strengthens on data",
                "url": "https://x",
                "publishedAt": "2024-01-01",
            })
        );
        assert_eq!(news.queries()[0].q, "GBPUSD forex trading currency");
        assert_eq!(news.queries()[0].page_size, 3);
    }

    #[tokio::test]
    async fn duplicate_query_keys_are_json_500() {
        let news = FakeNews::articles(vec![]);

        let (status, body) = send(
            app(news.clone(), FakeChat::reply("")),
            request(Method::GET, "/api/news-sentiment?count=1&count=2", None, ""),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body)["error"], "Internal server error");
        assert!(news.queries().is_empty());
    }

    #[tokio::test]
    async fn summarize_week_route_round_trip() {
        let chat = FakeChat::reply(" Good week. ");

        let (status, body) = send(
            app(FakeNews::articles(vec![]), chat.clone()),
            request(
                Method::POST,
                "/api/summarize-week",
                Some("application/json"),
                r#"{"trade_data":[{"symbol":"EURUSD","sentiment":"positive","result":"win"}]}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"summary": "Good week."}));
        assert_eq!(chat.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_trade_data_is_400() {
        let chat = FakeChat::reply("unused");

        let (status, body) = send(
            app(FakeNews::articles(vec![]), chat.clone()),
            request(
                Method::POST,
                "/api/summarize-week",
                Some("application/json"),
                r#"{"trade_data":[]}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body), json!({"error": "No trade data provided"}));
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn unreadable_bodies_are_json_500() {
        let cases = [
            (Some("application/json"), "not json"),
            (None, r#"{"trade_data":[{"symbol":"EURUSD"}]}"#),
            (Some("text/plain"), r#"{"trade_data":[{"symbol":"EURUSD"}]}"#),
            (Some("application/json"), "[]"),
        ];
        for (content_type, raw) in cases {
            let chat = FakeChat::reply("unused");

            let (status, body) = send(
                app(FakeNews::articles(vec![]), chat.clone()),
                request(Method::POST, "/api/summarize-week", content_type, raw),
            )
            .await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body {raw:?}");
            assert_eq!(json_body(&body)["error"], "Internal server error");
            assert!(chat.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn routes_reject_wrong_methods() {
        for (method, uri) in [
            (Method::GET, "/api/summarize-week"),
            (Method::POST, "/api/users"),
            (Method::POST, "/api/news-sentiment"),
        ] {
            let (status, _) = send(
                app(FakeNews::articles(vec![]), FakeChat::reply("")),
                request(method.clone(), uri, None, ""),
            )
            .await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        }
    }
}
