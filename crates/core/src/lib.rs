pub mod analysis;
pub mod domain;
pub mod llm;
pub mod news;
pub mod storage;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub mod config {
    use anyhow::Context;

    pub const DEMO_NEWS_API_KEY: &str = "demo_key";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub news_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub expose_error_details: bool,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                news_api_key: std::env::var("NEWS_API_KEY").ok(),
                openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                expose_error_details: std::env::var("EXPOSE_ERROR_DETAILS")
                    .ok()
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        /// NewsAPI rejects the placeholder key, but requests still go out so the
        /// upstream status reaches the caller.
        pub fn news_api_key_or_demo(&self) -> &str {
            self.news_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .unwrap_or(DEMO_NEWS_API_KEY)
        }
    }

    fn parse_flag(v: &str) -> bool {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    }

}
