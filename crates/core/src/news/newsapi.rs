use crate::config::Settings;
use crate::news::{NewsApiStatusError, NewsProvider, NewsQuery, NewsSearchResponse};
use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const EVERYTHING_PATH: &str = "/v2/everything";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SORT_BY: &str = "publishedAt";

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.news_api_key_or_demo().to_string();
        let base_url =
            std::env::var("NEWS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("NEWS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build news api http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), EVERYTHING_PATH)
    }

    fn params(&self, query: &NewsQuery) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.q.clone()),
            ("sortBy", SORT_BY.to_string()),
            ("pageSize", query.page_size.to_string()),
            ("apiKey", self.api_key.clone()),
            ("language", query.language.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn search(&self, query: &NewsQuery) -> Result<NewsSearchResponse> {
        let res = self
            .http
            .get(self.url())
            .query(&self.params(query))
            .send()
            .await
            .context("news api request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read news api response")?;

        // Only 200 carries a usable article list; other 2xx codes count as upstream errors too.
        if status != reqwest::StatusCode::OK {
            tracing::warn!(
                status = status.as_u16(),
                q = %query.q,
                body = %text,
                "news api returned non-200 status"
            );
            return Err(NewsApiStatusError {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        serde_json::from_str::<NewsSearchResponse>(&text)
            .with_context(|| format!("news api response is not valid JSON: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;
    use serde_json::json;

    #[test]
    fn builds_everything_query_params() {
        let client = NewsApiClient {
            http: reqwest::Client::new(),
            base_url: "https://newsapi.org/".to_string(),
            api_key: "demo_key".to_string(),
        };
        let query = NewsQuery {
            q: "EURUSD forex trading currency".to_string(),
            page_size: 3,
            language: "en",
        };

        assert_eq!(client.url(), "https://newsapi.org/v2/everything");
        assert_eq!(
            client.params(&query),
            vec![
                ("q", "EURUSD forex trading currency".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", "3".to_string()),
                ("apiKey", "demo_key".to_string()),
                ("language", "en".to_string()),
            ]
        );
    }

    fn client_at(base_url: String) -> NewsApiClient {
        NewsApiClient {
            http: reqwest::Client::new(),
            base_url,
            api_key: "demo_key".to_string(),
        }
    }

    fn eurusd() -> NewsQuery {
        NewsQuery {
            q: "EURUSD forex trading currency".to_string(),
            page_size: 1,
            language: "en",
        }
    }

    #[tokio::test]
    async fn ok_status_decodes_articles() {
        let base = serve_once(200, r#"{"status":"ok","articles":[{"title":"t"}]}"#).await;

        let res = client_at(base).search(&eurusd()).await.unwrap();

        assert_eq!(res.first_article().unwrap().title.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn non_200_statuses_become_status_errors() {
        let cases = [
            (401, r#"{"status":"error","code":"apiKeyInvalid"}"#),
            (203, r#"{"status":"ok","articles":[{"title":"t"}]}"#),
            (204, ""),
        ];
        for (status, body) in cases {
            let base = serve_once(status, body).await;

            let err = client_at(base).search(&eurusd()).await.unwrap_err();

            let status_err = err
                .downcast_ref::<NewsApiStatusError>()
                .unwrap_or_else(|| panic!("status {status} gave {err:#}"));
            assert_eq!(status_err.status, status);
            assert_eq!(status_err.body, body);
        }
    }

    #[test]
    fn parses_search_response_shape() {
        let v = json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Wire"},
                "title": "GBP rallies",
                "description": "Pound strengthens on data",
                "url": "https://x",
                "publishedAt": "2024-01-01"
            }]
        });
        let parsed: NewsSearchResponse = serde_json::from_value(v).unwrap();
        let first = parsed.first_article().unwrap();
        assert_eq!(first.title.as_deref(), Some("GBP rallies"));
        assert_eq!(first.url.as_deref(), Some("https://x"));
    }

    #[test]
    fn missing_articles_means_no_first_article() {
        let parsed: NewsSearchResponse = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(parsed.first_article().is_none());
        let parsed: NewsSearchResponse =
            serde_json::from_value(json!({"articles": null})).unwrap();
        assert!(parsed.first_article().is_none());
    }
}
