pub mod newsapi;

use crate::domain::news::NewsArticle;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub q: String,
    pub page_size: u32,
    pub language: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsSearchResponse {
    #[serde(default)]
    pub articles: Option<Vec<NewsArticle>>,
}

impl NewsSearchResponse {
    pub fn first_article(&self) -> Option<&NewsArticle> {
        self.articles.as_ref().and_then(|a| a.first())
    }
}

/// Returned when the provider answers with a non-success HTTP status.
#[derive(Debug, Clone)]
pub struct NewsApiStatusError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for NewsApiStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "news provider HTTP {}", self.status)
    }
}

impl std::error::Error for NewsApiStatusError {}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Newest-first search. A non-success status surfaces as `NewsApiStatusError`.
    async fn search(&self, query: &NewsQuery) -> anyhow::Result<NewsSearchResponse>;
}
