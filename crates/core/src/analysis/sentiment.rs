use crate::domain::news::{NewsArticle, Sentiment};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{ChatClient, ChatRequest};
use crate::news::{NewsApiStatusError, NewsProvider, NewsQuery};
use serde::Serialize;

pub const DEFAULT_SYMBOL: &str = "EURUSD";
pub const DEFAULT_COUNT: u32 = 1;
pub const NO_NEWS_TITLE: &str = "No recent news found";

const QUERY_SUFFIX: &str = "forex trading currency";
const LANGUAGE: &str = "en";
const MAX_TOKENS: u32 = 10;
const TEMPERATURE: f32 = 0.0;

const SYSTEM_PROMPT: &str = "You are a financial sentiment analyzer. Analyze the sentiment of the given news text and respond with only one word: 'positive', 'negative', or 'neutral'.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsSentiment {
    pub title: String,
    pub sentiment: Sentiment,
    pub description: String,
    pub url: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsSentimentOutcome {
    Found(NewsSentiment),
    NoNews,
    /// The news provider answered with this non-success HTTP status.
    UpstreamStatus(u16),
}

pub fn search_query(symbol: &str) -> String {
    format!("{symbol} {QUERY_SUFFIX}")
}

/// Looks up the newest article for `symbol` and labels it.
///
/// Only the first article is classified; `count` is forwarded to the provider as
/// its page size. A failed model call degrades to `Sentiment::Neutral`, while a
/// failed news lookup is reported through the outcome or the error.
pub async fn news_sentiment(
    news: &dyn NewsProvider,
    llm: &dyn ChatClient,
    symbol: &str,
    count: u32,
) -> anyhow::Result<NewsSentimentOutcome> {
    let query = NewsQuery {
        q: search_query(symbol),
        page_size: count,
        language: LANGUAGE,
    };

    let response = match news.search(&query).await {
        Ok(response) => response,
        Err(err) => {
            if let Some(status) = err.downcast_ref::<NewsApiStatusError>() {
                tracing::warn!(%symbol, status = status.status, body = %status.body, "news lookup rejected upstream");
                return Ok(NewsSentimentOutcome::UpstreamStatus(status.status));
            }
            return Err(err);
        }
    };

    let Some(article) = response.first_article() else {
        tracing::info!(%symbol, provider = news.provider_name(), "no articles for symbol");
        return Ok(NewsSentimentOutcome::NoNews);
    };

    let sentiment = classify(llm, article).await;
    tracing::info!(%symbol, %sentiment, "classified news sentiment");

    Ok(NewsSentimentOutcome::Found(NewsSentiment {
        title: article.title_or_empty().to_string(),
        sentiment,
        description: article.description_or_empty().to_string(),
        url: article.url.clone().unwrap_or_default(),
        published_at: article.published_at.clone().unwrap_or_default(),
    }))
}

pub async fn classify(llm: &dyn ChatClient, article: &NewsArticle) -> Sentiment {
    let req = ChatRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: article.analysis_text(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    match llm.complete(req).await {
        Ok(reply) => Sentiment::from_model_reply(&reply),
        Err(err) => {
            tracing::warn!(
                provider = ?llm.provider(),
                error = %err,
                raw_output = LlmDiagnosticsError::raw_output_of(&err).unwrap_or(""),
                "sentiment model call failed; using neutral"
            );
            Sentiment::Neutral
        }
    }
}
