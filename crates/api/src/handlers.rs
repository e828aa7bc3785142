use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tradepulse_core::analysis::sentiment::{
    self, NewsSentimentOutcome, DEFAULT_COUNT, DEFAULT_SYMBOL, NO_NEWS_TITLE,
};
use tradepulse_core::analysis::summary;
use tradepulse_core::domain::news::Sentiment;
use tradepulse_core::domain::trade::TradeRecord;
use tradepulse_core::domain::user::User;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let Some(users) = &state.users else {
        return Err(ApiError::Unavailable("database not configured"));
    };

    let users = users
        .list_all()
        .await
        .map_err(|e| ApiError::internal(e, state.expose_error_details))?;

    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct NewsSentimentParams {
    symbol: Option<String>,
    // Parsed by hand so a malformed value reports like any other internal failure.
    count: Option<String>,
}

#[derive(Debug, Serialize)]
struct NoNewsBody {
    title: &'static str,
    sentiment: Sentiment,
}

/// GET /api/news-sentiment?symbol=EURUSD&count=1
pub async fn news_sentiment(
    State(state): State<AppState>,
    params: Result<Query<NewsSentimentParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::internal(
            anyhow::anyhow!(rejection.body_text()).context("invalid query string"),
            state.expose_error_details,
        )
    })?;
    let symbol = params.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL);
    let count = match params.count.as_deref() {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid count: {raw:?}"))
            .map_err(|e| ApiError::internal(e, state.expose_error_details))?,
        None => DEFAULT_COUNT,
    };

    let outcome = sentiment::news_sentiment(state.news.as_ref(), state.llm.as_ref(), symbol, count)
        .await
        .map_err(|e| ApiError::internal(e, state.expose_error_details))?;

    match outcome {
        NewsSentimentOutcome::Found(found) => Ok(Json(found).into_response()),
        NewsSentimentOutcome::NoNews => Ok(Json(NoNewsBody {
            title: NO_NEWS_TITLE,
            sentiment: Sentiment::Neutral,
        })
        .into_response()),
        NewsSentimentOutcome::UpstreamStatus(code) => Err(ApiError::NewsUpstream(code)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SummarizeWeekRequest {
    #[serde(default)]
    trade_data: Option<Vec<TradeRecord>>,
}

impl SummarizeWeekRequest {
    // serde would also accept a JSON array for this struct; only an object is a valid body.
    fn from_body(body: Value) -> anyhow::Result<Self> {
        anyhow::ensure!(body.is_object(), "request body must be a JSON object");
        serde_json::from_value(body).context("invalid trade_data")
    }
}

#[derive(Debug, Serialize)]
pub struct SummarizeWeekResponse {
    summary: String,
}

/// POST /api/summarize-week
pub async fn summarize_week(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SummarizeWeekResponse>, ApiError> {
    let req = payload
        .map_err(|rejection| anyhow::anyhow!(rejection.body_text()).context("invalid request body"))
        .and_then(|Json(body)| SummarizeWeekRequest::from_body(body))
        .map_err(|e| ApiError::internal(e, state.expose_error_details))?;

    let trades = req.trade_data.unwrap_or_default();
    if trades.is_empty() {
        return Err(ApiError::BadRequest("No trade data provided"));
    }

    let summary = summary::summarize_week(state.llm.as_ref(), &trades)
        .await
        .map_err(|e| ApiError::summary_failed(e, state.expose_error_details))?;

    Ok(Json(SummarizeWeekResponse { summary }))
}
