use crate::domain::trade::TradeRecord;
use crate::llm::{ChatClient, ChatRequest};
use std::fmt::Write as _;

const DIGEST_HEADER: &str = "Trading week summary:";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are a trading performance analyst. Provide a concise summary of the trading week based on the provided trade data. Focus on patterns, sentiment trends, and overall performance. Keep it under 200 words.";

/// One header line, then one line per trade in input order. Every line,
/// including the last, ends with a newline.
pub fn render_digest(trades: &[TradeRecord]) -> String {
    let mut out = String::with_capacity(DIGEST_HEADER.len() + 1 + trades.len() * 48);
    out.push_str(DIGEST_HEADER);
    out.push('\n');
    for trade in trades {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "- {}: {} sentiment, Result: {}",
            trade.symbol(),
            trade.sentiment(),
            trade.result()
        );
    }
    out
}

/// Asks the model for a short prose summary of `trades`. The caller must reject
/// an empty list before calling; model errors are returned as-is.
pub async fn summarize_week(
    llm: &dyn ChatClient,
    trades: &[TradeRecord],
) -> anyhow::Result<String> {
    anyhow::ensure!(!trades.is_empty(), "trades must be non-empty");

    let req = ChatRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: render_digest(trades),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    let reply = llm.complete(req).await?;
    tracing::info!(trades = trades.len(), "generated week summary");
    Ok(reply.trim().to_string())
}
