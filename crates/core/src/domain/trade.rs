use serde::{Deserialize, Serialize};

pub const DEFAULT_SYMBOL: &str = "Unknown";
pub const DEFAULT_SENTIMENT: &str = "neutral";
pub const DEFAULT_RESULT: &str = "unknown";

/// A journal entry supplied by the caller. Fields are free text and each one
/// falls back to its own default when absent or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl TradeRecord {
    pub fn symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL)
    }

    pub fn sentiment(&self) -> &str {
        self.sentiment.as_deref().unwrap_or(DEFAULT_SENTIMENT)
    }

    pub fn result(&self) -> &str {
        self.result.as_deref().unwrap_or(DEFAULT_RESULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_per_field() {
        let t: TradeRecord =
            serde_json::from_value(json!({"symbol": "EURUSD", "result": null, "notes": "x"}))
                .unwrap();
        assert_eq!(t.symbol(), "EURUSD");
        assert_eq!(t.sentiment(), DEFAULT_SENTIMENT);
        assert_eq!(t.result(), DEFAULT_RESULT);

        let empty: TradeRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.symbol(), DEFAULT_SYMBOL);
    }
}
