use crate::llm::Provider;
use std::fmt;

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

impl LlmDiagnosticsError {
    /// Upstream body attached to `err`, if it is an `LlmDiagnosticsError` that kept one.
    pub fn raw_output_of(err: &anyhow::Error) -> Option<&str> {
        err.downcast_ref::<LlmDiagnosticsError>()
            .and_then(|diag| diag.raw_output.as_deref())
    }
}
