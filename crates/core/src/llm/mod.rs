pub mod error;
pub mod openai;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
}

/// A single-turn chat completion: one system instruction, one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the text of the first choice, untrimmed.
    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String>;
}
