use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{ChatClient, ChatRequest, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    // Checked per call so the server can start without credentials.
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key().ok().map(str::to_string);
        if api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY missing; model calls will fail");
        }

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, req: ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: req.system,
                },
                Message {
                    role: "user",
                    content: req.user,
                },
            ],
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        }
    }

    async fn create_completion(
        &self,
        body: &ChatCompletionRequest,
    ) -> anyhow::Result<(String, ChatCompletionResponse)> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY is required")?;

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                provider: Provider::OpenAI,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&text)
            .with_context(|| format!("failed to decode OpenAI response: {text}"))?;
        Ok((text, parsed))
    }

    /// Content of the first choice. A missing choice or a null content (e.g. a
    /// content-filter stop) is a decode error carrying the raw body.
    fn response_text(res: ChatCompletionResponse, raw_text: &str) -> anyhow::Result<String> {
        let decode_error = |detail: String| LlmDiagnosticsError {
            provider: Provider::OpenAI,
            stage: "decode",
            detail,
            raw_output: Some(raw_text.to_string()),
        };

        let choice = res
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| decode_error("response has no choices".to_string()))?;

        match choice.message.content {
            Some(content) => Ok(content),
            None => Err(decode_error(format!(
                "first choice has no content (finish_reason={})",
                choice.finish_reason.as_deref().unwrap_or("none")
            ))
            .into()),
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: ChatRequest) -> anyhow::Result<String> {
        let body = self.build_request(req);
        let (raw_text, res) = self.create_completion(&body).await?;
        if let Some(reason) = res.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            tracing::debug!(model = %self.model, finish_reason = reason, "chat completion finished");
        }
        Self::response_text(res, &raw_text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
