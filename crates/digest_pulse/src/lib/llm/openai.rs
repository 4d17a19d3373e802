use digest_datastore::Transcript;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;

use crate::{criteria::LengthBounds, Summarizer};

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("HTTP error: {0}")]
    Response(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    #[error("No content in completion response")]
    EmptyCompletion,
}

impl OpenAIClient {
    const SYSTEM_PROMPT: &str = include_str!("./prompts/summary_system.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn system_prompt(bounds: LengthBounds) -> String {
        Self::SYSTEM_PROMPT
            .replace("{min_words}", &bounds.min_words.to_string())
            .replace("{max_words}", &bounds.max_words.to_string())
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        system_prompt: impl Into<String>,
        user_content: impl Into<String>,
        max_tokens: usize,
    ) -> Result<CompletionResponse, ModelError> {
        let body = serde_json::json!({
            "model": model_name.into(),
            "max_tokens": max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt.into()
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

/// Cuts `text` down to at most `limit` tokens of the `cl100k_base` encoding
pub fn truncate_to_tokens(text: &str, limit: usize) -> Result<String, ModelError> {
    let bpe = another_tiktoken_rs::cl100k_base()
        .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= limit {
        return Ok(text.to_string());
    }

    tracing::warn!(
        tokens = tokens.len(),
        limit,
        "Transcript exceeds context window, truncating"
    );
    bpe.decode(tokens[..limit].to_vec())
        .map_err(|e| ModelError::Tokenizer(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";
    type Error = ModelError;

    #[tracing::instrument(skip_all, fields(video_id = %transcript.video_id))]
    async fn summarize(
        &self,
        transcript: &Transcript,
        bounds: LengthBounds,
    ) -> Result<String, Self::Error> {
        // too short to condense any further
        if transcript.word_count() < bounds.min_words {
            tracing::warn!(
                words = transcript.word_count(),
                min_words = bounds.min_words,
                "Transcript is too short to summarize"
            );
            return Ok(transcript.text.trim().to_string());
        }

        let content = truncate_to_tokens(&transcript.text, Self::CONTEXT_WINDOW_LIMIT)?;
        // roughly two tokens per word leaves room to finish the last sentence
        let max_tokens = bounds.max_words * 2;

        let response = self
            .send_completion_request(
                Self::SUMMARIZER_MODEL,
                Self::system_prompt(bounds),
                content,
                max_tokens,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ModelError::EmptyCompletion)?;

        tracing::info!(words = summary.split_whitespace().count(), "Generated summary");
        Ok(summary)
    }
}
