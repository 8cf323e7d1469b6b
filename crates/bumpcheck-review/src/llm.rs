use std::time::Duration;

use async_trait::async_trait;
use bumpcheck_core::{BumpcheckError, LlmSettings};
use serde::Serialize;

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use bumpcheck_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Analyze this update".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation. Requests only ever carry the prompt as
/// a single user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input.
    User,
}

/// Sampling parameters sent with a completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// A text-in, text-out completion endpoint.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `prompt`, returning the generated text.
    async fn complete(
        &self,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, BumpcheckError>;
}

/// OpenAI-compatible chat completions client.
///
/// Works with any server exposing `/v1/chat/completions`, including vLLM
/// and LiteLLM. Transport timeouts live here; nothing is retried.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::{LlmSettings, Provider};
/// use bumpcheck_review::llm::LlmClient;
///
/// let settings = LlmSettings {
///     provider: Provider::Vllm,
///     base_url: "http://localhost:8000/v1".into(),
///     api_key: None,
///     model: "qwen3".into(),
/// };
/// let client = LlmClient::new(&settings).unwrap();
/// assert_eq!(client.endpoint(), "http://localhost:8000/v1/chat/completions");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    settings: LlmSettings,
}

impl LlmClient {
    /// Create a new LLM client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Completion`] if the HTTP client cannot be built.
    pub fn new(settings: &LlmSettings) -> Result<Self, BumpcheckError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| {
                BumpcheckError::Completion(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Return the model name from the settings.
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Full URL of the chat completions route.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }

    fn request_body(&self, prompt: &str, params: SamplingParams) -> serde_json::Value {
        let messages = vec![ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];
        serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, BumpcheckError> {
        let url = self.endpoint();
        let body = self.request_body(prompt, params);

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.settings.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| BumpcheckError::Completion(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(BumpcheckError::Completion(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BumpcheckError::Completion(format!("failed to parse response: {e}")))?;

        extract_content(&response_body)
    }
}

fn extract_content(response_body: &serde_json::Value) -> Result<String, BumpcheckError> {
    let content = response_body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            BumpcheckError::Completion(format!("unexpected response structure: {response_body}"))
        })?;

    if content.trim().is_empty() {
        return Err(BumpcheckError::Completion(
            "completion service returned no content".into(),
        ));
    }

    Ok(content.to_string())
}
