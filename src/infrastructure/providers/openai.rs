use crate::domain::ports::semantic_provider::{ProviderError, SemanticProvider};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SYSTEM_PROMPT: &str = r#"You analyze customer service conversations for a travel and services company.

Classify the conversation on two axes:
1. service_type: Flight, Hotel, Visa, eSIM, Wallet, or Other
2. category: Cancellation, Modify, Top_Up, Withdraw, Order_Recheck, Pre_Purchase, or Others

Respond with a single JSON object and nothing else:
{"service_type": "...", "category": "...", "confidence": 0.0-1.0, "reasoning": "...", "key_phrases": ["..."]}

Understand the customer's actual intent, not just the words used. If the conversation is ambiguous, lower the confidence and use Other/Others."#;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Semantic analysis over an OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl SemanticProvider for OpenAiProvider {
    async fn analyze(&self, conversation: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("Analyze this customer conversation: {conversation}")},
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::UnexpectedResponse("completion carried no choices".to_string())
            })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
