use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(String),
    #[error("provider call timed out")]
    Timeout,
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

/// External semantic analysis capability: one request/response exchange per
/// conversation. Input is the combined conversation text, output is the
/// provider's textual verdict payload.
#[async_trait]
pub trait SemanticProvider: Send + Sync {
    async fn analyze(&self, conversation: &str) -> Result<String, ProviderError>;

    fn provider_name(&self) -> &'static str;
}
