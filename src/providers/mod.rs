mod anthropic;
mod factory;
mod fallback;
mod open_ai;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use open_ai::OpenAIProvider;

use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Opaque chat-completion capability injected into the recovery stage
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send the messages and return the assistant's text reply
    async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}
