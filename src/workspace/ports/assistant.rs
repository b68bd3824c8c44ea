//! Assistant port for turning prompts into text completions.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for assistant operations.
pub type AssistantResult<T> = Result<T, AssistantError>;

/// One-shot completion contract.
#[async_trait]
pub trait AssistantPort: Send + Sync {
    /// Returns the assistant's raw reply to a prompt.
    async fn complete(&self, prompt: &str) -> AssistantResult<String>;
}

/// Errors returned by assistant adapters.
#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    /// The assistant is not installed, not authenticated, or disabled.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    /// The assistant failed while producing a reply.
    #[error("assistant runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl AssistantError {
    /// Wraps a runtime error from the assistant adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
