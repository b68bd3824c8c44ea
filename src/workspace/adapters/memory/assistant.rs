//! Scripted assistant for deterministic planning.

use crate::workspace::ports::{AssistantError, AssistantPort, AssistantResult};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Unavailable(String),
}

/// Assistant that answers every prompt with a fixed script and records the
/// prompts it received.
#[derive(Debug, Clone)]
pub struct ScriptedAssistant {
    script: Script,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl ScriptedAssistant {
    /// Creates an assistant that always replies with `reply`.
    #[must_use]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(reply.into()),
            prompts: Arc::default(),
        }
    }

    /// Creates an assistant that is never available.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            script: Script::Unavailable(reason.into()),
            prompts: Arc::default(),
        }
    }

    /// Returns the prompts received so far.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn prompts(&self) -> AssistantResult<Vec<String>> {
        self.prompts
            .read()
            .map(|prompts| prompts.clone())
            .map_err(|err| AssistantError::runtime(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl AssistantPort for ScriptedAssistant {
    async fn complete(&self, prompt: &str) -> AssistantResult<String> {
        self.prompts
            .write()
            .map_err(|err| AssistantError::runtime(std::io::Error::other(err.to_string())))?
            .push(prompt.to_owned());
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Unavailable(reason) => Err(AssistantError::Unavailable(reason.clone())),
        }
    }
}
