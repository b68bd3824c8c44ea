//! Turns a task description into a work plan.

use crate::workspace::{
    domain::{TaskDescription, WorkPlan},
    ports::AssistantPort,
};
use minijinja::Environment;
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

const PLAN_PROMPT: &str = "\
Name a unit of software work.
Reply with a single JSON object with the string fields \"branch\", \"title\" and \"body\".
- branch: a short git branch name such as feat/dark-mode-toggle
- title: a conventional-commit style review request title
- body: a short description of the intended change

Task:
{{ task }}";

#[derive(Serialize)]
struct PromptContext<'a> {
    task: &'a str,
}

/// Where a plan came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    /// The assistant proposed it.
    Assistant,
    /// It was derived locally because the assistant could not be used.
    Fallback {
        /// Why the assistant's plan was not used.
        reason: String,
    },
}

/// A work plan and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWork {
    /// The plan.
    pub plan: WorkPlan,
    /// Where it came from.
    pub source: PlanSource,
}

/// Asks the assistant for a plan and falls back to a deterministic one.
pub struct WorkPlanner<A, C>
where
    A: AssistantPort,
    C: Clock + Send + Sync,
{
    assistant: Arc<A>,
    clock: Arc<C>,
}

impl<A, C> WorkPlanner<A, C>
where
    A: AssistantPort,
    C: Clock + Send + Sync,
{
    /// Creates a planner.
    #[must_use]
    pub const fn new(assistant: Arc<A>, clock: Arc<C>) -> Self {
        Self { assistant, clock }
    }

    /// Plans work for a task. Never fails: any assistant or parse failure
    /// yields [`WorkPlan::fallback`].
    pub async fn plan(&self, task: &TaskDescription) -> PlannedWork {
        match self.ask_assistant(task).await {
            Ok(plan) => PlannedWork {
                plan,
                source: PlanSource::Assistant,
            },
            Err(reason) => {
                warn!(reason = %reason, "assistant plan unavailable; using fallback");
                PlannedWork {
                    plan: WorkPlan::fallback(task, self.clock.utc()),
                    source: PlanSource::Fallback { reason },
                }
            }
        }
    }

    async fn ask_assistant(&self, task: &TaskDescription) -> Result<WorkPlan, String> {
        let prompt = Environment::new()
            .render_str(PLAN_PROMPT, PromptContext { task: task.as_str() })
            .map_err(|err| err.to_string())?;
        let reply = self
            .assistant
            .complete(&prompt)
            .await
            .map_err(|err| err.to_string())?;
        WorkPlan::parse_response(&reply).map_err(|err| err.to_string())
    }
}
