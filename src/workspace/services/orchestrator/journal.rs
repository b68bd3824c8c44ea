//! Step outcomes recorded while a workflow runs.

use serde::Serialize;
use std::fmt;

/// A single stage of a workspace workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Validate the caller's input.
    ValidateInput,
    /// Derive branch, title and body for new work.
    PlanWork,
    /// Look up an existing review request.
    FetchReviewRequest,
    /// Make sure the clone directory is free.
    CheckCloneTarget,
    /// Clone the repository.
    CloneRepository,
    /// Create and check out the work branch.
    CreateBranch,
    /// Record the empty opening commit.
    CommitEmpty,
    /// Push the work branch with upstream tracking.
    PushBranch,
    /// Open the review request.
    CreateReviewRequest,
    /// Move the clone to its final directory.
    PlaceClone,
    /// Read project guidelines from the clone.
    ReadGuidelines,
    /// Create the workspace session.
    CreateSession,
    /// Hand the work over to the assistant.
    Handover,
    /// Close the review request.
    CloseReviewRequest,
    /// Destroy the workspace session.
    DestroySession,
    /// Remove the clone directory.
    RemoveClone,
}

impl WorkflowStep {
    /// Returns a human-readable stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidateInput => "validate input",
            Self::PlanWork => "plan work",
            Self::FetchReviewRequest => "fetch review request",
            Self::CheckCloneTarget => "check clone target",
            Self::CloneRepository => "clone repository",
            Self::CreateBranch => "create branch",
            Self::CommitEmpty => "create empty commit",
            Self::PushBranch => "push branch",
            Self::CreateReviewRequest => "create review request",
            Self::PlaceClone => "place clone",
            Self::ReadGuidelines => "read guidelines",
            Self::CreateSession => "create session",
            Self::Handover => "hand over",
            Self::CloseReviewRequest => "close review request",
            Self::DestroySession => "destroy session",
            Self::RemoveClone => "remove clone",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// The step ran and its side effects landed.
    Completed {
        /// What the step did.
        detail: String,
    },
    /// The step had nothing to do.
    Skipped {
        /// Why nothing was done.
        reason: String,
    },
}

/// A step together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// The step.
    pub step: WorkflowStep,
    /// Its outcome.
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Ordered record of the steps a workflow got through.
///
/// Because completed steps are never rolled back, the journal of a failed
/// workflow lists exactly the side effects that remain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepJournal {
    records: Vec<StepRecord>,
}

impl StepJournal {
    /// Creates an empty journal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Records a completed step.
    pub fn complete(&mut self, step: WorkflowStep, detail: impl Into<String>) {
        self.records.push(StepRecord {
            step,
            status: StepStatus::Completed {
                detail: detail.into(),
            },
        });
    }

    /// Records a skipped step.
    pub fn skip(&mut self, step: WorkflowStep, reason: impl Into<String>) {
        self.records.push(StepRecord {
            step,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
        });
    }

    /// Returns the records in execution order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> Vec<WorkflowStep> {
        self.records.iter().map(|record| record.step).collect()
    }

    /// Returns the outcome of a step, if it was reached.
    #[must_use]
    pub fn status_of(&self, step: WorkflowStep) -> Option<&StepStatus> {
        self.records
            .iter()
            .find(|record| record.step == step)
            .map(|record| &record.status)
    }

    /// Returns whether a step completed.
    #[must_use]
    pub fn completed(&self, step: WorkflowStep) -> bool {
        matches!(self.status_of(step), Some(StepStatus::Completed { .. }))
    }

    /// Returns whether a step was skipped.
    #[must_use]
    pub fn skipped(&self, step: WorkflowStep) -> bool {
        matches!(self.status_of(step), Some(StepStatus::Skipped { .. }))
    }
}
