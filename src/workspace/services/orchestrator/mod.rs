//! Staged workflows that provision, resume and tear down workspaces.
//!
//! Each workflow is a fixed sequence of steps, each calling one port. The
//! first failing step aborts the workflow. Steps that already completed are
//! not rolled back; the [`StepJournal`] carried by results and errors lists
//! them so callers can see which side effects landed.

mod journal;
mod planner;

pub use journal::{StepJournal, StepRecord, StepStatus, WorkflowStep};
pub use planner::{PlanSource, PlannedWork, WorkPlanner};

use super::handover::{HandoverContext, HandoverError, HandoverMode, HandoverService};
use crate::workspace::{
    domain::{
        BranchName, NewReviewRequest, NewSession, RepositoryFullName, ReviewRequest,
        ReviewRequestNumber, TaskDescription, WorkPlan, WorkspaceDomainError, WorkspaceNaming,
        WorkspaceSession,
    },
    ports::{
        AssistantPort, CloneRequest, FilesystemError, ReviewSystemError, ReviewSystemPort,
        SessionPortError, VcsError, VersionControlPort, WorkspaceFilesystem,
        WorkspaceSessionPort,
    },
};
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

/// Broad category of a workflow failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowErrorKind {
    /// Input was rejected before any external call.
    Validation,
    /// The requested review request does not exist.
    NotFound,
    /// A clone directory already exists where a fresh one is required.
    Conflict,
    /// An external system failed.
    External,
}

/// What went wrong in a failed step.
#[derive(Debug, Clone, Error)]
pub enum WorkflowFailure {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] WorkspaceDomainError),

    /// The review request does not exist.
    #[error("review request {repository}#{number} not found")]
    RequestNotFound {
        /// Repository searched.
        repository: RepositoryFullName,
        /// Requested number.
        number: ReviewRequestNumber,
    },

    /// The clone directory is already taken.
    #[error("clone already exists at {0}")]
    CloneExists(Utf8PathBuf),

    /// The multiplexer failed.
    #[error(transparent)]
    Session(#[from] SessionPortError),

    /// Version control failed.
    #[error(transparent)]
    VersionControl(#[from] VcsError),

    /// The review system failed.
    #[error(transparent)]
    Review(#[from] ReviewSystemError),

    /// The filesystem failed.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// The handover failed.
    #[error(transparent)]
    Handover(#[from] HandoverError),
}

impl WorkflowFailure {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> WorkflowErrorKind {
        match self {
            Self::Validation(_) => WorkflowErrorKind::Validation,
            Self::RequestNotFound { .. } | Self::Review(ReviewSystemError::NotFound { .. }) => {
                WorkflowErrorKind::NotFound
            }
            Self::CloneExists(_) => WorkflowErrorKind::Conflict,
            Self::Session(_)
            | Self::VersionControl(_)
            | Self::Review(_)
            | Self::Filesystem(_)
            | Self::Handover(_) => WorkflowErrorKind::External,
        }
    }
}

/// A workflow stopped at a failing step.
#[derive(Debug, Clone, Error)]
#[error("{step} failed: {cause}")]
pub struct WorkflowError {
    step: WorkflowStep,
    #[source]
    cause: WorkflowFailure,
    journal: StepJournal,
}

impl WorkflowError {
    /// Returns the step that failed.
    #[must_use]
    pub const fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> WorkflowErrorKind {
        self.cause.kind()
    }

    /// Returns what went wrong.
    #[must_use]
    pub const fn cause(&self) -> &WorkflowFailure {
        &self.cause
    }

    /// Returns the steps that completed before the failure.
    #[must_use]
    pub const fn journal(&self) -> &StepJournal {
        &self.journal
    }
}

/// Result type for workflows.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Journal of a running workflow.
#[derive(Debug, Default)]
struct Run {
    journal: StepJournal,
}

impl Run {
    fn complete(&mut self, step: WorkflowStep, detail: impl Into<String>) {
        let text = detail.into();
        info!(step = %step, detail = %text, "workflow step completed");
        self.journal.complete(step, text);
    }

    fn skip(&mut self, step: WorkflowStep, reason: impl Into<String>) {
        let text = reason.into();
        info!(step = %step, reason = %text, "workflow step skipped");
        self.journal.skip(step, text);
    }

    fn fail(&mut self, step: WorkflowStep, failure: impl Into<WorkflowFailure>) -> WorkflowError {
        let cause = failure.into();
        warn!(step = %step, error = %cause, "workflow step failed");
        WorkflowError {
            step,
            cause,
            journal: std::mem::take(&mut self.journal),
        }
    }

    fn finish(self) -> StepJournal {
        self.journal
    }
}

/// Ports the orchestrator drives.
pub struct WorkflowPorts<S, V, R, F, A> {
    /// Multiplexer sessions.
    pub sessions: Arc<S>,
    /// Version control.
    pub vcs: Arc<V>,
    /// Review system.
    pub reviews: Arc<R>,
    /// Clone directories.
    pub filesystem: Arc<F>,
    /// Planning assistant.
    pub assistant: Arc<A>,
}

/// Validated settings for the orchestrated repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Repository new work is opened against.
    pub repository: RepositoryFullName,
    /// URL clones are made from.
    pub clone_url: String,
    /// Branch new work starts from and merges into.
    pub base_branch: BranchName,
    /// File name of project guidelines inside a clone.
    pub guidelines_file: String,
    /// Session and clone naming rules.
    pub naming: WorkspaceNaming,
    /// Command that starts the assistant inside a session.
    pub launch_command: String,
}

/// A workspace created for new work.
#[derive(Debug, Clone)]
pub struct ProvisionedWorkspace {
    /// The plan used.
    pub planned: PlannedWork,
    /// The review request opened for the work.
    pub request: ReviewRequest,
    /// The session running the work.
    pub session: WorkspaceSession,
    /// The clone directory.
    pub clone_dir: Utf8PathBuf,
    /// The steps taken.
    pub journal: StepJournal,
}

/// A workspace created for an existing review request.
#[derive(Debug, Clone)]
pub struct ResumedWorkspace {
    /// The review request being resumed.
    pub request: ReviewRequest,
    /// The session running the work.
    pub session: WorkspaceSession,
    /// The clone directory.
    pub clone_dir: Utf8PathBuf,
    /// The steps taken.
    pub journal: StepJournal,
}

/// Outcome of a teardown.
#[derive(Debug, Clone)]
pub struct TeardownReport {
    /// The closed review request.
    pub number: ReviewRequestNumber,
    /// The steps taken or skipped.
    pub journal: StepJournal,
}

/// Drives the provision, resume and teardown workflows.
pub struct WorkspaceOrchestrator<S, V, R, F, A, C>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
    F: WorkspaceFilesystem,
    A: AssistantPort,
    C: Clock + Send + Sync,
{
    sessions: Arc<S>,
    vcs: Arc<V>,
    reviews: Arc<R>,
    filesystem: Arc<F>,
    planner: WorkPlanner<A, C>,
    handover: HandoverService<S>,
    clock: Arc<C>,
    settings: WorkflowSettings,
    pending_sequence: AtomicU64,
}

impl<S, V, R, F, A, C> WorkspaceOrchestrator<S, V, R, F, A, C>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
    F: WorkspaceFilesystem,
    A: AssistantPort,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        ports: WorkflowPorts<S, V, R, F, A>,
        clock: Arc<C>,
        settings: WorkflowSettings,
    ) -> Self {
        let handover =
            HandoverService::new(Arc::clone(&ports.sessions), settings.launch_command.clone());
        Self {
            planner: WorkPlanner::new(ports.assistant, Arc::clone(&clock)),
            handover,
            sessions: ports.sessions,
            vcs: ports.vcs,
            reviews: ports.reviews,
            filesystem: ports.filesystem,
            clock,
            settings,
            pending_sequence: AtomicU64::new(0),
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Provisions a workspace for a new task.
    ///
    /// Plans the work, clones the base branch into a pending directory,
    /// creates and pushes the work branch, opens a draft review request,
    /// moves the clone to its numbered directory (replacing any existing
    /// one), starts a session there and hands the task to the assistant.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] naming the failed step. A failure after
    /// the review request is created leaves that request open without a
    /// session.
    pub async fn provision_new(&self, description: &str) -> WorkflowResult<ProvisionedWorkspace> {
        let mut run = Run::default();
        let task = TaskDescription::new(description)
            .map_err(|err| run.fail(WorkflowStep::ValidateInput, err))?;

        let planned = self.planner.plan(&task).await;
        run.complete(
            WorkflowStep::PlanWork,
            match &planned.source {
                PlanSource::Assistant => format!("assistant proposed {}", planned.plan.branch()),
                PlanSource::Fallback { reason } => {
                    format!("fell back to {} ({reason})", planned.plan.branch())
                }
            },
        );
        let plan = &planned.plan;

        let sequence = self.pending_sequence.fetch_add(1, Ordering::Relaxed);
        let pending = self
            .settings
            .naming
            .pending_clone_dir(self.clock.utc(), sequence);
        self.clone_into(&mut run, self.settings.base_branch.clone(), &pending)
            .await?;
        self.prepare_branch(&mut run, &pending, plan).await?;

        let request = self
            .reviews
            .create(
                &self.settings.repository,
                &NewReviewRequest {
                    title: plan.title().to_owned(),
                    body: plan.body().to_owned(),
                    source_branch: plan.branch().clone(),
                    target_branch: self.settings.base_branch.clone(),
                    draft: true,
                },
            )
            .await
            .map_err(|err| run.fail(WorkflowStep::CreateReviewRequest, err))?;
        run.complete(
            WorkflowStep::CreateReviewRequest,
            format!("opened #{} as draft", request.number()),
        );

        let clone_dir = self.settings.naming.clone_dir(request.number());
        self.place_clone(&mut run, &pending, &clone_dir).await?;

        let guidelines = self.read_guidelines(&mut run, &clone_dir).await;
        let session = self
            .start_session(&mut run, request.number(), &clone_dir)
            .await?;
        self.hand_over(
            &mut run,
            &session,
            HandoverContext {
                number: request.number(),
                source_branch: request.source_branch().clone(),
                target_branch: request.target_branch().clone(),
                task: task.as_str().to_owned(),
                guidelines,
                mode: HandoverMode::NewWork,
            },
        )
        .await?;

        Ok(ProvisionedWorkspace {
            planned,
            request,
            session,
            clone_dir,
            journal: run.finish(),
        })
    }

    /// Sets up a workspace for an existing review request.
    ///
    /// Refuses to touch an existing clone directory.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] of kind
    /// [`WorkflowErrorKind::Validation`] for a zero number,
    /// [`WorkflowErrorKind::NotFound`] when the request does not exist,
    /// [`WorkflowErrorKind::Conflict`] when the clone directory exists, or
    /// [`WorkflowErrorKind::External`] when a port fails.
    pub async fn setup_existing(&self, raw_number: u64) -> WorkflowResult<ResumedWorkspace> {
        let mut run = Run::default();
        let number = ReviewRequestNumber::new(raw_number)
            .map_err(|err| run.fail(WorkflowStep::ValidateInput, err))?;

        let request = self
            .reviews
            .find(&self.settings.repository, number)
            .await
            .map_err(|err| run.fail(WorkflowStep::FetchReviewRequest, err))?
            .ok_or_else(|| {
                run.fail(
                    WorkflowStep::FetchReviewRequest,
                    WorkflowFailure::RequestNotFound {
                        repository: self.settings.repository.clone(),
                        number,
                    },
                )
            })?;
        run.complete(
            WorkflowStep::FetchReviewRequest,
            format!("found #{number} on {}", request.source_branch()),
        );

        let clone_dir = self.settings.naming.clone_dir(number);
        let taken = self
            .filesystem
            .exists(&clone_dir)
            .await
            .map_err(|err| run.fail(WorkflowStep::CheckCloneTarget, err))?;
        if taken {
            return Err(run.fail(
                WorkflowStep::CheckCloneTarget,
                WorkflowFailure::CloneExists(clone_dir),
            ));
        }
        run.complete(WorkflowStep::CheckCloneTarget, format!("{clone_dir} is free"));

        self.clone_into(&mut run, request.source_branch().clone(), &clone_dir)
            .await?;
        let guidelines = self.read_guidelines(&mut run, &clone_dir).await;
        let session = self.start_session(&mut run, number, &clone_dir).await?;
        self.hand_over(
            &mut run,
            &session,
            HandoverContext {
                number,
                source_branch: request.source_branch().clone(),
                target_branch: request.target_branch().clone(),
                task: resume_task(&request),
                guidelines,
                mode: HandoverMode::ContinueExisting,
            },
        )
        .await?;

        Ok(ResumedWorkspace {
            request,
            session,
            clone_dir,
            journal: run.finish(),
        })
    }

    /// Closes a review request and removes its session and clone.
    ///
    /// A missing session or clone is skipped, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] when the number is zero, when closing
    /// the request fails (nothing else is attempted), or when destroying an
    /// existing session or removing an existing clone fails.
    pub async fn teardown(&self, raw_number: u64) -> WorkflowResult<TeardownReport> {
        let mut run = Run::default();
        let number = ReviewRequestNumber::new(raw_number)
            .map_err(|err| run.fail(WorkflowStep::ValidateInput, err))?;

        self.reviews
            .close(&self.settings.repository, number)
            .await
            .map_err(|err| run.fail(WorkflowStep::CloseReviewRequest, err))?;
        run.complete(WorkflowStep::CloseReviewRequest, format!("closed #{number}"));

        let session_name = self.settings.naming.session_name(number);
        let existing = self
            .sessions
            .get(&session_name)
            .await
            .map_err(|err| run.fail(WorkflowStep::DestroySession, err))?;
        if existing.is_some() {
            match self.sessions.destroy(&session_name).await {
                Ok(()) => run.complete(
                    WorkflowStep::DestroySession,
                    format!("destroyed {session_name}"),
                ),
                Err(SessionPortError::NotFound(_)) => run.skip(
                    WorkflowStep::DestroySession,
                    format!("{session_name} ended before teardown reached it"),
                ),
                Err(err) => return Err(run.fail(WorkflowStep::DestroySession, err)),
            }
        } else {
            run.skip(
                WorkflowStep::DestroySession,
                format!("no session named {session_name}"),
            );
        }

        let clone_dir = self.settings.naming.clone_dir(number);
        let present = self
            .filesystem
            .exists(&clone_dir)
            .await
            .map_err(|err| run.fail(WorkflowStep::RemoveClone, err))?;
        if present {
            self.filesystem
                .remove_all(&clone_dir)
                .await
                .map_err(|err| run.fail(WorkflowStep::RemoveClone, err))?;
            run.complete(WorkflowStep::RemoveClone, format!("removed {clone_dir}"));
        } else {
            run.skip(WorkflowStep::RemoveClone, format!("no clone at {clone_dir}"));
        }

        Ok(TeardownReport {
            number,
            journal: run.finish(),
        })
    }

    async fn clone_into(
        &self,
        run: &mut Run,
        branch: BranchName,
        destination: &Utf8Path,
    ) -> WorkflowResult<()> {
        let request = CloneRequest {
            remote_url: self.settings.clone_url.clone(),
            branch,
            destination: destination.to_owned(),
        };
        self.vcs
            .clone_branch(&request)
            .await
            .map_err(|err| run.fail(WorkflowStep::CloneRepository, err))?;
        run.complete(
            WorkflowStep::CloneRepository,
            format!("cloned {} into {destination}", request.branch),
        );
        Ok(())
    }

    async fn prepare_branch(
        &self,
        run: &mut Run,
        dir: &Utf8Path,
        plan: &WorkPlan,
    ) -> WorkflowResult<()> {
        self.vcs
            .create_branch(dir, plan.branch())
            .await
            .map_err(|err| run.fail(WorkflowStep::CreateBranch, err))?;
        run.complete(
            WorkflowStep::CreateBranch,
            format!("checked out {}", plan.branch()),
        );

        self.vcs
            .commit_empty(dir, plan.title())
            .await
            .map_err(|err| run.fail(WorkflowStep::CommitEmpty, err))?;
        run.complete(WorkflowStep::CommitEmpty, plan.title());

        self.vcs
            .push_upstream(dir, plan.branch())
            .await
            .map_err(|err| run.fail(WorkflowStep::PushBranch, err))?;
        run.complete(
            WorkflowStep::PushBranch,
            format!("pushed {} with upstream", plan.branch()),
        );
        Ok(())
    }

    /// Moves the pending clone to its numbered directory; an existing
    /// directory there is removed first.
    async fn place_clone(
        &self,
        run: &mut Run,
        pending: &Utf8Path,
        clone_dir: &Utf8Path,
    ) -> WorkflowResult<()> {
        let occupied = self
            .filesystem
            .exists(clone_dir)
            .await
            .map_err(|err| run.fail(WorkflowStep::PlaceClone, err))?;
        if occupied {
            warn!(dir = %clone_dir, "replacing existing clone directory");
            self.filesystem
                .remove_all(clone_dir)
                .await
                .map_err(|err| run.fail(WorkflowStep::PlaceClone, err))?;
        }
        self.filesystem
            .rename(pending, clone_dir)
            .await
            .map_err(|err| run.fail(WorkflowStep::PlaceClone, err))?;
        let detail = if occupied {
            format!("replaced {clone_dir} with {pending}")
        } else {
            format!("moved {pending} to {clone_dir}")
        };
        run.complete(WorkflowStep::PlaceClone, detail);
        Ok(())
    }

    /// Reads the guidelines file; any failure only skips the step.
    async fn read_guidelines(&self, run: &mut Run, clone_dir: &Utf8Path) -> Option<String> {
        let path = clone_dir.join(&self.settings.guidelines_file);
        match self.filesystem.read_optional(&path).await {
            Ok(Some(text)) => {
                run.complete(WorkflowStep::ReadGuidelines, format!("read {path}"));
                Some(text)
            }
            Ok(None) => {
                run.skip(WorkflowStep::ReadGuidelines, format!("no {path}"));
                None
            }
            Err(err) => {
                run.skip(
                    WorkflowStep::ReadGuidelines,
                    format!("could not read {path}: {err}"),
                );
                None
            }
        }
    }

    async fn start_session(
        &self,
        run: &mut Run,
        number: ReviewRequestNumber,
        clone_dir: &Utf8Path,
    ) -> WorkflowResult<WorkspaceSession> {
        let request = NewSession::detached(
            self.settings.naming.session_name(number),
            clone_dir.to_owned(),
        );
        let session = self
            .sessions
            .create(&request)
            .await
            .map_err(|err| run.fail(WorkflowStep::CreateSession, err))?;
        run.complete(
            WorkflowStep::CreateSession,
            format!("started {} in {clone_dir}", session.name()),
        );
        Ok(session)
    }

    async fn hand_over(
        &self,
        run: &mut Run,
        session: &WorkspaceSession,
        context: HandoverContext,
    ) -> WorkflowResult<()> {
        self.handover
            .initialize(session.name(), &context)
            .await
            .map_err(|err| run.fail(WorkflowStep::Handover, err))?;
        run.complete(
            WorkflowStep::Handover,
            format!("launched assistant in {}", session.name()),
        );
        Ok(())
    }
}

/// Task text handed over when resuming a review request.
fn resume_task(request: &ReviewRequest) -> String {
    let body = request.body().trim();
    if body.is_empty() {
        request.title().to_owned()
    } else {
        format!("{}\n\n{body}", request.title())
    }
}
