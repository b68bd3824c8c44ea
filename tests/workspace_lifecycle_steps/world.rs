//! Shared world state for workspace lifecycle BDD scenarios.

use std::sync::Arc;

use atelier::config::AtelierConfig;
use atelier::runtime::{RuntimePorts, WorkspaceRuntime};
use atelier::workspace::{
    adapters::memory::{
        InMemoryDisk, InMemoryFilesystem, InMemoryReviewSystem, InMemorySessionHost,
        InMemoryVersionControl, ScriptedAssistant,
    },
    domain::{RepositoryFullName, ReviewRequestNumber, ReviewerLogin, SessionName},
    services::{StepJournal, WorkflowError},
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;

/// Runtime type used by the BDD world.
pub type TestRuntime = WorkspaceRuntime<
    InMemorySessionHost,
    InMemoryVersionControl,
    InMemoryReviewSystem,
    InMemoryFilesystem,
    ScriptedAssistant,
    DefaultClock,
>;

const PLAN_REPLY: &str =
    r#"{"branch": "feature/dark-mode", "title": "Add dark mode toggle", "body": "Theme switch."}"#;

/// Scenario world for workspace lifecycle behaviour tests.
pub struct WorkspaceLifecycleWorld {
    pub config: AtelierConfig,
    pub disk: InMemoryDisk,
    pub sessions: InMemorySessionHost,
    pub vcs: InMemoryVersionControl,
    pub reviews: InMemoryReviewSystem,
    pub runtime: Option<TestRuntime>,
    pub last_journal: Option<StepJournal>,
    pub last_error: Option<WorkflowError>,
    pub last_number: Option<ReviewRequestNumber>,
}

impl WorkspaceLifecycleWorld {
    /// Creates a world for `acme/widgets` with clones under `/clones`.
    #[must_use]
    pub fn new() -> Self {
        let mut config = AtelierConfig::default();
        config.orchestrator.repository = "acme/widgets".to_owned();
        config.orchestrator.reviewer = "octocat".to_owned();
        config.orchestrator.clones_root = "/clones".into();
        let disk = InMemoryDisk::new();
        let reviewer = ReviewerLogin::new("octocat").expect("valid reviewer login");

        Self {
            config,
            vcs: InMemoryVersionControl::new(disk.clone()),
            disk,
            sessions: InMemorySessionHost::new(),
            reviews: InMemoryReviewSystem::new(reviewer),
            runtime: None,
            last_journal: None,
            last_error: None,
            last_number: None,
        }
    }

    /// Returns the runtime, building it from the current configuration on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration does not validate.
    pub fn runtime(&mut self) -> Result<&TestRuntime, eyre::Report> {
        if self.runtime.is_none() {
            let validated = self
                .config
                .validate()
                .wrap_err("validate scenario configuration")?;
            self.runtime = Some(WorkspaceRuntime::build(
                &validated,
                RuntimePorts {
                    sessions: Arc::new(self.sessions.clone()),
                    vcs: Arc::new(self.vcs.clone()),
                    reviews: self.reviews.clone(),
                    filesystem: Arc::new(self.disk.filesystem()),
                    assistant: Arc::new(ScriptedAssistant::replying(PLAN_REPLY)),
                },
                Arc::new(DefaultClock),
            ));
        }
        self.built()
    }

    /// Returns the runtime built by an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when no step has used the runtime yet.
    pub fn built(&self) -> Result<&TestRuntime, eyre::Report> {
        self.runtime
            .as_ref()
            .ok_or_else(|| eyre::eyre!("runtime has not been built in this scenario"))
    }
}

impl Default for WorkspaceLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> WorkspaceLifecycleWorld {
    WorkspaceLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Returns the scenario repository.
///
/// # Errors
///
/// Returns an error if the name does not validate.
pub fn widgets() -> Result<RepositoryFullName, eyre::Report> {
    RepositoryFullName::new("acme/widgets").wrap_err("scenario repository")
}

/// Returns the review request number used in a step.
///
/// # Errors
///
/// Returns an error for zero.
pub fn request_number(value: u64) -> Result<ReviewRequestNumber, eyre::Report> {
    ReviewRequestNumber::new(value).wrap_err("review request number")
}

/// Returns the session name used for a review request.
///
/// # Errors
///
/// Returns an error if the name does not validate.
pub fn session_for(value: u64) -> Result<SessionName, eyre::Report> {
    SessionName::new(format!("pr-{value}")).wrap_err("session name")
}
