//! Shared fixtures for the in-memory workspace integration tests.

use std::sync::Arc;

use atelier::config::{AtelierConfig, ValidatedConfig};
use atelier::runtime::{RuntimePorts, WorkspaceRuntime};
use atelier::workspace::adapters::memory::{
    InMemoryDisk, InMemoryFilesystem, InMemoryReviewSystem, InMemorySessionHost,
    InMemoryVersionControl, ScriptedAssistant,
};
use atelier::workspace::domain::{
    BranchName, RepositoryFullName, ReviewRequest, ReviewRequestData, ReviewRequestNumber,
    ReviewState, ReviewerLogin,
};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::fixture;

/// Runtime wired to in-memory adapters.
pub type TestRuntime = WorkspaceRuntime<
    InMemorySessionHost,
    InMemoryVersionControl,
    InMemoryReviewSystem,
    InMemoryFilesystem,
    ScriptedAssistant,
    DefaultClock,
>;

/// Assistant reply proposing a plan for the dark mode task.
pub const PLAN_REPLY: &str =
    r#"{"branch": "feature/dark-mode", "title": "Add dark mode toggle", "body": "Theme switch."}"#;

/// In-memory external systems plus a runtime over them.
pub struct Environment {
    pub disk: InMemoryDisk,
    pub sessions: InMemorySessionHost,
    pub vcs: InMemoryVersionControl,
    pub reviews: InMemoryReviewSystem,
    pub runtime: TestRuntime,
}

/// Returns configuration for `acme/widgets` with clones under `/clones`.
#[must_use]
pub fn config(simulate_writes: bool) -> ValidatedConfig {
    let mut raw = AtelierConfig::default();
    raw.orchestrator.repository = "acme/widgets".to_owned();
    raw.orchestrator.reviewer = "octocat".to_owned();
    raw.orchestrator.clones_root = "/clones".into();
    raw.orchestrator.simulate_writes = simulate_writes;
    raw.validate().expect("test configuration is valid")
}

/// Builds an environment from validated configuration.
#[must_use]
pub fn environment_with(config: &ValidatedConfig) -> Environment {
    let disk = InMemoryDisk::new();
    let sessions = InMemorySessionHost::new();
    let vcs = InMemoryVersionControl::new(disk.clone());
    let reviews = InMemoryReviewSystem::new(config.reviewer.clone());
    let runtime = WorkspaceRuntime::build(
        config,
        RuntimePorts {
            sessions: Arc::new(sessions.clone()),
            vcs: Arc::new(vcs.clone()),
            reviews: reviews.clone(),
            filesystem: Arc::new(disk.filesystem()),
            assistant: Arc::new(ScriptedAssistant::replying(PLAN_REPLY)),
        },
        Arc::new(DefaultClock),
    );
    Environment {
        disk,
        sessions,
        vcs,
        reviews,
        runtime,
    }
}

/// Provides an environment with live review-system writes.
#[fixture]
pub fn environment() -> Environment {
    environment_with(&config(false))
}

/// Provides an environment with simulated review-system writes.
#[fixture]
pub fn simulated_environment() -> Environment {
    environment_with(&config(true))
}

/// Returns the repository used throughout the tests.
#[must_use]
pub fn widgets() -> RepositoryFullName {
    RepositoryFullName::new("acme/widgets").expect("valid repository")
}

/// Builds an open request on `acme/widgets` authored by `octocat`.
#[must_use]
pub fn open_request(number: u64, branch: &str) -> ReviewRequest {
    let now = Utc::now();
    ReviewRequest::new(ReviewRequestData {
        number: ReviewRequestNumber::new(number).expect("positive number"),
        title: format!("Existing work {number}"),
        body: "Picked up from the backlog.".to_owned(),
        source_branch: BranchName::new(branch).expect("valid branch"),
        target_branch: BranchName::new("main").expect("valid branch"),
        repository: widgets(),
        state: ReviewState::Open,
        url: format!("https://reviews.invalid/acme/widgets/pull/{number}"),
        author: ReviewerLogin::new("octocat").expect("valid login"),
        draft: false,
        created_at: now,
        updated_at: now,
    })
}
