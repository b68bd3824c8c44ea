//! Given steps for workspace lifecycle BDD scenarios.

use super::world::{WorkspaceLifecycleWorld, request_number, run_async, widgets};
use atelier::workspace::domain::{
    BranchName, ReviewRequest, ReviewRequestData, ReviewState, ReviewerLogin,
};
use chrono::Utc;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"an open review request #{number:u64} on branch "{branch}""#)]
fn open_review_request(
    world: &mut WorkspaceLifecycleWorld,
    number: u64,
    branch: String,
) -> Result<(), eyre::Report> {
    let now = Utc::now();
    let request = ReviewRequest::new(ReviewRequestData {
        number: request_number(number)?,
        title: format!("Existing work {number}"),
        body: String::new(),
        source_branch: BranchName::new(branch).wrap_err("source branch")?,
        target_branch: BranchName::new("main").wrap_err("target branch")?,
        repository: widgets()?,
        state: ReviewState::Open,
        url: format!("https://reviews.invalid/acme/widgets/pull/{number}"),
        author: ReviewerLogin::new("octocat").wrap_err("author")?,
        draft: false,
        created_at: now,
        updated_at: now,
    });
    world
        .reviews
        .insert(request)
        .wrap_err("seed review request")
}

#[given("a workspace exists for review request #{number:u64}")]
fn workspace_exists(world: &mut WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let runtime = world.runtime()?;
    run_async(runtime.setup_existing(number)).wrap_err("set up workspace")?;
    Ok(())
}

#[given("a clone already exists for review request #{number:u64}")]
fn clone_exists(world: &mut WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    world
        .disk
        .create_dir(format!("/clones/pr-{number}"))
        .wrap_err("seed clone directory")
}

#[given("the review system rejects writes")]
fn review_system_rejects_writes(world: &mut WorkspaceLifecycleWorld) -> Result<(), eyre::Report> {
    world
        .reviews
        .fail_writes("review system is read-only")
        .wrap_err("inject write failure")
}

#[given("review-system writes are simulated")]
fn writes_are_simulated(world: &mut WorkspaceLifecycleWorld) -> Result<(), eyre::Report> {
    if world.runtime.is_some() {
        return Err(eyre::eyre!(
            "simulation must be configured before the runtime is used"
        ));
    }
    world.config.orchestrator.simulate_writes = true;
    Ok(())
}
