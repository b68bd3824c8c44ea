//! Then steps for workspace lifecycle BDD scenarios.

use super::world::{WorkspaceLifecycleWorld, request_number, run_async, session_for, widgets};
use atelier::workspace::{
    domain::{ReviewState, SessionName},
    ports::{ReviewSystemPort, WorkspaceSessionPort},
    services::WorkflowErrorKind,
};
use camino::Utf8PathBuf;
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn review_state(world: &WorkspaceLifecycleWorld, number: u64) -> Result<ReviewState, eyre::Report> {
    let runtime = world.built()?;
    let request = run_async(runtime.reviews().find(&widgets()?, request_number(number)?))
        .wrap_err("find review request")?
        .ok_or_else(|| eyre::eyre!("review request #{number} does not exist"))?;
    Ok(request.state())
}

fn session_exists(world: &WorkspaceLifecycleWorld, name: &SessionName) -> Result<bool, eyre::Report> {
    let found = run_async(world.sessions.get(name)).wrap_err("look up session")?;
    Ok(found.is_some())
}

#[then("review request #{number:u64} is closed")]
fn request_is_closed(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let state = review_state(world, number)?;
    eyre::ensure!(
        state == ReviewState::Closed,
        "expected #{number} to be closed, found {state}"
    );
    Ok(())
}

#[then("review request #{number:u64} is still open")]
fn request_is_open(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let state = review_state(world, number)?;
    eyre::ensure!(
        state == ReviewState::Open,
        "expected #{number} to stay open, found {state}"
    );
    Ok(())
}

#[then("no session exists for review request #{number:u64}")]
fn no_session(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let name = session_for(number)?;
    eyre::ensure!(!session_exists(world, &name)?, "session {name} still exists");
    Ok(())
}

#[then("the session for review request #{number:u64} still exists")]
fn session_remains(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let name = session_for(number)?;
    eyre::ensure!(session_exists(world, &name)?, "session {name} is gone");
    Ok(())
}

#[then("no clone exists for review request #{number:u64}")]
fn no_clone(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let dir = Utf8PathBuf::from(format!("/clones/pr-{number}"));
    let present = world.disk.contains(&dir).wrap_err("look up clone")?;
    eyre::ensure!(!present, "clone {dir} still exists");
    Ok(())
}

#[then(r#"the "{step}" step was skipped"#)]
fn step_was_skipped(world: &WorkspaceLifecycleWorld, step: String) -> Result<(), eyre::Report> {
    let journal = world
        .last_journal
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no workflow completed in this scenario"))?;
    let record = journal
        .records()
        .iter()
        .find(|record| record.step.as_str() == step)
        .ok_or_else(|| eyre::eyre!("step {step} was not reached"))?;
    eyre::ensure!(journal.skipped(record.step), "step {step} was not skipped");
    Ok(())
}

#[then(r#"the workflow fails at "{step}" with a {kind} error"#)]
fn workflow_fails(
    world: &WorkspaceLifecycleWorld,
    step: String,
    kind: String,
) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the workflow to fail"))?;
    let expected = match kind.as_str() {
        "validation" => WorkflowErrorKind::Validation,
        "not found" => WorkflowErrorKind::NotFound,
        "conflict" => WorkflowErrorKind::Conflict,
        "external" => WorkflowErrorKind::External,
        other => return Err(eyre::eyre!("unknown error kind in scenario: {other}")),
    };
    eyre::ensure!(
        err.step().as_str() == step,
        "expected failure at {step}, found {}",
        err.step()
    );
    eyre::ensure!(
        err.kind() == expected,
        "expected a {kind} error, found {:?}",
        err.kind()
    );
    Ok(())
}

#[then(r#"the workflow fails at "{step}" with an {kind} error"#)]
fn workflow_fails_an(
    world: &WorkspaceLifecycleWorld,
    step: String,
    kind: String,
) -> Result<(), eyre::Report> {
    workflow_fails(world, step, kind)
}

#[then("the new review request is numbered #{number:u64}")]
fn numbered(world: &WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let actual = world
        .last_number
        .ok_or_else(|| eyre::eyre!("no workflow completed in this scenario"))?;
    eyre::ensure!(
        actual.value() == number,
        "expected #{number}, found #{actual}"
    );
    Ok(())
}

#[then(r#"a session named "{name}" is running"#)]
fn session_running(world: &WorkspaceLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let session = SessionName::new(name).wrap_err("session name")?;
    eyre::ensure!(
        session_exists(world, &session)?,
        "session {session} is not running"
    );
    Ok(())
}
