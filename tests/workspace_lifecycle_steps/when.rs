//! When steps for workspace lifecycle BDD scenarios.

use super::world::{WorkspaceLifecycleWorld, run_async};
use rstest_bdd_macros::when;

#[when("review request #{number:u64} is torn down")]
fn tear_down(world: &mut WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let result = run_async(world.runtime()?.teardown(number));
    match result {
        Ok(report) => {
            world.last_number = Some(report.number);
            world.last_journal = Some(report.journal);
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when("review request #{number:u64} is set up")]
fn set_up(world: &mut WorkspaceLifecycleWorld, number: u64) -> Result<(), eyre::Report> {
    let result = run_async(world.runtime()?.setup_existing(number));
    match result {
        Ok(resumed) => {
            world.last_number = Some(resumed.request.number());
            world.last_journal = Some(resumed.journal);
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"new work "{task}" is provisioned"#)]
fn provision(world: &mut WorkspaceLifecycleWorld, task: String) -> Result<(), eyre::Report> {
    let result = run_async(world.runtime()?.provision_new(&task));
    match result {
        Ok(provisioned) => {
            world.last_number = Some(provisioned.request.number());
            world.last_journal = Some(provisioned.journal);
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}
