//! Behaviour tests for provisioning, resuming and tearing down workspaces.

#[path = "workspace_lifecycle_steps/mod.rs"]
mod workspace_lifecycle_steps_defs;

use rstest_bdd_macros::scenario;
use workspace_lifecycle_steps_defs::world::{WorkspaceLifecycleWorld, world};

#[scenario(
    path = "tests/features/workspace_lifecycle.feature",
    name = "Tear down a workspace with its session and clone"
)]
#[tokio::test(flavor = "multi_thread")]
async fn tear_down_full_workspace(world: WorkspaceLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/workspace_lifecycle.feature",
    name = "Tear down a review request without a workspace"
)]
#[tokio::test(flavor = "multi_thread")]
async fn tear_down_without_workspace(world: WorkspaceLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/workspace_lifecycle.feature",
    name = "A failed close leaves the workspace in place"
)]
#[tokio::test(flavor = "multi_thread")]
async fn failed_close_keeps_workspace(world: WorkspaceLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/workspace_lifecycle.feature",
    name = "Refuse to set up over an existing clone"
)]
#[tokio::test(flavor = "multi_thread")]
async fn refuse_existing_clone(world: WorkspaceLifecycleWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/workspace_lifecycle.feature",
    name = "Provision new work with simulated review-system writes"
)]
#[tokio::test(flavor = "multi_thread")]
async fn provision_with_simulated_writes(world: WorkspaceLifecycleWorld) {
    let _ = world;
}
