//! Runtime integration tests: workflows keep the cached listings current.

use atelier::workspace::{
    adapters::memory::VcsOperation,
    domain::{ReviewState, WorkspaceState},
    ports::ReviewSystemPort,
    services::WorkflowErrorKind,
};
use camino::Utf8Path;
use rstest::rstest;

use super::helpers::{Environment, environment, open_request, widgets};

fn listed<'a>(states: &'a [WorkspaceState], name: &str) -> Option<&'a WorkspaceState> {
    states
        .iter()
        .find(|state| state.session().name().as_str() == name)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provisioned_work_shows_up_in_both_listings(environment: Environment) {
    let before = environment.runtime.workspaces().await.expect("initial listing");
    assert!(before.is_empty());

    let provisioned = environment
        .runtime
        .provision_new("Add dark mode toggle")
        .await
        .expect("provision");

    let number = provisioned.request.number();
    let states = environment.runtime.workspaces().await.expect("listing");
    let state = listed(&states, &format!("pr-{number}")).expect("new workspace listed");
    assert_eq!(
        state.review_request().map(|request| request.number()),
        Some(number)
    );
    let mine = environment
        .runtime
        .my_review_requests()
        .await
        .expect("review listing");
    assert!(mine.iter().any(|request| request.number() == number));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn teardown_drops_the_workspace_from_the_listing(environment: Environment) {
    environment
        .reviews
        .insert(open_request(5, "feature/search"))
        .expect("seed request");
    environment
        .runtime
        .setup_existing(5)
        .await
        .expect("setup existing");
    let during = environment.runtime.workspaces().await.expect("listing");
    assert!(listed(&during, "pr-5").is_some());

    environment.runtime.teardown(5).await.expect("teardown");

    let after = environment.runtime.workspaces().await.expect("listing");
    assert!(listed(&after, "pr-5").is_none());
    let closed = environment
        .reviews
        .find(&widgets(), open_request(5, "feature/search").number())
        .await
        .expect("find")
        .expect("request kept");
    assert_eq!(closed.state(), ReviewState::Closed);
    assert!(
        !environment
            .disk
            .contains(Utf8Path::new("/clones/pr-5"))
            .expect("disk lookup")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_workflow_is_returned_unchanged(environment: Environment) {
    environment
        .sessions
        .fail_creation("multiplexer offline")
        .expect("inject failure");
    environment
        .reviews
        .insert(open_request(8, "fix/crash"))
        .expect("seed request");

    let err = environment
        .runtime
        .setup_existing(8)
        .await
        .expect_err("session creation fails");

    assert_eq!(err.kind(), WorkflowErrorKind::External);
    assert!(
        environment
            .vcs
            .operations()
            .expect("operations")
            .iter()
            .any(|operation| matches!(operation, VcsOperation::Clone { .. }))
    );
}
