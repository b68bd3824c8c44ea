//! Simulated review-system writes stay out of the real review system.

use atelier::workspace::{domain::ReviewState, ports::ReviewSystemPort};
use rstest::rstest;

use super::helpers::{Environment, open_request, simulated_environment, widgets};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn simulated_requests_are_numbered_from_the_base(simulated_environment: Environment) {
    let env = simulated_environment;
    assert!(env.runtime.reviews().is_simulated());

    let provisioned = env
        .runtime
        .provision_new("Add dark mode toggle")
        .await
        .expect("provision");

    assert_eq!(provisioned.request.number().value(), 90_000);
    assert_eq!(provisioned.session.name().as_str(), "pr-90000");
    assert!(
        env.reviews
            .list_open(&widgets())
            .await
            .expect("real listing")
            .is_empty()
    );
    let mine = env.runtime.my_review_requests().await.expect("listing");
    assert!(
        mine.iter()
            .any(|request| request.number().value() == 90_000)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn simulated_close_only_overlays_the_real_request(simulated_environment: Environment) {
    let env = simulated_environment;
    let seeded = open_request(7, "feature/export");
    env.reviews.insert(seeded.clone()).expect("seed request");

    env.runtime.teardown(7).await.expect("teardown");

    let seen = env
        .runtime
        .reviews()
        .find(&widgets(), seeded.number())
        .await
        .expect("find through gateway")
        .expect("request exists");
    assert_eq!(seen.state(), ReviewState::Closed);
    let real = env
        .reviews
        .find(&widgets(), seeded.number())
        .await
        .expect("find in real system")
        .expect("request exists");
    assert_eq!(real.state(), ReviewState::Open);
}
