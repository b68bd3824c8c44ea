//! Composition root wiring ports into the workspace services.
//!
//! [`WorkspaceRuntime`] owns one catalog and one orchestrator sharing the
//! same port instances. Review-system writes are routed through a
//! [`ReviewGateway`], which simulates them when configured to. Workflows
//! run through the runtime invalidate the affected cached listings once they
//! succeed so polling callers see the change on their next read.

use crate::config::ValidatedConfig;
use crate::workspace::{
    adapters::{ReviewGateway, SimulatedReviewStore},
    domain::{ReviewRequest, ReviewerLogin, WorkspaceState},
    ports::{
        AssistantPort, ReviewSystemPort, VersionControlPort, WorkspaceFilesystem,
        WorkspaceSessionPort,
    },
    services::{
        CacheResult, DiscoveryService, ProvisionedWorkspace, ResumedWorkspace, TeardownReport,
        WorkflowPorts, WorkflowResult, WorkspaceCatalog, WorkspaceOrchestrator,
    },
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

/// Port implementations handed to [`WorkspaceRuntime::build`].
///
/// The review system is taken by value so it can be wrapped for simulated
/// writes.
pub struct RuntimePorts<S, V, R, F, A> {
    /// Multiplexer sessions.
    pub sessions: Arc<S>,
    /// Version control.
    pub vcs: Arc<V>,
    /// Review system.
    pub reviews: R,
    /// Clone directories.
    pub filesystem: Arc<F>,
    /// Planning assistant.
    pub assistant: Arc<A>,
}

/// Catalog and orchestrator sharing one set of ports.
pub struct WorkspaceRuntime<S, V, R, F, A, C>
where
    S: WorkspaceSessionPort + 'static,
    V: VersionControlPort + 'static,
    R: ReviewSystemPort + 'static,
    F: WorkspaceFilesystem,
    A: AssistantPort,
    C: Clock + Send + Sync + 'static,
{
    catalog: WorkspaceCatalog<S, V, ReviewGateway<R, C>, C>,
    orchestrator: WorkspaceOrchestrator<S, V, ReviewGateway<R, C>, F, A, C>,
    reviews: Arc<ReviewGateway<R, C>>,
    reviewer: ReviewerLogin,
}

impl<S, V, R, F, A, C> WorkspaceRuntime<S, V, R, F, A, C>
where
    S: WorkspaceSessionPort + 'static,
    V: VersionControlPort + 'static,
    R: ReviewSystemPort + 'static,
    F: WorkspaceFilesystem,
    A: AssistantPort,
    C: Clock + Send + Sync + 'static,
{
    /// Wires the services from validated configuration.
    #[must_use]
    pub fn build(
        config: &ValidatedConfig,
        ports: RuntimePorts<S, V, R, F, A>,
        clock: Arc<C>,
    ) -> Self {
        let reviews = Arc::new(if config.simulate_writes {
            info!(
                base = config.simulated_number_base,
                "review-system writes are simulated"
            );
            ReviewGateway::simulated(
                ports.reviews,
                SimulatedReviewStore::new(config.simulated_number_base),
                config.reviewer.clone(),
                Arc::clone(&clock),
            )
        } else {
            ReviewGateway::live(ports.reviews)
        });

        let discovery = DiscoveryService::new(
            Arc::clone(&ports.sessions),
            Arc::clone(&ports.vcs),
            Arc::clone(&reviews),
        );
        let catalog = WorkspaceCatalog::new(
            discovery,
            Arc::clone(&reviews),
            Arc::clone(&clock),
            config.ttls,
        );
        let orchestrator = WorkspaceOrchestrator::new(
            WorkflowPorts {
                sessions: ports.sessions,
                vcs: ports.vcs,
                reviews: Arc::clone(&reviews),
                filesystem: ports.filesystem,
                assistant: ports.assistant,
            },
            clock,
            config.workflow.clone(),
        );

        Self {
            catalog,
            orchestrator,
            reviews,
            reviewer: config.reviewer.clone(),
        }
    }

    /// Returns the cached read models.
    #[must_use]
    pub const fn catalog(&self) -> &WorkspaceCatalog<S, V, ReviewGateway<R, C>, C> {
        &self.catalog
    }

    /// Returns the workflow orchestrator.
    #[must_use]
    pub const fn orchestrator(
        &self,
    ) -> &WorkspaceOrchestrator<S, V, ReviewGateway<R, C>, F, A, C> {
        &self.orchestrator
    }

    /// Returns the review system the services write through.
    #[must_use]
    pub fn reviews(&self) -> &ReviewGateway<R, C> {
        &self.reviews
    }

    /// Returns the current workspace states.
    ///
    /// # Errors
    ///
    /// Returns the cache error when nothing is cached and discovery fails.
    pub async fn workspaces(&self) -> CacheResult<Arc<Vec<WorkspaceState>>> {
        self.catalog.workspaces().await
    }

    /// Returns the configured reviewer's open review requests.
    ///
    /// # Errors
    ///
    /// Returns the cache error when nothing is cached and the review system
    /// fails.
    pub async fn my_review_requests(&self) -> CacheResult<Arc<Vec<ReviewRequest>>> {
        self.catalog.my_review_requests(&self.reviewer).await
    }

    /// Runs [`WorkspaceOrchestrator::provision_new`] and refreshes both
    /// listings on success.
    ///
    /// # Errors
    ///
    /// Returns the workflow error unchanged.
    pub async fn provision_new(&self, description: &str) -> WorkflowResult<ProvisionedWorkspace> {
        let provisioned = self.orchestrator.provision_new(description).await?;
        self.invalidate_listings().await;
        Ok(provisioned)
    }

    /// Runs [`WorkspaceOrchestrator::setup_existing`] and refreshes the
    /// workspace listing on success.
    ///
    /// # Errors
    ///
    /// Returns the workflow error unchanged.
    pub async fn setup_existing(&self, number: u64) -> WorkflowResult<ResumedWorkspace> {
        let resumed = self.orchestrator.setup_existing(number).await?;
        if let Err(err) = self.catalog.invalidate_workspaces().await {
            warn!(error = %err, "workspace listing refresh failed after setup");
        }
        Ok(resumed)
    }

    /// Runs [`WorkspaceOrchestrator::teardown`] and refreshes both listings
    /// on success.
    ///
    /// # Errors
    ///
    /// Returns the workflow error unchanged.
    pub async fn teardown(&self, number: u64) -> WorkflowResult<TeardownReport> {
        let report = self.orchestrator.teardown(number).await?;
        self.invalidate_listings().await;
        Ok(report)
    }

    async fn invalidate_listings(&self) {
        let (workspaces, requests) = futures::join!(
            self.catalog.invalidate_workspaces(),
            self.catalog.invalidate_review_requests(&self.reviewer),
        );
        if let Err(err) = workspaces {
            warn!(error = %err, "workspace listing refresh failed after workflow");
        }
        if let Err(err) = requests {
            warn!(error = %err, "review listing refresh failed after workflow");
        }
    }
}
