//! Services that derive, cache and orchestrate workspaces.

pub mod cache;
pub mod catalog;
pub mod discovery;
pub mod handover;
pub mod orchestrator;

pub use cache::{CacheError, CacheEvent, CacheRefresher, CacheResult, RevalidatingCache};
pub use catalog::{
    CatalogTtls, ReviewListingCache, ReviewListingRefresher, WorkspaceCache, WorkspaceCatalog,
};
pub use discovery::{AllWorkspaces, DiscoveryError, DiscoveryResult, DiscoveryService};
pub use handover::{
    HandoverContext, HandoverError, HandoverMode, HandoverResult, HandoverService, shell_escape,
};
pub use orchestrator::{
    PlanSource, PlannedWork, ProvisionedWorkspace, ResumedWorkspace, StepJournal, StepRecord,
    StepStatus, TeardownReport, WorkPlanner, WorkflowError, WorkflowErrorKind, WorkflowFailure,
    WorkflowPorts, WorkflowResult, WorkflowSettings, WorkflowStep, WorkspaceOrchestrator,
};
