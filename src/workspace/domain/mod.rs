//! Domain model for workspace discovery and orchestration.
//!
//! The workspace domain models sessions, repository snapshots, review
//! requests and the state derived by joining them, while keeping every
//! interaction with the multiplexer, version control and the review system
//! outside of the domain boundary.

mod branch;
mod error;
mod ids;
mod naming;
mod plan;
mod remote;
mod review;
mod session;
mod snapshot;
mod state;

pub use branch::BranchName;
pub use error::{ParseReviewStateError, WorkspaceDomainError};
pub use ids::{RepositoryFullName, ReviewRequestNumber, ReviewerLogin, SessionName};
pub use naming::WorkspaceNaming;
pub use plan::{PlanParseError, TaskDescription, WorkPlan};
pub use remote::parse_remote_repository;
pub use review::{
    NewReviewRequest, ReviewRequest, ReviewRequestData, ReviewRequestUpdate, ReviewState,
};
pub use session::{NewSession, WorkspaceSession};
pub use snapshot::{RepositorySnapshot, RepositoryStatus};
pub use state::WorkspaceState;
