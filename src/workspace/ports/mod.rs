//! Port contracts for workspace discovery and orchestration.
//!
//! Ports define infrastructure-agnostic interfaces to the terminal
//! multiplexer, version control, the review system, the assistant and the
//! filesystem holding clones. Every call through a port is a suspension
//! point; nothing else in the services awaits.

pub mod assistant;
pub mod filesystem;
pub mod review;
pub mod session;
pub mod vcs;

pub use assistant::{AssistantError, AssistantPort, AssistantResult};
pub use filesystem::{FilesystemError, FilesystemResult, WorkspaceFilesystem};
pub use review::{ReviewSystemError, ReviewSystemPort, ReviewSystemResult};
pub use session::{SessionPortError, SessionPortResult, WorkspaceSessionPort};
pub use vcs::{CloneRequest, VcsError, VcsResult, VersionControlPort};
