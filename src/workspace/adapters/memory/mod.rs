//! In-memory adapters for tests and local deterministic workflows.

mod assistant;
mod disk;
mod review;
mod session;
mod vcs;

pub use assistant::ScriptedAssistant;
pub use disk::{InMemoryDisk, InMemoryFilesystem};
pub use review::InMemoryReviewSystem;
pub use session::{InMemorySessionHost, SentInput};
pub use vcs::{InMemoryVersionControl, OPERATION_NAMES, VcsOperation};
