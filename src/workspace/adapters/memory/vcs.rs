//! In-memory version control over an [`InMemoryDisk`].

use super::InMemoryDisk;
use crate::workspace::{
    domain::{BranchName, RepositoryStatus},
    ports::{CloneRequest, VcsError, VcsResult, VersionControlPort},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Version-control operation recorded by [`InMemoryVersionControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsOperation {
    /// A status read.
    Status(Utf8PathBuf),
    /// A single-branch clone.
    Clone {
        /// Branch checked out.
        branch: BranchName,
        /// Directory cloned into.
        destination: Utf8PathBuf,
    },
    /// A branch creation.
    CreateBranch {
        /// Repository directory.
        dir: Utf8PathBuf,
        /// Branch created.
        branch: BranchName,
    },
    /// An empty commit.
    CommitEmpty {
        /// Repository directory.
        dir: Utf8PathBuf,
        /// Commit message.
        message: String,
    },
    /// A push that sets the upstream.
    Push {
        /// Repository directory.
        dir: Utf8PathBuf,
        /// Branch pushed.
        branch: BranchName,
    },
}

/// Operation names accepted by [`InMemoryVersionControl::fail_operation`].
pub const OPERATION_NAMES: [&str; 5] = ["status", "clone", "create_branch", "commit", "push"];

impl VcsOperation {
    const fn name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Clone { .. } => "clone",
            Self::CreateBranch { .. } => "create_branch",
            Self::CommitEmpty { .. } => "commit",
            Self::Push { .. } => "push",
        }
    }
}

/// Deterministic version-control adapter.
///
/// Repositories are directories on the shared [`InMemoryDisk`] that carry a
/// status. Clones create them along with any tracked files, commits move
/// them ahead of upstream and pushes bring them level again.
#[derive(Debug, Clone)]
pub struct InMemoryVersionControl {
    disk: InMemoryDisk,
    state: Arc<RwLock<VcsState>>,
}

#[derive(Debug, Default)]
struct VcsState {
    operations: Vec<VcsOperation>,
    failures: HashMap<&'static str, String>,
    tracked_files: Vec<(String, String)>,
}

fn lock_error(err: &impl std::fmt::Display) -> VcsError {
    VcsError::runtime(std::io::Error::other(err.to_string()))
}

impl InMemoryVersionControl {
    /// Creates an adapter over a disk.
    #[must_use]
    pub fn new(disk: InMemoryDisk) -> Self {
        Self {
            disk,
            state: Arc::default(),
        }
    }

    /// Makes every later call of the named operation fail.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when `operation` is not one of
    /// [`OPERATION_NAMES`] or lock acquisition fails.
    pub fn fail_operation(&self, operation: &str, message: impl Into<String>) -> VcsResult<()> {
        let Some(name) = OPERATION_NAMES.iter().find(|name| **name == operation) else {
            return Err(VcsError::runtime(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "unknown operation {operation:?}; expected one of {}",
                    OPERATION_NAMES.join(", ")
                ),
            )));
        };
        self.state
            .write()
            .map_err(|err| lock_error(&err))?
            .failures
            .insert(*name, message.into());
        Ok(())
    }

    /// Adds a file that every later clone contains, relative to the clone
    /// root.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn track_file(
        &self,
        relative_path: impl Into<String>,
        contents: impl Into<String>,
    ) -> VcsResult<()> {
        self.state
            .write()
            .map_err(|err| lock_error(&err))?
            .tracked_files
            .push((relative_path.into(), contents.into()));
        Ok(())
    }

    /// Returns every operation attempted so far, in order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn operations(&self) -> VcsResult<Vec<VcsOperation>> {
        Ok(self.state.read().map_err(|err| lock_error(&err))?.operations.clone())
    }

    fn record(&self, operation: VcsOperation) -> VcsResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let name = operation.name();
        state.operations.push(operation);
        match state.failures.get(name) {
            Some(message) => Err(VcsError::CommandFailed {
                operation: name,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn update_repository(
        &self,
        dir: &Utf8Path,
        apply: impl FnOnce(&mut RepositoryStatus),
    ) -> VcsResult<()> {
        let mut disk = self.disk.write().map_err(VcsError::runtime)?;
        let Some(Some(status)) = disk.dirs.get_mut(dir) else {
            return Err(VcsError::NotARepository(dir.to_owned()));
        };
        apply(status);
        Ok(())
    }
}

#[async_trait]
impl VersionControlPort for InMemoryVersionControl {
    async fn status(&self, dir: &Utf8Path) -> VcsResult<RepositoryStatus> {
        self.record(VcsOperation::Status(dir.to_owned()))?;
        self.disk
            .repository(dir)
            .map_err(VcsError::runtime)?
            .ok_or_else(|| VcsError::NotARepository(dir.to_owned()))
    }

    async fn clone_branch(&self, request: &CloneRequest) -> VcsResult<()> {
        self.record(VcsOperation::Clone {
            branch: request.branch.clone(),
            destination: request.destination.clone(),
        })?;
        if self
            .disk
            .contains(&request.destination)
            .map_err(VcsError::runtime)?
        {
            return Err(VcsError::CommandFailed {
                operation: "clone",
                message: format!("destination {} already exists", request.destination),
            });
        }
        self.disk
            .create_repository(
                request.destination.clone(),
                RepositoryStatus::clean(request.remote_url.clone(), request.branch.as_str()),
            )
            .map_err(VcsError::runtime)?;
        let tracked = self
            .state
            .read()
            .map_err(|err| lock_error(&err))?
            .tracked_files
            .clone();
        for (relative_path, contents) in tracked {
            self.disk
                .write_file(request.destination.join(relative_path), contents)
                .map_err(VcsError::runtime)?;
        }
        Ok(())
    }

    async fn create_branch(&self, dir: &Utf8Path, branch: &BranchName) -> VcsResult<()> {
        self.record(VcsOperation::CreateBranch {
            dir: dir.to_owned(),
            branch: branch.clone(),
        })?;
        self.update_repository(dir, |status| {
            branch.as_str().clone_into(&mut status.branch);
            status.ahead = 0;
            status.behind = 0;
        })
    }

    async fn commit_empty(&self, dir: &Utf8Path, message: &str) -> VcsResult<()> {
        self.record(VcsOperation::CommitEmpty {
            dir: dir.to_owned(),
            message: message.to_owned(),
        })?;
        self.update_repository(dir, |status| {
            status.ahead = status.ahead.saturating_add(1);
        })
    }

    async fn push_upstream(&self, dir: &Utf8Path, branch: &BranchName) -> VcsResult<()> {
        self.record(VcsOperation::Push {
            dir: dir.to_owned(),
            branch: branch.clone(),
        })?;
        self.update_repository(dir, |status| {
            status.ahead = 0;
        })
    }
}
