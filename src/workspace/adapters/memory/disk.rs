//! In-memory directory tree shared by the version-control and filesystem
//! adapters.

use crate::workspace::{
    domain::RepositoryStatus,
    ports::{FilesystemError, FilesystemResult, WorkspaceFilesystem},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory directory tree.
///
/// Directories may carry a repository status, which is what
/// [`super::InMemoryVersionControl`] reads and mutates. Renames and
/// removals move or drop everything beneath a path, so repository state
/// follows its directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDisk {
    state: Arc<RwLock<DiskState>>,
}

#[derive(Debug, Default)]
pub(super) struct DiskState {
    pub(super) dirs: BTreeMap<Utf8PathBuf, Option<RepositoryStatus>>,
    pub(super) files: BTreeMap<Utf8PathBuf, String>,
}

impl DiskState {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.dirs.contains_key(path) || self.files.contains_key(path)
    }
}

impl InMemoryDisk {
    /// Creates an empty disk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read(&self) -> std::io::Result<RwLockReadGuard<'_, DiskState>> {
        self.state
            .read()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    pub(super) fn write(&self) -> std::io::Result<RwLockWriteGuard<'_, DiskState>> {
        self.state
            .write()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    /// Creates a plain directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when lock acquisition fails.
    pub fn create_dir(&self, path: impl Into<Utf8PathBuf>) -> std::io::Result<()> {
        self.write()?.dirs.entry(path.into()).or_insert(None);
        Ok(())
    }

    /// Creates a directory holding a repository in the given state.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when lock acquisition fails.
    pub fn create_repository(
        &self,
        path: impl Into<Utf8PathBuf>,
        status: RepositoryStatus,
    ) -> std::io::Result<()> {
        self.write()?.dirs.insert(path.into(), Some(status));
        Ok(())
    }

    /// Writes a file, replacing any previous contents.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when lock acquisition fails.
    pub fn write_file(
        &self,
        path: impl Into<Utf8PathBuf>,
        contents: impl Into<String>,
    ) -> std::io::Result<()> {
        self.write()?.files.insert(path.into(), contents.into());
        Ok(())
    }

    /// Returns the repository status stored for a directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when lock acquisition fails.
    pub fn repository(&self, path: &Utf8Path) -> std::io::Result<Option<RepositoryStatus>> {
        Ok(self.read()?.dirs.get(path).cloned().flatten())
    }

    /// Returns whether a directory or file exists at the path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when lock acquisition fails.
    pub fn contains(&self, path: &Utf8Path) -> std::io::Result<bool> {
        Ok(self.read()?.exists(path))
    }

    /// Returns a filesystem adapter backed by this disk.
    #[must_use]
    pub fn filesystem(&self) -> InMemoryFilesystem {
        InMemoryFilesystem { disk: self.clone() }
    }
}

/// Moves every key at or beneath `from` to the same relative place under
/// `to`.
fn move_subtree<V>(map: &mut BTreeMap<Utf8PathBuf, V>, from: &Utf8Path, to: &Utf8Path) {
    let moved: Vec<Utf8PathBuf> = map
        .keys()
        .filter(|key| key.starts_with(from))
        .cloned()
        .collect();
    for key in moved {
        if let (Some(value), Ok(relative)) = (map.remove(&key), key.strip_prefix(from)) {
            map.insert(to.join(relative), value);
        }
    }
}

/// Filesystem adapter over an [`InMemoryDisk`].
#[derive(Debug, Clone)]
pub struct InMemoryFilesystem {
    disk: InMemoryDisk,
}

#[async_trait]
impl WorkspaceFilesystem for InMemoryFilesystem {
    async fn exists(&self, path: &Utf8Path) -> FilesystemResult<bool> {
        self.disk
            .contains(path)
            .map_err(|err| FilesystemError::io(path, err))
    }

    async fn rename(&self, from: &Utf8Path, to: &Utf8Path) -> FilesystemResult<()> {
        let mut state = self
            .disk
            .write()
            .map_err(|err| FilesystemError::io(from, err))?;
        if !state.exists(from) {
            return Err(FilesystemError::NotFound(from.to_owned()));
        }
        if state.exists(to) {
            return Err(FilesystemError::io(
                to,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target exists"),
            ));
        }
        move_subtree(&mut state.dirs, from, to);
        move_subtree(&mut state.files, from, to);
        Ok(())
    }

    async fn remove_all(&self, path: &Utf8Path) -> FilesystemResult<()> {
        let mut state = self
            .disk
            .write()
            .map_err(|err| FilesystemError::io(path, err))?;
        if !state.exists(path) {
            return Err(FilesystemError::NotFound(path.to_owned()));
        }
        state.dirs.retain(|key, _| !key.starts_with(path));
        state.files.retain(|key, _| !key.starts_with(path));
        Ok(())
    }

    async fn read_optional(&self, path: &Utf8Path) -> FilesystemResult<Option<String>> {
        let state = self
            .disk
            .read()
            .map_err(|err| FilesystemError::io(path, err))?;
        Ok(state.files.get(path).cloned())
    }
}
