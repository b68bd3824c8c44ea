//! Capability-scoped filesystem adapter for the clones root.

use crate::workspace::ports::{FilesystemError, FilesystemResult, WorkspaceFilesystem};
use async_trait::async_trait;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;

/// Filesystem adapter confined to a single root directory.
///
/// Callers pass absolute paths beneath the root; anything else is rejected
/// with [`FilesystemError::OutsideRoot`] before touching the disk. All I/O
/// runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct CapabilityFilesystem {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl CapabilityFilesystem {
    /// Opens the clones root.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::Io`] when the root cannot be opened.
    pub fn open(root_dir: impl Into<Utf8PathBuf>) -> FilesystemResult<Self> {
        let root: Utf8PathBuf = root_dir.into();
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|err| FilesystemError::io(root.clone(), err))?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn relative(&self, path: &Utf8Path) -> FilesystemResult<Utf8PathBuf> {
        let outside = || FilesystemError::OutsideRoot(path.to_owned());
        let relative = path.strip_prefix(&self.root).map_err(|_| outside())?;
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Utf8Component::Normal(_)));
        if relative.as_str().is_empty() || escapes {
            return Err(outside());
        }
        Ok(relative.to_owned())
    }

    async fn run_blocking<F, T>(&self, path: &Utf8Path, f: F) -> FilesystemResult<T>
    where
        F: FnOnce(&Dir) -> FilesystemResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || f(&dir))
            .await
            .map_err(|err| FilesystemError::io(path, std::io::Error::other(err)))?
    }
}

fn map_io(path: &Utf8Path, err: std::io::Error) -> FilesystemError {
    if err.kind() == ErrorKind::NotFound {
        FilesystemError::NotFound(path.to_owned())
    } else {
        FilesystemError::io(path, err)
    }
}

#[async_trait]
impl WorkspaceFilesystem for CapabilityFilesystem {
    async fn exists(&self, path: &Utf8Path) -> FilesystemResult<bool> {
        let relative = self.relative(path)?;
        let full = path.to_owned();
        self.run_blocking(path, move |dir| match dir.symlink_metadata(&relative) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FilesystemError::io(full, err)),
        })
        .await
    }

    async fn rename(&self, from: &Utf8Path, to: &Utf8Path) -> FilesystemResult<()> {
        let source = self.relative(from)?;
        let target = self.relative(to)?;
        let full = from.to_owned();
        self.run_blocking(from, move |dir| {
            dir.rename(&source, dir, &target)
                .map_err(|err| map_io(&full, err))
        })
        .await
    }

    async fn remove_all(&self, path: &Utf8Path) -> FilesystemResult<()> {
        let relative = self.relative(path)?;
        let full = path.to_owned();
        self.run_blocking(path, move |dir| {
            dir.remove_dir_all(&relative)
                .map_err(|err| map_io(&full, err))
        })
        .await
    }

    async fn read_optional(&self, path: &Utf8Path) -> FilesystemResult<Option<String>> {
        let relative = self.relative(path)?;
        let full = path.to_owned();
        self.run_blocking(path, move |dir| match dir.read_to_string(&relative) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(FilesystemError::io(full, err)),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Root {
        _temp: TempDir,
        path: Utf8PathBuf,
        fs: CapabilityFilesystem,
    }

    #[fixture]
    fn root() -> Root {
        let temp = TempDir::new().expect("temporary directory");
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("temporary directory path should be UTF-8");
        let fs = CapabilityFilesystem::open(path.clone()).expect("open clones root");
        Root {
            _temp: temp,
            path,
            fs,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn renames_and_removes_clone_directories(root: Root) {
        let pending = root.path.join("pending-1-0");
        let final_dir = root.path.join("pr-7");
        std::fs::create_dir_all(pending.join("src")).expect("create pending clone");
        std::fs::write(pending.join("CLAUDE.md"), "be kind").expect("write guidelines");

        root.fs.rename(&pending, &final_dir).await.expect("rename");

        assert!(!root.fs.exists(&pending).await.expect("exists pending"));
        assert_eq!(
            root.fs
                .read_optional(&final_dir.join("CLAUDE.md"))
                .await
                .expect("read guidelines"),
            Some("be kind".to_owned())
        );

        root.fs.remove_all(&final_dir).await.expect("remove");
        assert!(!root.fs.exists(&final_dir).await.expect("exists final"));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_files_read_as_none(root: Root) {
        let missing = root.path.join("pr-1").join("CLAUDE.md");

        let contents = root.fs.read_optional(&missing).await.expect("read");

        assert_eq!(contents, None);
    }

    #[rstest]
    #[case("/etc/passwd")]
    #[case("")]
    #[tokio::test]
    async fn paths_outside_the_root_are_rejected(root: Root, #[case] suffix: &str) {
        let path = if suffix.is_empty() {
            root.path.clone()
        } else {
            Utf8PathBuf::from(suffix)
        };

        let result = root.fs.remove_all(&path).await;

        assert!(matches!(result, Err(FilesystemError::OutsideRoot(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn removing_a_missing_directory_is_not_found(root: Root) {
        let result = root.fs.remove_all(&root.path.join("pr-404")).await;

        assert!(matches!(result, Err(FilesystemError::NotFound(_))));
    }
}
