//! Per-invocation scratch directory for kustomize input files.
//!
//! All reads and writes go through a [`cap_std::fs::Dir`] handle opened once
//! when the sandbox is created. Path resolution happens relative to that handle,
//! so `..`, absolute paths and symlinks pointing elsewhere cannot reach outside
//! the directory even if its contents change after validation. The lexical checks
//! below only exist to report the precise reason for a rejection.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use crate::error::SandboxError;

const SANDBOX_PREFIX: &str = "helm-kustomize-";

/// An isolated, uniquely named temp directory. Removed on [`Sandbox::destroy`]
/// or drop.
#[derive(Debug)]
pub struct Sandbox {
    root: Option<TempDir>,
    dir: Option<Dir>,
}

impl Sandbox {
    /// Create a fresh sandbox under the platform temp directory.
    pub fn create() -> Result<Self, SandboxError> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Create a fresh sandbox under `base`.
    #[instrument(skip_all, fields(base = %base.display()))]
    pub fn create_in(base: &Path) -> Result<Self, SandboxError> {
        let root = tempfile::Builder::new()
            .prefix(SANDBOX_PREFIX)
            .tempdir_in(base)
            .map_err(SandboxError::Create)?;
        let dir = Dir::open_ambient_dir(root.path(), ambient_authority())
            .map_err(SandboxError::Create)?;
        debug!(path = %root.path().display(), "created sandbox");
        Ok(Self {
            root: Some(root),
            dir: Some(dir),
        })
    }

    /// Absolute path of the sandbox directory, `None` once destroyed.
    pub fn path(&self) -> Option<&Path> {
        self.root.as_ref().map(TempDir::path)
    }

    /// Write `content` to `path`, creating parent directories as needed.
    /// Existing files are overwritten.
    pub fn write_file(&self, path: &str, content: &[u8]) -> Result<(), SandboxError> {
        let dir = self.dir()?;
        let rel = normalize(path)?;
        if let Some(parent) = rel.parent().filter(|p| !p.as_os_str().is_empty()) {
            dir.create_dir_all(parent).map_err(|source| SandboxError::Io {
                op: "create directory",
                path: parent.display().to_string(),
                source,
            })?;
        }
        dir.write(&rel, content).map_err(|source| SandboxError::Io {
            op: "write file",
            path: path.to_string(),
            source,
        })?;
        debug!(path, bytes = content.len(), "wrote sandbox file");
        Ok(())
    }

    /// Read `path` from the sandbox.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, SandboxError> {
        let dir = self.dir()?;
        let rel = normalize(path)?;
        dir.read(&rel).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SandboxError::NotFound(path.to_string()),
            _ => SandboxError::Io {
                op: "read file",
                path: path.to_string(),
                source,
            },
        })
    }

    /// Write every entry of `files`. Stops at the first failure, leaving the
    /// sandbox partially populated; callers discard it in that case.
    pub fn extract_all(&self, files: &BTreeMap<String, String>) -> Result<(), SandboxError> {
        for (path, content) in files {
            self.write_file(path, content.as_bytes())?;
        }
        Ok(())
    }

    /// Remove the sandbox directory recursively.
    ///
    /// Safe to call repeatedly. Failures are logged and otherwise ignored.
    pub fn destroy(&mut self) {
        self.dir = None;
        let Some(root) = self.root.take() else {
            return;
        };
        let path = root.path().to_path_buf();
        match root.close() {
            Ok(()) => debug!(path = %path.display(), "removed sandbox"),
            Err(err) => warn!(
                path = %path.display(),
                err = %err,
                "failed to clean up sandbox directory"
            ),
        }
    }

    fn dir(&self) -> Result<&Dir, SandboxError> {
        self.dir.as_ref().ok_or(SandboxError::Destroyed)
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Collapse `.` and repeated separators, rejecting anything that is not a
/// strict descendant of the sandbox root.
fn normalize(path: &str) -> Result<PathBuf, SandboxError> {
    let mut rel = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(SandboxError::AbsolutePath(path.to_string()));
            }
            Component::ParentDir => return Err(SandboxError::Traversal(path.to_string())),
            Component::CurDir => {}
            Component::Normal(segment) => rel.push(segment),
        }
    }
    if rel.as_os_str().is_empty() {
        return Err(SandboxError::Traversal(path.to_string()));
    }
    Ok(rel)
}
