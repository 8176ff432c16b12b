use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories under the workspace root that patches may never touch.
const PROTECTED_DIRS: &[&str] = &[".git"];

/// Keeps patch targets inside the store workspace.
///
/// Every target is resolved through symlinks and `..` before it is checked,
/// so a path only passes if the file it names really lives under the root.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    root: PathBuf,
    protected: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("{path} is outside the workspace {workspace}")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("{path} is inside protected directory {dir}")]
    Protected { path: PathBuf, dir: PathBuf },

    #[error("cannot resolve {path}: {source}")]
    Unresolvable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl WorkspaceGuard {
    /// Guard the directory at `root`, which must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = resolve(root.as_ref())?;
        let protected = PROTECTED_DIRS
            .iter()
            .filter_map(|dir| root.join(dir).canonicalize().ok())
            .collect();
        Ok(Self { root, protected })
    }

    /// Resolve `target` (relative to the root unless absolute) to the
    /// existing file it names, and reject it if it escapes the workspace.
    pub fn validate_path(&self, target: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let target = target.as_ref();
        let resolved = resolve(&self.root.join(target))?;

        if !resolved.starts_with(&self.root) {
            return Err(SafetyError::OutsideWorkspace {
                path: resolved,
                workspace: self.root.clone(),
            });
        }
        if let Some(dir) = self.protected.iter().find(|dir| resolved.starts_with(dir)) {
            return Err(SafetyError::Protected {
                dir: dir.clone(),
                path: resolved,
            });
        }

        Ok(resolved)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    fn with_protected(root: impl AsRef<Path>, protected: Vec<PathBuf>) -> Result<Self, SafetyError> {
        Ok(Self {
            root: resolve(root.as_ref())?,
            protected,
        })
    }
}

fn resolve(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Unresolvable {
            path: path.to_path_buf(),
            source,
        })
}
