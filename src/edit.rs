use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental write primitive: whole-file replacement with verification.
///
/// Every operation (line edits, placeholder substitution, YAML field updates)
/// computes the complete new content in memory and compiles down to this
/// single primitive. Intelligence lives in the transform, not the write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Rewrite does nothing until apply() is called"]
pub struct Rewrite {
    /// Path to the file to rewrite (already resolved against the workspace)
    pub file: PathBuf,
    /// Full content the file should hold afterwards
    pub new_content: String,
    /// Verification of the content the rewrite was computed from
    pub expected_before: ContentVerification,
}

/// Verification strategy for rewrite safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (cheaper to hold for large files)
    Hash(u64),
}

impl ContentVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            ContentVerification::ExactMatch(expected) => text == expected,
            ContentVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            ContentVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            ContentVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("{file} changed since it was read; refusing to overwrite")]
    ContentChanged { file: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result of applying a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RewriteResult should be checked for success/already-applied"]
pub enum RewriteResult {
    /// File content was replaced
    Applied { file: PathBuf, bytes_written: usize },
    /// File already holds the new content
    AlreadyApplied { file: PathBuf },
}

impl Rewrite {
    /// Create a rewrite of `file` from `before` to `new_content`.
    pub fn new(file: impl Into<PathBuf>, before: &str, new_content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            new_content: new_content.into(),
            expected_before: ContentVerification::from_text(before),
        }
    }

    /// Check the rewrite against the current file contents.
    ///
    /// Returns `true` when the file already holds the new content.
    fn validate(&self, current: &str) -> Result<bool, RewriteError> {
        if current == self.new_content {
            return Ok(true);
        }

        if !self.expected_before.matches(current) {
            return Err(RewriteError::ContentChanged {
                file: self.file.clone(),
            });
        }

        Ok(false)
    }

    /// Apply this rewrite to the file system atomically.
    ///
    /// Uses tempfile + fsync + rename, so the target either keeps its old
    /// content or holds the new content in full.
    pub fn apply(&self) -> Result<RewriteResult, RewriteError> {
        let original = fs::read(&self.file)?;
        let current = std::str::from_utf8(&original)?;

        if self.validate(current)? {
            return Ok(RewriteResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        atomic_write(&self.file, self.new_content.as_bytes())?;
        tracing::info!(
            file = %self.file.display(),
            bytes = self.new_content.len(),
            "rewrote file"
        );

        Ok(RewriteResult::Applied {
            file: self.file.clone(),
            bytes_written: self.new_content.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The temp file lives in the target's directory so the rename never
/// crosses filesystems. Existing permissions are carried over.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), RewriteError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(RewriteError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
