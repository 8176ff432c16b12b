//! Patch applicator - runs patch definitions against a workspace
//!
//! This module provides high-level patch application that:
//! - Resolves every target inside the workspace guard
//! - Groups patches by file so each file is read and written once
//! - Runs each file's patches in declaration order on the in-memory content
//! - Reports a result per patch, plus the before/after text of each file

use crate::compose::{ComposeEditor, ComposeError, ImageTagUpdate};
use crate::config::schema::{Operation, PatchConfig, PatchDefinition};
use crate::edit::Rewrite;
use crate::plan::Plan;
use crate::safety::{SafetyError, WorkspaceGuard};
use crate::text::{TextEditor, TextError, TextOperation};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of applying a single patch
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for success/failure"]
pub enum PatchResult {
    /// Patch changed the file (or would, in check mode)
    Applied { file: PathBuf },
    /// File already had the patched content
    AlreadyApplied { file: PathBuf },
    /// Nothing in the file matched; the file was left as it was
    Unmatched { file: PathBuf, reason: String },
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Applied { file } => write!(f, "Applied patch to {}", file.display()),
            PatchResult::AlreadyApplied { file } => {
                write!(f, "Already applied to {}", file.display())
            }
            PatchResult::Unmatched { file, reason } => {
                write!(f, "No match in {}: {}", file.display(), reason)
            }
        }
    }
}

/// Errors during patch application
#[derive(Debug)]
pub enum ApplicationError {
    /// Workspace root could not be resolved
    Workspace(SafetyError),
    /// Target path missing or outside the workspace
    Target(SafetyError),
    /// File I/O error
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Patch needs a value but neither the patch set nor the caller gave one
    MissingValue { patch_id: String },
    /// Line operation rejected its inputs
    Text { file: PathBuf, source: TextError },
    /// Compose document could not be updated
    Compose { file: PathBuf, source: ComposeError },
    /// Nothing matched and a match was required
    NoMatch { file: PathBuf, reason: String },
    /// Writing the patched file failed; nothing was written
    Write { file: PathBuf, reason: String },
    /// Another patch on the same file failed, so this one was not written
    Skipped { file: PathBuf, failed_patch: String },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Workspace(e) => write!(f, "invalid workspace: {}", e),
            ApplicationError::Target(e) => write!(f, "invalid target: {}", e),
            ApplicationError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ApplicationError::MissingValue { patch_id } => {
                write!(f, "patch '{}' needs a value argument", patch_id)
            }
            ApplicationError::Text { file, source } => {
                write!(f, "text operation failed on {}: {}", file.display(), source)
            }
            ApplicationError::Compose { file, source } => {
                write!(f, "compose update failed on {}: {}", file.display(), source)
            }
            ApplicationError::NoMatch { file, reason } => {
                write!(f, "no match in {}: {}", file.display(), reason)
            }
            ApplicationError::Write { file, reason } => {
                write!(f, "failed to write {}: {}", file.display(), reason)
            }
            ApplicationError::Skipped { file, failed_patch } => write!(
                f,
                "not written: patch '{}' failed on {}",
                failed_patch,
                file.display()
            ),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Workspace(e) | ApplicationError::Target(e) => Some(e),
            ApplicationError::Io { source, .. } => Some(source),
            ApplicationError::Text { source, .. } => Some(source),
            ApplicationError::Compose { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Caller-supplied inputs shared by every patch in a run.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Value for patches that do not fix one in the patch set
    pub argument: Option<String>,
    /// Fail patches that match nothing
    pub strict: bool,
}

/// Content of one file before and after its patches ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub file: PathBuf,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub results: Vec<(String, Result<PatchResult, ApplicationError>)>,
    pub changes: Vec<FileChange>,
}

impl ApplyReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Write,
    Check,
}

/// Apply a patch configuration to a workspace
///
/// # Arguments
///
/// * `config` - The patch configuration to apply
/// * `workspace_root` - Directory the patch files are relative to
/// * `options` - Value argument and strictness
pub fn apply_patches(
    config: &PatchConfig,
    workspace_root: &Path,
    options: &ApplyOptions,
) -> ApplyReport {
    run_patches(config, workspace_root, options, Mode::Write)
}

/// Evaluate patches without modifying the workspace.
///
/// Result semantics match `apply_patches` (`Applied` means "would apply").
pub fn check_patches(
    config: &PatchConfig,
    workspace_root: &Path,
    options: &ApplyOptions,
) -> ApplyReport {
    run_patches(config, workspace_root, options, Mode::Check)
}

fn run_patches(
    config: &PatchConfig,
    workspace_root: &Path,
    options: &ApplyOptions,
    mode: Mode,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    let guard = match WorkspaceGuard::new(workspace_root) {
        Ok(guard) => guard,
        Err(err) => {
            let file = workspace_root.to_path_buf();
            let mut patches = config.patches.iter();
            if let Some(first) = patches.next() {
                report
                    .results
                    .push((first.id.clone(), Err(ApplicationError::Workspace(err))));
                for patch in patches {
                    report.results.push((
                        patch.id.clone(),
                        Err(ApplicationError::Skipped {
                            file: file.clone(),
                            failed_patch: first.id.clone(),
                        }),
                    ));
                }
            }
            return report;
        }
    };

    for target in group_by_file(&guard, &config.patches) {
        match target {
            Target::File { path, patches } => run_file(path, &patches, options, mode, &mut report),
            Target::Invalid { patch, error } => report
                .results
                .push((patch.id.clone(), Err(ApplicationError::Target(error)))),
        }
    }

    report
}

/// Patches sharing one resolved file, or a patch whose file did not resolve.
enum Target<'a> {
    File {
        path: PathBuf,
        patches: Vec<&'a PatchDefinition>,
    },
    Invalid {
        patch: &'a PatchDefinition,
        error: SafetyError,
    },
}

/// Resolve every patch's file through the guard and group patches by the
/// resolved path, keeping first-appearance order.
///
/// Different spellings of one file (`docker_env`, `./docker_env`, a
/// symlink) land in the same group.
fn group_by_file<'a>(guard: &WorkspaceGuard, patches: &'a [PatchDefinition]) -> Vec<Target<'a>> {
    let mut targets: Vec<Target<'a>> = Vec::new();
    for patch in patches {
        let resolved = match guard.validate_path(&patch.file) {
            Ok(resolved) => resolved,
            Err(error) => {
                targets.push(Target::Invalid { patch, error });
                continue;
            }
        };

        let existing = targets.iter_mut().find_map(|target| match target {
            Target::File { path, patches } if *path == resolved => Some(patches),
            _ => None,
        });
        match existing {
            Some(group) => group.push(patch),
            None => targets.push(Target::File {
                path: resolved,
                patches: vec![patch],
            }),
        }
    }
    targets
}

fn run_file(
    path: PathBuf,
    patches: &[&PatchDefinition],
    options: &ApplyOptions,
    mode: Mode,
    report: &mut ApplyReport,
) {
    let original = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) => {
            let err = ApplicationError::Io {
                path: path.clone(),
                source,
            };
            fail_group(patches, 0, err, &path, report);
            return;
        }
    };

    let mut current = original.clone();
    let mut outcomes = Vec::with_capacity(patches.len());

    for (index, patch) in patches.iter().enumerate() {
        let step = match Step::resolve(patch, options.argument.as_deref()) {
            Ok(step) => step,
            Err(err) => {
                fail_group(patches, index, err, &path, report);
                return;
            }
        };

        let plan = match step.plan(&path, &current) {
            Ok(plan) => plan,
            Err(err) => {
                fail_group(patches, index, err, &path, report);
                return;
            }
        };

        let outcome = match plan {
            Plan::Rewrite(rewrite) => {
                current = rewrite.new_content;
                PatchResult::Applied { file: path.clone() }
            }
            Plan::Unchanged(_) => PatchResult::AlreadyApplied { file: path.clone() },
            Plan::Unmatched(reason) => {
                if options.strict || patch.require_match {
                    let err = ApplicationError::NoMatch {
                        file: path.clone(),
                        reason,
                    };
                    fail_group(patches, index, err, &path, report);
                    return;
                }
                tracing::warn!(patch = %patch.id, file = %path.display(), %reason, "patch matched nothing");
                PatchResult::Unmatched {
                    file: path.clone(),
                    reason,
                }
            }
        };
        outcomes.push(outcome);
    }

    if current != original {
        if mode == Mode::Write {
            if let Err(err) = Rewrite::new(&path, &original, current.as_str()).apply() {
                let reason = err.to_string();
                for patch in patches {
                    report.results.push((
                        patch.id.clone(),
                        Err(ApplicationError::Write {
                            file: path.clone(),
                            reason: reason.clone(),
                        }),
                    ));
                }
                return;
            }
        }
        report.changes.push(FileChange {
            file: path,
            before: original,
            after: current,
        });
    }

    for (patch, outcome) in patches.iter().zip(outcomes) {
        report.results.push((patch.id.clone(), Ok(outcome)));
    }
}

/// Record `err` for `patches[failed]` and mark the rest of the file's patches skipped.
fn fail_group(
    patches: &[&PatchDefinition],
    failed: usize,
    err: ApplicationError,
    file: &Path,
    report: &mut ApplyReport,
) {
    tracing::debug!(patch = %patches[failed].id, file = %file.display(), error = %err, "patch failed");
    let failed_id = patches[failed].id.clone();
    let mut err = Some(err);
    for (index, patch) in patches.iter().enumerate() {
        let error = if index == failed { err.take() } else { None };
        let error = error.unwrap_or_else(|| ApplicationError::Skipped {
            file: file.to_path_buf(),
            failed_patch: failed_id.clone(),
        });
        report.results.push((patch.id.clone(), Err(error)));
    }
}

/// A patch definition with its value resolved.
enum Step {
    Text(TextOperation),
    Compose(ImageTagUpdate),
}

impl Step {
    fn resolve(patch: &PatchDefinition, argument: Option<&str>) -> Result<Self, ApplicationError> {
        let value = || -> Result<String, ApplicationError> {
            patch
                .operation
                .value()
                .or(argument)
                .map(str::to_string)
                .ok_or_else(|| ApplicationError::MissingValue {
                    patch_id: patch.id.clone(),
                })
        };

        let step = match &patch.operation {
            Operation::ReplaceValue {
                marker, separator, ..
            } => Step::Text(TextOperation::ReplaceValue {
                marker: marker.clone(),
                separator: separator.clone(),
                value: value()?,
            }),
            Operation::ReplaceAll { placeholder, .. } => Step::Text(TextOperation::ReplaceAll {
                placeholder: placeholder.clone(),
                value: value()?,
            }),
            Operation::RemoveLine { line } => {
                Step::Text(TextOperation::RemoveLine { line: line.clone() })
            }
            Operation::ReplaceTag {
                marker, delimiter, ..
            } => Step::Text(TextOperation::ReplaceTag {
                marker: marker.clone(),
                delimiter: delimiter.clone(),
                value: value()?,
            }),
            Operation::SetImageTag {
                service, delimiter, ..
            } => Step::Compose(ImageTagUpdate {
                service: service.clone(),
                delimiter: delimiter.clone(),
                tag: value()?,
            }),
        };
        Ok(step)
    }

    /// Plan this step against the file's content as left by earlier patches.
    fn plan(&self, file: &Path, content: &str) -> Result<Plan, ApplicationError> {
        match self {
            Step::Text(operation) => TextEditor::new(file, content)
                .plan(operation)
                .map_err(|source| ApplicationError::Text {
                    file: file.to_path_buf(),
                    source,
                }),
            Step::Compose(update) => ComposeEditor::new(file, content)
                .plan(update)
                .map_err(|source| ApplicationError::Compose {
                    file: file.to_path_buf(),
                    source,
                }),
        }
    }
}
