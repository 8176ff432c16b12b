use crate::edit::Rewrite;
use std::path::Path;

/// Outcome of running one operation over in-memory content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// The operation matched and produced different content
    Changed(String),
    /// The operation matched, but the content already has the desired shape
    Unchanged,
    /// Nothing in the content matched the operation's target
    Unmatched,
}

impl Transform {
    /// Classify a line-scan result against the content it was computed from.
    pub(crate) fn from_scan(before: &str, after: String, matches: usize) -> Self {
        if matches == 0 {
            Transform::Unmatched
        } else if after == before {
            Transform::Unchanged
        } else {
            Transform::Changed(after)
        }
    }

    /// The content after this transform, given the content before it.
    pub fn content_after<'a>(&'a self, before: &'a str) -> &'a str {
        match self {
            Transform::Changed(after) => after,
            Transform::Unchanged | Transform::Unmatched => before,
        }
    }
}

/// What applying an operation to a file would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Rewrite(Rewrite),
    Unchanged(String),
    Unmatched(String),
}

impl Plan {
    pub(crate) fn new(file: &Path, before: &str, transform: Transform, target: &str) -> Self {
        match transform {
            Transform::Changed(after) => Plan::Rewrite(Rewrite::new(file, before, after)),
            Transform::Unchanged => Plan::Unchanged(format!("{target} already up to date")),
            Transform::Unmatched => Plan::Unmatched(format!("{target} not found")),
        }
    }
}
