use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    patch_id: patch.id.clone(),
                });
            }
            if patch.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "file",
                });
            }

            let required: Vec<(&'static str, &str)> = match &patch.operation {
                Operation::ReplaceValue {
                    marker, separator, ..
                } => vec![
                    ("operation.marker", marker.as_str()),
                    ("operation.separator", separator.as_str()),
                ],
                Operation::ReplaceAll { placeholder, .. } => {
                    vec![("operation.placeholder", placeholder.as_str())]
                }
                Operation::RemoveLine { line } => vec![("operation.line", line.as_str())],
                Operation::ReplaceTag {
                    marker, delimiter, ..
                } => vec![
                    ("operation.marker", marker.as_str()),
                    ("operation.delimiter", delimiter.as_str()),
                ],
                Operation::SetImageTag {
                    service, delimiter, ..
                } => vec![
                    ("operation.service", service.as_str()),
                    ("operation.delimiter", delimiter.as_str()),
                ],
            };
            for (field, value) in required {
                if value.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: Some(patch.id.clone()),
                        field,
                    });
                }
            }

            if patch.operation.is_line_scoped() {
                if let Some(value) = patch.operation.value() {
                    if value.contains(['\n', '\r']) {
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_id: Some(patch.id.clone()),
                            message: "line operations cannot insert multi-line values"
                                .to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    /// Target file, relative to the workspace root
    pub file: String,
    pub operation: Operation,
    /// Treat "nothing matched" as a failure instead of a no-op
    #[serde(default)]
    pub require_match: bool,
}

/// Mutation directives. A `value` left out of the patch file is taken from
/// the command-line argument at apply time.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    ReplaceValue {
        marker: String,
        #[serde(default = "default_separator")]
        separator: String,
        #[serde(default)]
        value: Option<String>,
    },
    ReplaceAll {
        placeholder: String,
        #[serde(default)]
        value: Option<String>,
    },
    RemoveLine {
        line: String,
    },
    ReplaceTag {
        marker: String,
        #[serde(default = "default_delimiter")]
        delimiter: String,
        #[serde(default)]
        value: Option<String>,
    },
    SetImageTag {
        #[serde(default = "default_service")]
        service: String,
        #[serde(default = "default_delimiter")]
        delimiter: String,
        #[serde(default)]
        value: Option<String>,
    },
}

impl Operation {
    /// Fixed value from the patch file, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Operation::ReplaceValue { value, .. }
            | Operation::ReplaceAll { value, .. }
            | Operation::ReplaceTag { value, .. }
            | Operation::SetImageTag { value, .. } => value.as_deref(),
            Operation::RemoveLine { .. } => None,
        }
    }

    pub fn is_line_scoped(&self) -> bool {
        matches!(
            self,
            Operation::ReplaceValue { .. } | Operation::ReplaceTag { .. }
        )
    }
}

fn default_separator() -> String {
    "=".to_string()
}

fn default_delimiter() -> String {
    ":".to_string()
}

fn default_service() -> String {
    "web".to_string()
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        patch_id: String,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { patch_id } => {
                write!(f, "patch id '{patch_id}' is used more than once")
            }
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
