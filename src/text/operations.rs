use crate::plan::Transform;
use crate::text::errors::TextError;
use crate::text::lines;
use std::fmt;

/// A single line-oriented or whole-content mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOperation {
    /// `KEY=value` lines: replace what follows the separator
    ReplaceValue {
        marker: String,
        separator: String,
        value: String,
    },
    /// Substitute a placeholder everywhere in the file
    ReplaceAll { placeholder: String, value: String },
    /// Drop lines equal to `line`
    RemoveLine { line: String },
    /// `image:tag` references: replace the tag after `marker` + `delimiter`
    ReplaceTag {
        marker: String,
        delimiter: String,
        value: String,
    },
}

impl TextOperation {
    pub fn validate(&self) -> Result<(), TextError> {
        match self {
            TextOperation::ReplaceValue {
                marker,
                separator,
                value,
            } => {
                require_non_empty("marker", marker)?;
                require_non_empty("separator", separator)?;
                require_single_line("marker", marker)?;
                require_single_line("value", value)
            }
            TextOperation::ReplaceAll { placeholder, .. } => {
                require_non_empty("placeholder", placeholder)
            }
            TextOperation::RemoveLine { line } => {
                require_non_empty("line", line)?;
                require_single_line("line", line)
            }
            TextOperation::ReplaceTag {
                marker,
                delimiter,
                value,
            } => {
                require_non_empty("marker", marker)?;
                require_non_empty("delimiter", delimiter)?;
                require_single_line("marker", marker)?;
                require_single_line("value", value)?;
                if value.chars().any(char::is_whitespace) {
                    return Err(TextError::WhitespaceInTag {
                        value: value.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Run the operation over `content` without touching the file system.
    pub fn apply_to(&self, content: &str) -> Result<Transform, TextError> {
        self.validate()?;
        let transform = match self {
            TextOperation::ReplaceValue {
                marker,
                separator,
                value,
            } => lines::replace_value(content, marker, separator, value),
            TextOperation::ReplaceAll { placeholder, value } => {
                lines::replace_all(content, placeholder, value)
            }
            TextOperation::RemoveLine { line } => lines::remove_line(content, line),
            TextOperation::ReplaceTag {
                marker,
                delimiter,
                value,
            } => lines::replace_tag(content, marker, delimiter, value),
        };
        Ok(transform)
    }
}

impl fmt::Display for TextOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextOperation::ReplaceValue {
                marker, separator, ..
            } => write!(f, "line containing '{marker}' with '{separator}'"),
            TextOperation::ReplaceAll { placeholder, .. } => write!(f, "placeholder '{placeholder}'"),
            TextOperation::RemoveLine { line } => write!(f, "line '{line}'"),
            TextOperation::ReplaceTag {
                marker, delimiter, ..
            } => write!(f, "tag after '{marker}{delimiter}'"),
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), TextError> {
    if value.is_empty() {
        return Err(TextError::EmptyPattern { field });
    }
    Ok(())
}

fn require_single_line(field: &'static str, value: &str) -> Result<(), TextError> {
    if value.contains(['\n', '\r']) {
        return Err(TextError::MultilineValue {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_marker_rejected() {
        let op = TextOperation::ReplaceValue {
            marker: String::new(),
            separator: "=".to_string(),
            value: "x".to_string(),
        };
        assert!(matches!(
            op.apply_to("A=1\n"),
            Err(TextError::EmptyPattern { field: "marker" })
        ));
    }

    #[test]
    fn test_multiline_value_rejected() {
        let op = TextOperation::ReplaceValue {
            marker: "MAGENTO_URL".to_string(),
            separator: "=".to_string(),
            value: "a\nINJECTED=1".to_string(),
        };
        assert!(matches!(
            op.validate(),
            Err(TextError::MultilineValue { field: "value", .. })
        ));
    }

    #[test]
    fn test_replace_all_allows_multiline_value() {
        let op = TextOperation::ReplaceAll {
            placeholder: "{{BLOCK}}".to_string(),
            value: "a\nb".to_string(),
        };
        assert_eq!(
            op.apply_to("x {{BLOCK}} y").unwrap(),
            Transform::Changed("x a\nb y".to_string())
        );
    }

    #[test]
    fn test_tag_with_whitespace_rejected() {
        let op = TextOperation::ReplaceTag {
            marker: "alexcheng/apache2-php5".to_string(),
            delimiter: ":".to_string(),
            value: "7.0 AS evil".to_string(),
        };
        assert!(matches!(
            op.validate(),
            Err(TextError::WhitespaceInTag { .. })
        ));
    }

    #[test]
    fn test_display_names_target() {
        let op = TextOperation::RemoveLine {
            line: "RUN true".to_string(),
        };
        assert_eq!(op.to_string(), "line 'RUN true'");
    }
}
