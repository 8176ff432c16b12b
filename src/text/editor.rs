use crate::plan::Plan;
use crate::text::errors::TextError;
use crate::text::operations::TextOperation;
use std::fs;
use std::path::{Path, PathBuf};

/// Plans text operations against one file's content.
pub struct TextEditor {
    file: PathBuf,
    content: String,
}

impl TextEditor {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            file: path.into(),
            content: content.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TextError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, content))
    }

    pub fn plan(&self, operation: &TextOperation) -> Result<Plan, TextError> {
        let transform = operation.apply_to(&self.content)?;
        tracing::debug!(file = %self.file.display(), %operation, ?transform, "planned text operation");
        Ok(Plan::new(
            &self.file,
            &self.content,
            transform,
            &operation.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::RewriteResult;

    #[test]
    fn test_plan_and_apply_hostname() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("docker_env");
        fs::write(&path, "MAGENTO_URL=http://old.test\nMYSQL_HOST=db\n").unwrap();

        let editor = TextEditor::from_path(&path).unwrap();
        let plan = editor
            .plan(&TextOperation::ReplaceValue {
                marker: "MAGENTO_URL".to_string(),
                separator: "=".to_string(),
                value: "new.ngrok.io".to_string(),
            })
            .unwrap();

        let Plan::Rewrite(rewrite) = plan else {
            panic!("expected rewrite, got {plan:?}");
        };
        assert!(matches!(rewrite.apply().unwrap(), RewriteResult::Applied { .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "MAGENTO_URL=new.ngrok.io\nMYSQL_HOST=db\n"
        );
    }

    #[test]
    fn test_plan_unmatched_marker() {
        let editor = TextEditor::new("docker_env", "MYSQL_HOST=db\n");
        let plan = editor
            .plan(&TextOperation::ReplaceValue {
                marker: "MAGENTO_URL".to_string(),
                separator: "=".to_string(),
                value: "x".to_string(),
            })
            .unwrap();
        assert!(matches!(plan, Plan::Unmatched(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = TextEditor::from_path(temp_dir.path().join("docker_env"));
        assert!(matches!(result, Err(TextError::Read { .. })));
    }
}
