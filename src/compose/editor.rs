use crate::compose::errors::ComposeError;
use crate::compose::schema::{ComposeFile, ImageRef};
use crate::plan::{Plan, Transform};
use std::fs;
use std::path::{Path, PathBuf};

/// Point `services.<service>.image` at a new tag, keeping its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTagUpdate {
    pub service: String,
    pub delimiter: String,
    pub tag: String,
}

impl ImageTagUpdate {
    pub fn new(service: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            delimiter: ":".to_string(),
            tag: tag.into(),
        }
    }

    /// Run the update over `content` without touching the file system.
    ///
    /// The document is only re-serialized when the image actually changes,
    /// so an up-to-date file keeps its original formatting.
    pub fn apply_to(&self, content: &str) -> Result<Transform, ComposeError> {
        if self.service.is_empty() {
            return Err(ComposeError::EmptyField { field: "service" });
        }
        if self.delimiter.is_empty() {
            return Err(ComposeError::EmptyField { field: "delimiter" });
        }

        let mut document = parse_document(content)?;

        let service = document.services.get_mut(&self.service).ok_or_else(|| {
            ComposeError::MissingService {
                service: self.service.clone(),
            }
        })?;
        let image = service
            .image
            .as_deref()
            .ok_or_else(|| ComposeError::MissingImage {
                service: self.service.clone(),
            })?;

        let updated = ImageRef::parse(image, &self.delimiter).with_tag(&self.delimiter, &self.tag);
        if updated == image {
            return Ok(Transform::Unchanged);
        }
        service.image = Some(updated);

        let rendered =
            serde_yaml::to_string(&document).map_err(|err| ComposeError::Serialize {
                message: err.to_string(),
            })?;
        Ok(Transform::Changed(rendered))
    }
}

/// Parse a compose document with `<<` merge keys resolved.
fn parse_document(content: &str) -> Result<ComposeFile, ComposeError> {
    let invalid = |err: serde_yaml::Error| ComposeError::InvalidDocument {
        message: err.to_string(),
    };
    let mut value: serde_yaml::Value = serde_yaml::from_str(content).map_err(invalid)?;
    value.apply_merge().map_err(invalid)?;
    serde_yaml::from_value(value).map_err(invalid)
}

/// Plans structured updates against one compose file.
pub struct ComposeEditor {
    file: PathBuf,
    content: String,
}

impl ComposeEditor {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            file: path.into(),
            content: content.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ComposeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, content))
    }

    pub fn plan(&self, update: &ImageTagUpdate) -> Result<Plan, ComposeError> {
        let transform = update.apply_to(&self.content)?;
        tracing::debug!(
            file = %self.file.display(),
            service = %update.service,
            tag = %update.tag,
            "planned image tag update"
        );
        Ok(Plan::new(
            &self.file,
            &self.content,
            transform,
            &format!("services.{}.image", update.service),
        ))
    }
}
