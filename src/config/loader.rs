use crate::config::schema::{PatchConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Discovery {
        dir: PathBuf,
        source: walkdir::Error,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read patch set {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse patch set TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse patch set TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid patch set ({}): {}", path.display(), source),
                None => write!(f, "invalid patch set: {}", source),
            },
            ConfigError::Discovery { dir, source } => {
                write!(f, "failed to scan {} for patch sets: {}", dir.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Discovery { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// List the `.toml` patch sets directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn discover_patch_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Discovery {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Operation;

    const HOSTNAME_PATCH: &str = r#"
[meta]
name = "tunnel"

[[patches]]
id = "store-hostname"
file = "docker_env"

[patches.operation]
type = "replace-value"
marker = "MAGENTO_URL"
"#;

    #[test]
    fn test_defaults_filled_in() {
        let config = load_from_str(HOSTNAME_PATCH).unwrap();
        assert_eq!(
            config.patches[0].operation,
            Operation::ReplaceValue {
                marker: "MAGENTO_URL".to_string(),
                separator: "=".to_string(),
                value: None,
            }
        );
        assert!(!config.patches[0].require_match);
    }

    #[test]
    fn test_validation_error_carries_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.toml");
        fs::write(&path, "[meta]\nname = \"empty\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains("empty.toml"));
        assert!(err.to_string().contains("contains no patches"));
    }

    #[test]
    fn test_unknown_operation_type() {
        let input = HOSTNAME_PATCH.replace("replace-value", "rewrite-everything");
        assert!(matches!(
            load_from_str(&input),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_discover_only_toml_files_sorted() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("20-php.toml"), "").unwrap();
        fs::write(temp_dir.path().join("10-hostname.toml"), "").unwrap();
        fs::write(temp_dir.path().join("README.md"), "").unwrap();
        fs::create_dir(temp_dir.path().join("archived")).unwrap();
        fs::write(temp_dir.path().join("archived/00-old.toml"), "").unwrap();

        let files = discover_patch_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["10-hostname.toml", "20-php.toml"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let files = discover_patch_files(temp_dir.path().join("patches")).unwrap();
        assert!(files.is_empty());
    }
}
