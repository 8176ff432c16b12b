use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("invalid compose document: {message}")]
    InvalidDocument { message: String },

    #[error("missing field: services.{service}")]
    MissingService { service: String },

    #[error("missing field: services.{service}.image")]
    MissingImage { service: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("failed to serialize compose document: {message}")]
    Serialize { message: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
