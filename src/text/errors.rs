use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextError {
    #[error("{field} must not be empty")]
    EmptyPattern { field: &'static str },

    #[error("{field} must fit on a single line: {value:?}")]
    MultilineValue { field: &'static str, value: String },

    #[error("tag must not contain whitespace: {value:?}")]
    WhitespaceInTag { value: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
