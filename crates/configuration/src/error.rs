//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use crate::environment::Variable;

/// The errors that can be thrown when processing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("I/O error on {file_path}: {source}")]
    IoError {
        file_path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported configuration version {0}, expected 1")]
    UnsupportedVersion(u32),
}

/// The errors that can be thrown when resolving a parsed configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MakeRuntimeConfigurationError {
    #[error("missing environment variable when processing {attribute}: {variable}")]
    MissingEnvironmentVariable {
        attribute: String,
        variable: Variable,
    },
}
