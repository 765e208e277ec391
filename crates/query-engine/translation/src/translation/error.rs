//! Errors for query translation.

use query_engine_metadata::metadata::Dialect;
use thiserror::Error;

use super::expression::Operation;
use super::translator::Mode;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Collection '{0}' not found.")]
    CollectionNotFound(String),
    #[error("Column '{name}' not found. Available columns: {}.", .available.join(", "))]
    UnknownColumn {
        name: String,
        available: Vec<String>,
    },
    #[error("The {dialect} dialect does not support '{operation}' in {mode} context.")]
    UnsupportedOperation {
        dialect: Dialect,
        operation: Operation,
        mode: Mode,
    },
    #[error("Invalid arguments to '{operation}': {message}")]
    InvalidOperationArguments {
        operation: Operation,
        message: String,
    },
    #[error("Invalid argument to {verb}: {message}")]
    InvalidVerbArgument { verb: &'static str, message: String },
    #[error(
        "In {verb}, '{column}' refers to a column created in the same call. Split the call in two."
    )]
    AmbiguousColumnReference { verb: &'static str, column: String },
    #[error("Queries containing {0} are not supported.")]
    NotSupported(String),
}

impl Error {
    pub(crate) fn invalid_verb_argument(verb: &'static str, message: impl Into<String>) -> Error {
        Error::InvalidVerbArgument {
            verb,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_operation_arguments(
        operation: Operation,
        message: impl Into<String>,
    ) -> Error {
        Error::InvalidOperationArguments {
            operation,
            message: message.into(),
        }
    }
}
