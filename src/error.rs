//! Error handling for codepack
//!
//! Fatal failures abort a run through [`PackError`]. Failures tied to a single
//! entry are collected as [`EntryReadError`] values in the run summary instead.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal error for a pack run
#[derive(Error, Debug)]
pub enum PackError {
    /// Input root does not exist
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input root exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Output destination could not be opened or written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON report errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other file system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Specialized Result type for codepack operations
pub type Result<T> = std::result::Result<T, PackError>;

/// A single entry that could not be read during traversal
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{path}: {message}")]
pub struct EntryReadError {
    /// Path of the entry, relative to the scan root when possible
    pub path: String,
    /// Description of the failure
    pub message: String,
}

impl EntryReadError {
    pub fn new(path: impl Into<String>, message: impl ToString) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Creates a PackError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::PackError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// Lets the binary and tests use `?` in io::Result contexts
impl From<PackError> for io::Error {
    fn from(err: PackError) -> Self {
        let kind = match &err {
            PackError::NotFound(_) => io::ErrorKind::NotFound,
            PackError::Write { source, .. } => source.kind(),
            PackError::Io(source) => source.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.to_string())
    }
}
