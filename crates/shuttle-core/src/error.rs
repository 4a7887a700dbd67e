//! Error types for shuttle-core.
//!
//! Every error carries a class so the binary can decide whether to abort the
//! invocation, skip one unit of work, or re-prompt the operator.

use std::path::PathBuf;
use thiserror::Error;

/// How the caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Abort the whole invocation.
    Fatal,
    /// Report and continue with the next unit of work.
    Skip,
    /// Bad operator input; report and abort the selection only.
    Input,
}

/// Main error type for shuttle-core.
#[derive(Debug, Error)]
pub enum ShuttleError {
    // Registry structure errors
    #[error("Could not find manifests directory: {0}")]
    ManifestsNotFound(PathBuf),

    #[error("Registry at {root} is empty: {reason}")]
    EmptyRegistry { root: PathBuf, reason: String },

    #[error("Error reading manifest {path}: {message}")]
    ManifestParse {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Unsupported media type for {model}: {media_type}")]
    UnsupportedMediaType { model: String, media_type: String },

    #[error("Blob for {model} does not exist: {path}")]
    MissingBlob { model: String, path: PathBuf },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    // Validation errors
    #[error("Invalid selection '{input}': {message}")]
    InvalidSelection { input: String, message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for shuttle-core operations.
pub type Result<T> = std::result::Result<T, ShuttleError>;

impl ShuttleError {
    /// Create an IO error with path context.
    ///
    /// Permission failures become [`ShuttleError::PermissionDenied`] so callers
    /// can tell them apart without inspecting the io error kind.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            return ShuttleError::PermissionDenied(path);
        }
        ShuttleError::Io {
            message: err.to_string(),
            path: Some(path),
            source: Some(err),
        }
    }

    /// Classify the error for the presentation layer.
    pub fn class(&self) -> ErrorClass {
        match self {
            ShuttleError::MissingBlob { .. } => ErrorClass::Skip,

            ShuttleError::InvalidSelection { .. } => ErrorClass::Input,

            ShuttleError::ManifestsNotFound(_)
            | ShuttleError::EmptyRegistry { .. }
            | ShuttleError::ManifestParse { .. }
            | ShuttleError::UnsupportedMediaType { .. }
            | ShuttleError::Io { .. }
            | ShuttleError::PermissionDenied(_)
            | ShuttleError::Validation { .. }
            | ShuttleError::Other(_) => ErrorClass::Fatal,
        }
    }

    /// Process exit code for an invocation that ends with this error.
    ///
    /// Skips and input errors never end an invocation on their own, so they
    /// map to success.
    pub fn exit_code(&self) -> u8 {
        match self.class() {
            ErrorClass::Fatal => 1,
            ErrorClass::Skip | ErrorClass::Input => 0,
        }
    }

    /// Returns true if the error is a permission failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ShuttleError::PermissionDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShuttleError::UnsupportedMediaType {
            model: "llama3:latest".into(),
            media_type: "text/plain".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported media type for llama3:latest: text/plain"
        );
    }

    #[test]
    fn test_io_with_path_maps_permission_denied() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let mapped = ShuttleError::io_with_path(err, "/registry/blobs/sha256-aa");
        assert!(mapped.is_permission_denied());

        let err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let mapped = ShuttleError::io_with_path(err, "/registry/blobs/sha256-aa");
        assert!(matches!(mapped, ShuttleError::Io { path: Some(_), .. }));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ShuttleError::MissingBlob {
                model: "a:latest".into(),
                path: PathBuf::from("/x"),
            }
            .class(),
            ErrorClass::Skip
        );
        assert_eq!(
            ShuttleError::InvalidSelection {
                input: "1,a".into(),
                message: "digits only".into(),
            }
            .class(),
            ErrorClass::Input
        );
        assert_eq!(
            ShuttleError::PermissionDenied(PathBuf::from("/x")).class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            ShuttleError::ManifestsNotFound(PathBuf::from("/x")).exit_code(),
            1
        );
        assert_eq!(
            ShuttleError::InvalidSelection {
                input: "0".into(),
                message: "out of range".into(),
            }
            .exit_code(),
            0
        );
    }
}
