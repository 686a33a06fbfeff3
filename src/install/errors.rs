//! Error types for detection and installation.
//!
//! Every fatal error carries enough context to diagnose a failed build
//! without rerunning it: the path that was being touched, or the captured
//! output of the external tool.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that abort the install pipeline.
///
/// The post-install cache copy is best-effort and never produces one of
/// these; it is logged instead.
///
/// # Example
///
/// ```rust
/// use yarn_install::InstallError;
/// use std::path::PathBuf;
///
/// let error = InstallError::MissingPrerequisite {
///     name: "yarn.lock".to_string(),
///     path: PathBuf::from("/workspace"),
/// };
/// assert_eq!(
///     error.to_string(),
///     "no 'yarn.lock' found in the project path /workspace"
/// );
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// A file the installer cannot work without is absent.
    #[error("no '{name}' found in the project path {path}")]
    MissingPrerequisite {
        /// File name that was expected (e.g. `yarn.lock`).
        name: String,
        /// Directory or path where it was expected.
        path: PathBuf,
    },

    /// `package.json` exists but is not valid JSON.
    ///
    /// Only raised where the manifest is mandatory; version hints tolerate
    /// malformed manifests.
    #[error("failed to parse {path}: {source}")]
    ManifestParse {
        /// Path to the manifest.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A filesystem operation failed for a reason other than not-found.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        /// What was being attempted (e.g. "stat", "copy node_modules to").
        operation: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The external tool failed to launch or exited unsuccessfully.
    #[error("failed to execute '{command}': {message}\n{output}")]
    Subprocess {
        /// Rendered command line (e.g. `yarn config list --silent`).
        command: String,
        /// Exit code, if the process ran to completion.
        exit_code: Option<i32>,
        /// Combined stdout and stderr captured before the failure.
        output: String,
        /// Short description of the failure.
        message: String,
    },
}

impl InstallError {
    /// Build a closure that wraps an [`io::Error`] with operation and path.
    ///
    /// Intended for `map_err`:
    ///
    /// ```rust
    /// use yarn_install::InstallError;
    /// use std::path::Path;
    ///
    /// let path = Path::new("/definitely/not/here");
    /// let err = std::fs::read(path)
    ///     .map_err(InstallError::io("read", path))
    ///     .unwrap_err();
    /// assert!(err.to_string().starts_with("failed to read /definitely/not/here"));
    /// ```
    pub fn io(operation: &'static str, path: &Path) -> impl FnOnce(io::Error) -> InstallError {
        let path = path.to_path_buf();
        move |source| InstallError::Io {
            operation,
            path,
            source,
        }
    }

    /// Captured tool output, when the error came from a subprocess.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Subprocess { output, .. } => Some(output),
            _ => None,
        }
    }
}
