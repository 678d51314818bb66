//! Unified error type for sbo-toolkit.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for all sbo-toolkit operations.
///
/// This error type covers all possible failure modes across different modules,
/// providing clear, actionable error messages.
#[derive(Error, Debug)]
pub enum SboToolkitError {
    /// Startup configuration error (missing `HOME`, malformed config line).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error carrying the offending path.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path of the file or directory the operation failed on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Malformed on-disk data (dep file, PKGDB record, package filename).
    #[error("parse error: {0}")]
    Parse(String),

    /// A dependency cycle was found while loading or traversing the graph.
    #[error("cyclic dependency found: {0} <--> {1}")]
    CyclicDependency(String, String),

    /// Package name known to neither the repository catalog nor the meta set.
    #[error("package {0} does not exist")]
    PackageNotFound(String),

    /// A dependency file is missing and cannot be synthesized.
    #[error("dependency file for {0} does not exist")]
    MissingDepFile(String),

    /// The user answered `quit` at a review prompt.
    #[error("terminating upon user request")]
    UserCancel,
}

impl SboToolkitError {
    /// What: Wrap an I/O error together with the path it occurred on.
    ///
    /// Inputs:
    /// - `path`: File or directory the failed operation touched.
    /// - `source`: The underlying `std::io::Error`.
    ///
    /// Output:
    /// - Returns an `Io` variant carrying both.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for sbo-toolkit operations.
pub type Result<T> = std::result::Result<T, SboToolkitError>;
