//! Error types for chunkgraph operations.
//!
//! Hard failures (programmer error, unreadable snapshots) are variants here.
//! Soft conditions from the analysis core (scan cap hit, cross-repo fallback,
//! unindexed files) are never errors; they surface as note strings or
//! placeholder nodes on the result types.

use std::process::ExitCode;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChunkGraphError>;

/// All failure modes surfaced by the library and the CLI.
#[derive(Error, Debug)]
pub enum ChunkGraphError {
    /// Underlying I/O failure while reading a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file does not exist.
    #[error("Snapshot not found: {path}")]
    SnapshotNotFound { path: String },

    /// The snapshot header declares a schema version we cannot read.
    #[error("Snapshot schema version {found} is not supported (expected {expected})")]
    SchemaVersion { found: String, expected: String },

    /// A scan limit of zero can never return data; reject it outright.
    #[error("Scan limit must be positive (got {value})")]
    InvalidScanLimit { value: usize },

    /// Graph generation was called with an empty root list.
    #[error("Graph generation requires at least one root path")]
    EmptyRoots,

    /// Result serialization failed.
    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

impl ChunkGraphError {
    /// Map each error class to a stable process exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    fn exit_status(&self) -> u8 {
        match self {
            Self::Io(_) => 2,
            Self::SnapshotNotFound { .. } => 3,
            Self::SchemaVersion { .. } => 4,
            Self::InvalidScanLimit { .. } | Self::EmptyRoots => 5,
            Self::Serialization { .. } => 6,
        }
    }
}

impl From<serde_json::Error> for ChunkGraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChunkGraphError::InvalidScanLimit { value: 0 };
        assert_eq!(err.to_string(), "Scan limit must be positive (got 0)");

        let err = ChunkGraphError::EmptyRoots;
        assert!(err.to_string().contains("at least one root"));
    }

    #[test]
    fn test_exit_statuses_are_distinct_per_class() {
        // Hard-input errors share one code, storage errors another.
        let invalid = ChunkGraphError::InvalidScanLimit { value: 0 };
        let empty = ChunkGraphError::EmptyRoots;
        assert_eq!(invalid.exit_status(), 5);
        assert_eq!(empty.exit_status(), 5);

        let missing = ChunkGraphError::SnapshotNotFound {
            path: "x.jsonl".to_string(),
        };
        assert_eq!(missing.exit_status(), 3);
        assert_ne!(missing.exit_status(), empty.exit_status());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChunkGraphError = io.into();
        assert!(matches!(err, ChunkGraphError::Io(_)));
    }
}
