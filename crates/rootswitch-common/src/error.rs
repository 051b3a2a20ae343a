//! Unified error types for the Rootswitch workspace.
//!
//! Every variant that wraps an OS failure carries the [`Step`] that failed,
//! so operators can tell "target busy" from "permission denied" from
//! "no such device" without reading source.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Step;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RootswitchError {
    /// The caller lacks the privilege required for a mount or pivot operation.
    #[error("permission denied during {step}: {source}")]
    PermissionDenied {
        /// Step that was refused.
        step: Step,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The new root does not exist or cannot be pivoted into.
    #[error("precondition failed for {path}: {reason}")]
    PreconditionFailed {
        /// Offending root path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A step of the root transition itself failed.
    #[error("root transition failed during {step}: {source}")]
    TransitionFailed {
        /// Step that failed.
        step: Step,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Unmounting or removing the old-root holder failed.
    #[error("cleanup failed during {step} at {path}: {source}")]
    CleanupFailed {
        /// Step that failed.
        step: Step,
        /// Holder path the step operated on.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A pseudo-filesystem could not be mounted inside the new root.
    #[error("failed to mount {target}: {source}")]
    MountFailed {
        /// Mount point that failed.
        target: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// An I/O operation outside the mount sequence failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl RootswitchError {
    /// Classifies a failed transition step.
    ///
    /// Privilege errors (`EPERM`, `EACCES`) always surface as
    /// [`RootswitchError::PermissionDenied`] regardless of the step.
    #[must_use]
    pub fn transition(step: Step, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { step, source }
        } else {
            Self::TransitionFailed { step, source }
        }
    }

    /// Classifies a failed cleanup step on the holder at `path`.
    #[must_use]
    pub fn cleanup(step: Step, path: impl Into<PathBuf>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { step, source }
        } else {
            Self::CleanupFailed {
                step,
                path: path.into(),
                source,
            }
        }
    }

    /// Returns the step this error is attributed to, if any.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::PermissionDenied { step, .. }
            | Self::TransitionFailed { step, .. }
            | Self::CleanupFailed { step, .. } => Some(*step),
            Self::PreconditionFailed { .. } => Some(Step::Precondition),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RootswitchError>;
