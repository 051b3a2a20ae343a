//! Domain primitive types used across the Rootswitch workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named step of a root transition, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Validating the new root before any mutation.
    Precondition,
    /// Changing mount propagation of a subtree.
    Propagation,
    /// Bind-mounting the new root onto itself.
    BindMount,
    /// Creating the old-root holder directory.
    CreateHolder,
    /// The `pivot_root(2)` call.
    Pivot,
    /// Changing the working directory to the new root.
    Chdir,
    /// Making the old-root holder private.
    HolderPrivatize,
    /// Detaching the old root.
    HolderUnmount,
    /// Removing the holder directory.
    HolderRemove,
    /// Detaching the rootfs self bind-mount after the pivot did not happen.
    Unbind,
    /// Scanning the mount table for leftover old-root entries.
    LeakCheck,
}

impl Step {
    /// Returns the kebab-case label used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::Propagation => "propagation",
            Self::BindMount => "bind-mount",
            Self::CreateHolder => "create-holder",
            Self::Pivot => "pivot",
            Self::Chdir => "chdir",
            Self::HolderPrivatize => "holder-privatize",
            Self::HolderUnmount => "holder-unmount",
            Self::HolderRemove => "holder-remove",
            Self::Unbind => "unbind",
            Self::LeakCheck => "leak-check",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Propagation type applied recursively to a mount subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagationScope {
    /// Mount and unmount events are neither received nor forwarded.
    Private,
    /// Mount and unmount events are shared with peer mounts.
    Shared,
}

impl fmt::Display for PropagationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

/// How `/sys` is left once the pseudo-filesystems are in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SysPolicy {
    /// Remount `/sys` read-only after the cgroup directories exist.
    #[default]
    ReadOnly,
    /// Leave `/sys` read-write.
    ReadWrite,
}

impl fmt::Display for SysPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// What a bootstrap run does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionMode {
    /// Pivot into the configured rootfs and populate its pseudo-filesystems.
    #[default]
    Pivot,
    /// Keep the current root and only mount a fresh `/proc`.
    ProcRemount,
}
