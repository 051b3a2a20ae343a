//! Mount descriptors for the root transition and container filesystem setup.
//!
//! A [`MountTarget`] describes one `mount(2)` call. It is built once,
//! handed to [`MountOps::mount`](crate::sys::MountOps::mount), and dropped.

use std::fmt;
use std::path::{Path, PathBuf};

use nix::mount::MsFlags;

/// One intended mount operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    source: Option<PathBuf>,
    target: PathBuf,
    fstype: Option<&'static str>,
    flags: MsFlags,
    data: Option<String>,
}

impl MountTarget {
    /// Creates a mount descriptor from its raw parts.
    #[must_use]
    pub fn new(
        source: Option<PathBuf>,
        target: impl Into<PathBuf>,
        fstype: Option<&'static str>,
        flags: MsFlags,
        data: Option<String>,
    ) -> Self {
        Self {
            source,
            target: target.into(),
            fstype,
            flags,
            data,
        }
    }

    /// Recursive read-write bind mount of `path` onto itself.
    ///
    /// `pivot_root(2)` requires the new root to be a mount point distinct
    /// from its parent; this turns a plain directory into one.
    #[must_use]
    pub fn self_bind(path: &Path) -> Self {
        Self::new(
            Some(path.to_path_buf()),
            path,
            None,
            MsFlags::MS_BIND | MsFlags::MS_REC,
            None,
        )
    }

    /// Propagation change on an existing mount (no source, no fstype).
    #[must_use]
    pub fn propagation(path: &Path, flags: MsFlags) -> Self {
        Self::new(None, path, None, flags, None)
    }

    /// Kernel pseudo-filesystem whose source name matches its type.
    #[must_use]
    pub fn pseudo(
        fstype: &'static str,
        target: impl Into<PathBuf>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Self {
        Self::new(
            Some(PathBuf::from(fstype)),
            target,
            Some(fstype),
            flags,
            data.map(str::to_owned),
        )
    }

    /// Remount of an existing mount point with new flags.
    #[must_use]
    pub fn remount(target: impl Into<PathBuf>, flags: MsFlags) -> Self {
        Self::new(None, target, None, flags | MsFlags::MS_REMOUNT, None)
    }

    /// Mount source, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Mount point.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Filesystem type, if any.
    #[must_use]
    pub const fn fstype(&self) -> Option<&'static str> {
        self.fstype
    }

    /// Mount flags.
    #[must_use]
    pub const fn flags(&self) -> MsFlags {
        self.flags
    }

    /// Filesystem-specific data string.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Whether this call creates a new mount entry, as opposed to changing
    /// propagation or remounting an existing one.
    #[must_use]
    pub fn creates_mount(&self) -> bool {
        !self.flags.intersects(
            MsFlags::MS_REMOUNT
                | MsFlags::MS_PRIVATE
                | MsFlags::MS_SHARED
                | MsFlags::MS_SLAVE
                | MsFlags::MS_UNBINDABLE,
        )
    }
}

impl fmt::Display for MountTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} type {} ({:?})",
            self.source
                .as_deref()
                .map_or_else(|| "none".into(), |s| s.display().to_string()),
            self.target.display(),
            self.fstype.unwrap_or("none"),
            self.flags
        )
    }
}
