//! Read-only inspection of the calling process's mount table.

use std::io;
use std::path::{Component, Path, PathBuf};

use rootswitch_common::constants::PIVOT_DIR_PREFIX;

/// Returns the destination of every entry in `/proc/mounts`.
///
/// Entries that fail to parse are skipped rather than failing the whole read.
///
/// # Errors
///
/// Returns an error if the mount table cannot be opened.
#[cfg(target_os = "linux")]
pub fn read_mount_points() -> io::Result<Vec<PathBuf>> {
    let mut points = Vec::new();
    for entry in proc_mounts::MountIter::new()? {
        match entry {
            Ok(info) => points.push(info.dest),
            Err(e) => tracing::debug!(error = %e, "skipping unparsable mount entry"),
        }
    }
    Ok(points)
}

/// Mount points whose first path component is an old-root holder.
///
/// After a complete transition this must be empty; anything returned here
/// still exposes the host root.
#[must_use]
pub fn holder_leftovers(points: &[PathBuf]) -> Vec<&Path> {
    points
        .iter()
        .map(PathBuf::as_path)
        .filter(|p| is_under_holder(p))
        .collect()
}

fn is_under_holder(path: &Path) -> bool {
    let mut components = path.components();
    if components.next() != Some(Component::RootDir) {
        return false;
    }
    matches!(
        components.next(),
        Some(Component::Normal(name))
            if name.to_string_lossy().starts_with(PIVOT_DIR_PREFIX)
    )
}
