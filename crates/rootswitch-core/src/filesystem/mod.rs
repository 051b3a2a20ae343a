//! Filesystem management for container isolation.
//!
//! Provides propagation control, `pivot_root` for secure root filesystem
//! switching, and the pseudo-filesystem mounts of the new root.

pub mod guard;
pub mod mount;
pub mod pivot_root;
pub mod propagation;
pub mod pseudofs;
