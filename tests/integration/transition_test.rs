//! Integration tests for the root transition.
//!
//! These tests are implemented in:
//! `crates/rootswitch-core/tests/transition_test.rs`
//!
//! Covered scenarios:
//! - `enter_missing_rootfs_fails_with_precondition`: nothing is mutated for a missing rootfs
//! - `pivot_into_regular_file_fails_with_precondition`: a non-directory rootfs fails validation
//! - `privileged::happy_path_mounts_proc_inside_new_root`: bind, pivot, detach, pseudo-fs in a child mount namespace
//! - `privileged::pre_mounted_rootfs_behaves_like_plain_directory`: an existing mount point is used as-is
//! - `privileged::host_namespace_is_untouched`: the parent's mount table is unchanged
//!
//! Privileged scenarios run only as root with `ROOTSWITCH_PRIVILEGED_TESTS=1`.
