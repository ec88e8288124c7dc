//! Stable exit codes for the post-renderer binary.

/// Rendered output was written to stdout.
pub const OK: i32 = 0;
/// Reading input, rendering or writing output failed.
pub const FAILED: i32 = 1;
