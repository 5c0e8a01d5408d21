//! Error taxonomy for the low-level buffer and linear-tree contracts.
//!
//! `TreeError` covers the two *fatal* kinds from the spec: a caller handed
//! an out-of-bounds index, or a `structure` array does not encode a valid
//! tree. Everything else — a path that did not match, a mutation that
//! turned out to be a semantic no-op — is not an error at all; it is
//! reflected in the return type of the operation itself (`PathResult<T>`,
//! or the tree coming back unchanged).

use thiserror::Error;

/// Fatal, non-recoverable contract violations raised by the buffer and
/// linear-tree layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// `structure` contains a negative child count, or a subtree scan
    /// starting from some node overruns its bounds (I3/I5 violated).
    #[error("invalid tree structure at index {index}: {reason}")]
    InvalidStructure {
        index: i32,
        reason: &'static str,
    },

    /// An index or length supplied to a low-level function falls outside
    /// the buffer it addresses.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: i64, len: usize },
}

/// Result alias for the fatal low-level contracts (`InvalidStructure`,
/// `OutOfBounds`).
pub type Result<T> = core::result::Result<T, TreeError>;

/// The result of a path-addressed facade operation (§4.4.3, §7): `Ok` with
/// the new tree when the path matched and the mutation applied; `Err` with
/// the original, untouched tree when the path could not be matched.
///
/// No partial mutation is ever observable through this type.
pub type PathResult<T> = core::result::Result<T, T>;
