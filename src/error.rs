//! Errors reported when binding or copying arrays.

use thiserror::Error;

use super::{ClassId};

/// Why an array could not be bound, allocated or copied into.
///
/// Whenever one of these is returned, the array involved is either empty or
/// unchanged; it is never left partially bound.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The source's class differs from the array's element type.
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: ClassId, found: ClassId },

    /// The source's number of dimensions differs from the array's rank.
    #[error("rank mismatch: expected {expected} dimensions, got {found}")]
    RankMismatch { expected: usize, found: usize },

    /// The number of elements differs from the number required.
    #[error("wrong element count: expected {expected}, got {found}")]
    CountMismatch { expected: usize, found: usize },

    /// The source's data pointer is not aligned for the element type.
    #[error("data pointer is not aligned to {alignment} bytes")]
    Misaligned { alignment: usize },

    /// The product of the extents overflowed `usize`.
    #[error("element count overflow")]
    ShapeOverflow,

    /// A host sink failed to provide a buffer.
    #[error("allocation failed: {0}")]
    Allocation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
