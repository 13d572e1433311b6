//! A library of fixed-rank, strided, multi-dimensional arrays over memory
//! that belongs to someone else.
//!
//! [`NdArray<T, N>`] represents an `N`-dimensional array of `T`, stored in
//! column-major order (dimension 0 varies fastest). Unlike most array types,
//! it does not necessarily own its elements. It can be bound to memory in
//! three ways:
//!
//! - It can *borrow* memory, for example the data of a host runtime's array
//!   object (an [`ArraySource`]). The memory is never freed by the array.
//! - It can *adopt* memory, taking over the job of freeing it. The memory is
//!   freed exactly once, when the last array referring to it goes away.
//! - It can *share* memory with another `NdArray`: cloning an array does not
//!   copy its elements, and the clones see each other's writes.
//!
//! Elements can be accessed by flat index (`a[n]`), by an array of
//! subscripts (`a[[i, j, k]]`), or by coordinates (`a.at(i, (j, k))`). What
//! happens to an out-of-range subscript is decided by a [`Protect`] policy.
//! The default, [`Wrap`], reduces it modulo the extent, so that access never
//! leaves the array. Switching off the `safe-access` feature makes the
//! default [`Trust`] instead.
//!
//! An empty array has no memory. Rather than faulting, every access to an
//! empty array returns the [`sentinel()`] of its scalar type, which all
//! empty arrays of that type share.
//!
//! Element types are classified at compile time by trait [`Scalar`], which
//! maps each supported numeric type to the name and [`ClassId`] that the host
//! uses for it. [`ReadOnly<S>`] is the read-only counterpart of `S`.
//!
//! Arrays are `!Send` and `!Sync`. They are intended to be used within a
//! single call from a host runtime into native code.

mod scalar;
pub use scalar::{ClassId, Scalar, Element, Writable, ReadOnly, Const};

pub mod index;
pub use index::{Protect, Wrap, Trust, DefaultAccess, Coords, Tail};

mod sentinel;
pub use sentinel::{sentinel, Fake};

mod error;
pub use error::{Error, Result};

mod buffer;
pub use buffer::{Ownership, Release};

mod host;
pub use host::{ArraySource, ArraySink, HostArray, HeapSink};

mod array;
pub use array::{NdArray};
