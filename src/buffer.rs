//! Ownership of the memory behind an array.
//!
//! An array refers to its elements through an `Rc<Buffer<S>>`. Cloning the
//! array clones the `Rc`, so copies share both the elements and the
//! reference count. When the last `Rc` is dropped, the buffer runs its
//! release action if it has one, i.e. if it was adopted. A borrowed buffer
//! has no release action and is never freed from here.

use std::cell::{Cell};
use std::fmt::{self, Debug};
use std::ptr::{NonNull};

use super::{Scalar};

/// Frees an adopted buffer, given its address and number of elements.
pub type Release<S> = Box<dyn FnOnce(NonNull<S>, usize)>;

/// How an array holds the memory it is bound to.
pub enum Ownership<S> {
    /// The memory belongs to someone else, and outlives the array.
    Borrowed,

    /// The memory belongs to the array, and is released by the given action
    /// when the last array referring to it is dropped or cleared.
    Adopted(Release<S>),
}

impl<S: Scalar> Ownership<S> {
    /// Adopts memory that was allocated as a `Box<[S]>` (or an exactly-sized
    /// `Vec<S>`) by the Rust global allocator.
    pub fn boxed() -> Self {
        Ownership::Adopted(Box::new(|ptr: NonNull<S>, len: usize| {
            let slice = std::ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len);
            // SAFETY: The caller of `boxed()` promised a `Box<[S]>` of `len`.
            drop(unsafe { Box::from_raw(slice) });
        }))
    }

    /// Returns `true` for `Adopted`.
    pub fn is_adopted(&self) -> bool { matches!(self, Ownership::Adopted(_)) }
}

impl<S> Debug for Ownership<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Borrowed => f.write_str("Borrowed"),
            Ownership::Adopted(_) => f.write_str("Adopted"),
        }
    }
}

// ----------------------------------------------------------------------------

/// A run of `len` cells at `ptr`, plus how to let go of them.
pub(crate) struct Buffer<S: Scalar> {
    ptr: NonNull<Cell<S>>,
    len: usize,
    ownership: Ownership<S>,
}

impl<S: Scalar> Buffer<S> {
    /// # Safety
    ///
    /// `ptr` must be aligned and valid for reads and writes of `len`
    /// elements for as long as the returned `Buffer` exists, and nothing
    /// else may hold a `&` or `&mut` to those elements meanwhile.
    pub unsafe fn new(ptr: NonNull<S>, len: usize, ownership: Ownership<S>) -> Self {
        log::trace!("Binding {:?} buffer of {} {} at {:p}", ownership, len, S::NAME, ptr);
        Self {ptr: ptr.cast(), len, ownership}
    }

    #[inline(always)]
    pub fn cells(&self) -> &[Cell<S>] {
        // SAFETY: Guaranteed by the caller of `new()`; `Cell<S>` has the same
        // layout as `S`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn is_adopted(&self) -> bool { self.ownership.is_adopted() }
}

impl<S: Scalar> Drop for Buffer<S> {
    fn drop(&mut self) {
        if let Ownership::Adopted(release) = std::mem::replace(&mut self.ownership, Ownership::Borrowed) {
            log::trace!("Releasing {} {} at {:p}", self.len, S::NAME, self.ptr);
            release(self.ptr.cast(), self.len);
        }
    }
}

// ----------------------------------------------------------------------------
