//! The two ways in which arrays meet a host runtime.
//!
//! An [`ArraySource`] is a host array object that an [`NdArray`] can be bound
//! to: it reports a class, a list of extents and a data pointer. An
//! [`ArraySink`] is a host allocator that hands out fresh buffers together
//! with a handle through which the host will recognise them.
//!
//! [`HostArray`] and [`HeapSink`] implement these traits on top of the Rust
//! heap. They are what the rest of the crate is tested against, and are a
//! reasonable stand-in wherever no real host is available.
//!
//! [`NdArray`]: super::NdArray

use std::cell::{Cell};
use std::ptr::{NonNull};

use super::{index, ClassId, Scalar, Error, Result};

/// A host array object that arrays can be bound to.
///
/// # Safety
///
/// While `self` is alive and not mutated, [`data()`] must return either a
/// null pointer, or a pointer valid for reads and writes of
/// `Π dims()` elements of the type identified by [`class_id()`].
///
/// [`data()`]: ArraySource::data()
/// [`class_id()`]: ArraySource::class_id()
pub unsafe trait ArraySource {
    /// The class of the elements.
    fn class_id(&self) -> ClassId;

    /// The extent of each dimension, dimension 0 first.
    fn dims(&self) -> &[usize];

    /// The address of the first element.
    fn data(&self) -> *mut u8;
}

unsafe impl<A: ArraySource + ?Sized> ArraySource for &A {
    fn class_id(&self) -> ClassId { A::class_id(self) }
    fn dims(&self) -> &[usize] { A::dims(self) }
    fn data(&self) -> *mut u8 { A::data(self) }
}

/// A host allocator.
///
/// # Safety
///
/// [`allocate()`] must return a pointer, aligned for `class`, that is valid
/// for reads and writes of `Π dims` zeroed elements for as long as the
/// returned handle is alive.
///
/// [`allocate()`]: ArraySink::allocate()
pub unsafe trait ArraySink {
    /// What the host uses to refer to an allocated array.
    type Handle;

    /// Allocates a buffer of `Π dims` elements of class `class`.
    fn allocate(&mut self, class: ClassId, dims: &[usize]) -> Result<(NonNull<u8>, Self::Handle)>;
}

// ----------------------------------------------------------------------------

/// A host array object stored on the Rust heap.
///
/// ```
/// use ndbind::{ArraySource, ClassId, HostArray};
/// let a = HostArray::from_slice(&[2, 2], &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(a.class_id(), ClassId::Single);
/// assert_eq!(a.to_vec::<f32>().unwrap(), [1.0, 2.0, 3.0, 4.0]);
/// ```
#[derive(Debug)]
pub struct HostArray {
    class: ClassId,
    dims: Vec<usize>,
    /// Zero-initialised, and aligned for every numeric class.
    words: Box<[Cell<u64>]>,
}

impl HostArray {
    /// Constructs a zeroed `HostArray` of class `class` with extents `dims`.
    pub fn new(class: ClassId, dims: &[usize]) -> Result<Self> {
        let size = class.element_size()
            .ok_or_else(|| Error::Allocation(format!("{} arrays have no numeric storage", class)))?;
        let bytes = index::numel(dims)
            .and_then(|n| n.checked_mul(size))
            .ok_or(Error::ShapeOverflow)?;
        let words = (0..(bytes + 7) / 8).map(|_| Cell::new(0)).collect();
        Ok(Self {class, dims: dims.to_vec(), words})
    }

    /// Constructs a `HostArray` holding a copy of `items`.
    pub fn from_slice<S: Scalar>(dims: &[usize], items: &[S]) -> Result<Self> {
        let array = Self::new(S::CLASS, dims)?;
        let cells = array.cells::<S>()?;
        if cells.len() != items.len() {
            return Err(Error::CountMismatch {expected: cells.len(), found: items.len()});
        }
        for (cell, &item) in cells.iter().zip(items) { cell.set(item); }
        Ok(array)
    }

    /// The number of elements.
    pub fn numel(&self) -> usize { self.dims.iter().product() }

    /// Returns a copy of the elements.
    pub fn to_vec<S: Scalar>(&self) -> Result<Vec<S>> {
        Ok(self.cells::<S>()?.iter().map(Cell::get).collect())
    }

    fn cells<S: Scalar>(&self) -> Result<&[Cell<S>]> {
        if self.class != S::CLASS {
            return Err(Error::TypeMismatch {expected: S::CLASS, found: self.class});
        }
        // SAFETY: `words` holds at least `numel()` elements of `S`, and is
        // only ever accessed through `Cell`s.
        Ok(unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<Cell<S>>(), self.numel()) })
    }
}

unsafe impl ArraySource for HostArray {
    fn class_id(&self) -> ClassId { self.class }
    fn dims(&self) -> &[usize] { &self.dims }
    fn data(&self) -> *mut u8 { self.words.as_ptr() as *mut u8 }
}

// ----------------------------------------------------------------------------

/// An [`ArraySink`] that allocates [`HostArray`]s.
#[derive(Debug, Default)]
pub struct HeapSink {
    allocations: usize,
}

impl HeapSink {
    pub fn new() -> Self { Self::default() }

    /// The number of successful allocations so far.
    pub fn allocations(&self) -> usize { self.allocations }
}

unsafe impl ArraySink for HeapSink {
    type Handle = HostArray;

    fn allocate(&mut self, class: ClassId, dims: &[usize]) -> Result<(NonNull<u8>, HostArray)> {
        let array = HostArray::new(class, dims)?;
        let ptr = NonNull::new(array.data())
            .ok_or_else(|| Error::Allocation("null data pointer".to_string()))?;
        self.allocations += 1;
        log::trace!("Allocated {} host array of size {:?}", class, dims);
        Ok((ptr, array))
    }
}

// ----------------------------------------------------------------------------
