use std::cell::{Cell};
use std::fmt::{self, Debug, Display};
use std::marker::{PhantomData};
use std::ops::{Range};
use std::ptr::{self, NonNull};
use std::rc::{Rc};

use num_traits::{AsPrimitive};

use super::{index, Element, Writable, ReadOnly, Protect, DefaultAccess, Coords, Tail};
use super::{ArraySource, ArraySink, Ownership, Error, Result, sentinel};
use super::buffer::{Buffer};

/// A rank-`N` array of `T`, stored in column-major order in memory that it
/// borrows, adopts or shares.
///
/// - `T` is an [`Element`]: a [`Scalar`] such as `f64`, or a read-only
/// [`ReadOnly<S>`].
/// - `N` is the number of dimensions.
/// - `P` is the [`Protect`] policy applied to subscripts.
///
/// Element access returns a `&T::Slot`, which is a `&Cell<S>` for writable
/// elements and a `&Const<S>` for read-only ones. Arrays that share memory
/// therefore see each other's writes.
///
/// An empty array has no memory at all. Every access to it returns the
/// [`sentinel()`] of its scalar type.
///
/// ```
/// use ndbind::NdArray;
/// let a: NdArray<i32, 2> = NdArray::from_vec([3, 4], (0..12).collect()).unwrap();
/// assert_eq!(a.strides(), &[1, 3]);
/// assert_eq!(a[[2, 1]].get(), 5);
/// assert_eq!(a.at(2, 1).get(), 5);
/// a[5].set(-1);
/// assert_eq!(a.at(2, 1).get(), -1);
/// ```
///
/// [`Scalar`]: super::Scalar
pub struct NdArray<T: Element, const N: usize, P: Protect = DefaultAccess> {
    numel: usize,
    size: [usize; N],
    strides: [usize; N],
    data: Option<Rc<Buffer<T::Scalar>>>,
    access: PhantomData<P>,
}

impl<T: Element, const N: usize, P: Protect> NdArray<T, N, P> {
    /// Constructs an empty array.
    pub fn new() -> Self {
        Self {numel: 0, size: [0; N], strides: [0; N], data: None, access: PhantomData}
    }

    /// Constructs an array that borrows the memory of `source`.
    ///
    /// # Safety
    ///
    /// See [`assign_from()`].
    ///
    /// [`assign_from()`]: Self::assign_from()
    pub unsafe fn from_source<A: ArraySource + ?Sized>(source: &A) -> Result<Self> {
        let mut array = Self::new();
        array.assign_from(source)?;
        Ok(array)
    }

    /// Constructs an array bound to `ptr`. See [`assign_raw()`].
    ///
    /// # Safety
    ///
    /// See [`assign_raw()`].
    ///
    /// [`assign_raw()`]: Self::assign_raw()
    pub unsafe fn from_raw(ptr: *mut T::Scalar, size: [usize; N], manage: bool) -> Self {
        let mut array = Self::new();
        array.assign_raw(ptr, size, manage);
        array
    }

    /// Constructs an array that owns `items`.
    ///
    /// Fails if `items` does not hold exactly as many elements as `size`
    /// requires.
    ///
    /// ```
    /// use ndbind::{Error, NdArray};
    /// let a = NdArray::<u8, 2>::from_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
    /// assert!(a.is_owner());
    /// assert_eq!(
    ///     NdArray::<u8, 2>::from_vec([2, 2], vec![1, 2, 3]).unwrap_err(),
    ///     Error::CountMismatch {expected: 4, found: 3},
    /// );
    /// ```
    pub fn from_vec(size: [usize; N], items: Vec<T::Scalar>) -> Result<Self> {
        let numel = index::numel(&size).ok_or(Error::ShapeOverflow)?;
        if items.len() != numel {
            return Err(Error::CountMismatch {expected: numel, found: items.len()});
        }
        let ptr = Box::into_raw(items.into_boxed_slice()).cast::<T::Scalar>();
        let mut array = Self::new();
        // SAFETY: `ptr` is a `Box<[T::Scalar]>` of `numel` elements, and
        // nothing else refers to it.
        unsafe { array.assign_with(ptr, size, Ownership::boxed()) };
        Ok(array)
    }

    /// Asks `sink` for a fresh, zeroed buffer of size `size`, and returns an
    /// array that borrows it together with the host's handle to it.
    ///
    /// # Safety
    ///
    /// The returned handle must outlive the returned array and all its
    /// clones.
    ///
    /// ```
    /// use ndbind::{HeapSink, NdArray};
    /// let mut sink = HeapSink::new();
    /// let (a, handle) = unsafe { NdArray::<f64, 2>::allocate(&mut sink, [2, 3]) }.unwrap();
    /// a.at(1, 2).set(4.0);
    /// assert_eq!(handle.to_vec::<f64>().unwrap(), [0.0, 0.0, 0.0, 0.0, 0.0, 4.0]);
    /// ```
    pub unsafe fn allocate<K: ArraySink + ?Sized>(sink: &mut K, size: [usize; N]) -> Result<(Self, K::Handle)> {
        let numel = index::numel(&size).ok_or(Error::ShapeOverflow)?;
        let (ptr, handle) = sink.allocate(T::CLASS, &size)?;
        let ptr = ptr.cast::<T::Scalar>();
        check_alignment(ptr.as_ptr())?;
        let mut array = Self::new();
        array.bind(Some(ptr), size, numel, Ownership::Borrowed);
        Ok((array, handle))
    }

    // ------------------------------------------------------------------------

    /// Rebinds `self` to the memory of `source`, which remains its owner.
    ///
    /// Fails if `source` has a different class from `T`, a different number
    /// of dimensions from `N`, or a misaligned data pointer. In that case
    /// `self` is left empty.
    ///
    /// # Safety
    ///
    /// The memory of `source` must outlive `self` and all its clones.
    pub unsafe fn assign_from<A: ArraySource + ?Sized>(&mut self, source: &A) -> Result<()> {
        self.clear();
        let found = source.class_id();
        if found != T::CLASS {
            log::debug!("Cannot bind {} source to {}", found, self);
            return Err(Error::TypeMismatch {expected: T::CLASS, found});
        }
        let dims = source.dims();
        let size: [usize; N] = dims.try_into().map_err(|_| {
            log::debug!("Cannot bind {}-dimensional source to {}", dims.len(), self);
            Error::RankMismatch {expected: N, found: dims.len()}
        })?;
        let numel = index::numel(&size).ok_or(Error::ShapeOverflow)?;
        let ptr = source.data().cast::<T::Scalar>();
        check_alignment(ptr)?;
        self.bind(NonNull::new(ptr), size, numel, Ownership::Borrowed);
        Ok(())
    }

    /// Rebinds `self` to `ptr`, which points to `Π size` elements.
    ///
    /// If `manage` is `true`, `self` adopts the memory, which must have been
    /// allocated as a `Box<[T::Scalar]>`; it will be freed when the last
    /// array referring to it is dropped or cleared. Otherwise `self` only
    /// borrows it. A null `ptr` leaves `self` empty.
    ///
    /// # Safety
    ///
    /// `ptr` must be null, or aligned and valid for reads and writes of
    /// `Π size` elements. Borrowed memory must outlive `self` and all its
    /// clones, and must not be accessed other than through arrays meanwhile.
    pub unsafe fn assign_raw(&mut self, ptr: *mut T::Scalar, size: [usize; N], manage: bool) {
        let ownership = if manage { Ownership::boxed() } else { Ownership::Borrowed };
        self.assign_with(ptr, size, ownership);
    }

    /// Like [`assign_raw()`], but with an explicit [`Ownership`], e.g. to
    /// hand adopted memory back to a host's allocator.
    ///
    /// # Safety
    ///
    /// As for [`assign_raw()`]. In addition, an `Ownership::Adopted` release
    /// action must be able to free `ptr`.
    ///
    /// [`assign_raw()`]: Self::assign_raw()
    pub unsafe fn assign_with(&mut self, ptr: *mut T::Scalar, size: [usize; N], ownership: Ownership<T::Scalar>) {
        let numel = size.iter().product();
        self.bind(NonNull::new(ptr), size, numel, ownership);
    }

    unsafe fn bind(
        &mut self,
        ptr: Option<NonNull<T::Scalar>>,
        size: [usize; N],
        numel: usize,
        ownership: Ownership<T::Scalar>,
    ) {
        self.clear();
        let Some(ptr) = ptr else { return };
        self.data = Some(Rc::new(Buffer::new(ptr, numel, ownership)));
        self.numel = numel;
        self.size = size;
        self.strides = index::strides(&size);
    }

    /// Makes `self` empty.
    ///
    /// If `self` was the last array referring to adopted memory, the memory
    /// is released.
    pub fn clear(&mut self) {
        self.data = None;
        self.numel = 0;
        self.size = [0; N];
        self.strides = [0; N];
    }

    /// Same as [`clear()`].
    ///
    /// [`clear()`]: Self::clear()
    pub fn reset(&mut self) { self.clear() }

    /// Converts and copies every element of `other` into `self`.
    ///
    /// Fails, leaving `self` unchanged, unless `other` has the same number of
    /// elements as `self`.
    ///
    /// ```
    /// use ndbind::NdArray;
    /// let a = NdArray::<f64, 1>::from_vec([3], vec![1.9, -2.5, 300.0]).unwrap();
    /// let b = NdArray::<u8, 1>::from_vec([3], vec![0; 3]).unwrap();
    /// b.copy_from(&a).unwrap();
    /// assert_eq!(b.iter().map(|x| x.get()).collect::<Vec<_>>(), [1, 0, 255]);
    /// ```
    pub fn copy_from<U: Element, Q: Protect>(&self, other: &NdArray<U, N, Q>) -> Result<()> where
        T: Writable,
        U::Scalar: AsPrimitive<T::Scalar>,
    {
        if self.numel != other.numel {
            return Err(Error::CountMismatch {expected: self.numel, found: other.numel});
        }
        for (dst, src) in self.cells().iter().zip(other.cells()) {
            dst.set(src.get().as_());
        }
        Ok(())
    }

    /// Returns an array that shares `self`'s memory but applies policy `Q`
    /// to subscripts.
    pub fn with_access<Q: Protect>(self) -> NdArray<T, N, Q> {
        let Self {numel, size, strides, data, access: _} = self;
        NdArray {numel, size, strides, data, access: PhantomData}
    }

    /// Returns an array that shares `self`'s memory but cannot write to it.
    pub fn read_only(&self) -> NdArray<ReadOnly<T::Scalar>, N, P> {
        NdArray {
            numel: self.numel,
            size: self.size,
            strides: self.strides,
            data: self.data.clone(),
            access: PhantomData,
        }
    }

    // ------------------------------------------------------------------------

    /// The stored cells, or none if `self` is empty.
    #[inline(always)]
    fn cells(&self) -> &[Cell<T::Scalar>] {
        match &self.data {
            Some(buffer) => buffer.cells(),
            None => &[],
        }
    }

    /// The stored cells, or `None` if there are none to index.
    #[inline(always)]
    fn live(&self) -> Option<&[Cell<T::Scalar>]> {
        match &self.data {
            Some(buffer) if self.numel > 0 => Some(buffer.cells()),
            _ => None,
        }
    }

    /// Returns the element at flat index `n`.
    ///
    /// Under [`Wrap`], `n` is reduced modulo [`numel()`].
    ///
    /// [`Wrap`]: super::Wrap
    /// [`numel()`]: Self::numel()
    #[inline(always)]
    pub fn flat(&self, n: usize) -> &T::Slot {
        match self.live() {
            Some(cells) => T::slot(&cells[P::protect(n, self.numel)]),
            None => T::slot(sentinel::<T::Scalar>()),
        }
    }

    /// Returns the element at `coords`, e.g. `[i, j, k]` or `(i, j, k)`.
    #[inline(always)]
    pub fn get(&self, coords: impl Coords<N>) -> &T::Slot {
        match self.live() {
            Some(cells) => T::slot(&cells[index::sub2ind::<P, N>(&coords.subs(), &self.size, &self.strides)]),
            None => T::slot(sentinel::<T::Scalar>()),
        }
    }

    /// Returns the element at `(first, rest...)`.
    ///
    /// `rest` holds the other `N - 1` subscripts: `()` for rank 1, a `usize`
    /// for rank 2, and a tuple for higher ranks.
    ///
    /// ```
    /// use ndbind::NdArray;
    /// let a = NdArray::<u16, 3>::from_vec([2, 3, 4], (0..24).collect()).unwrap();
    /// assert_eq!(a.at(1, (2, 3)).get(), 1 + 2 * 2 + 3 * 6);
    /// ```
    #[inline(always)]
    pub fn at(&self, first: usize, rest: impl Tail<N>) -> &T::Slot {
        match self.live() {
            Some(cells) => T::slot(&cells[index::sub2ind_tail::<P, N>(first, rest, &self.size, &self.strides)]),
            None => T::slot(sentinel::<T::Scalar>()),
        }
    }

    // ------------------------------------------------------------------------

    /// Returns `true` if `self` is not bound to any memory.
    pub fn is_empty(&self) -> bool { self.data.is_none() }

    /// Returns `true` if `self` is bound to memory.
    pub fn is_valid(&self) -> bool { !self.is_empty() }

    /// Returns `true` if `self` is bound to adopted memory.
    pub fn is_owner(&self) -> bool { self.data.as_ref().map_or(false, |buffer| buffer.is_adopted()) }

    /// Returns the number of arrays, including `self`, sharing `self`'s
    /// memory, or `0` if `self` is empty.
    pub fn share_count(&self) -> usize { self.data.as_ref().map_or(0, Rc::strong_count) }

    /// The number of elements.
    pub fn numel(&self) -> usize { self.numel }

    /// The extent of each dimension.
    pub fn sizes(&self) -> &[usize; N] { &self.size }

    /// The stride of each dimension.
    pub fn strides(&self) -> &[usize; N] { &self.strides }

    /// The extent of dimension `n % N`. Rank 0 arrays report `1`.
    pub fn extent(&self, n: usize) -> usize {
        if N == 0 { return 1; }
        self.size[n % N]
    }

    /// The stride of dimension `n % N`. Rank 0 arrays report `1`.
    pub fn stride(&self, n: usize) -> usize {
        if N == 0 { return 1; }
        self.strides[n % N]
    }

    /// The address of the first element, or null if `self` is empty.
    pub fn as_ptr(&self) -> *const T::Scalar {
        match &self.data {
            Some(buffer) => buffer.cells().as_ptr().cast(),
            None => ptr::null(),
        }
    }

    /// The half-open range from the first element to one past the last.
    pub fn as_ptr_range(&self) -> Range<*const T::Scalar> {
        let begin = self.as_ptr();
        begin..begin.wrapping_add(self.numel)
    }

    /// The elements in memory order.
    pub fn as_slice(&self) -> &[T::Slot] { T::slots(self.cells()) }

    /// Iterates over the elements in memory order.
    pub fn iter(&self) -> std::slice::Iter<'_, T::Slot> { self.as_slice().iter() }

    /// Logs a one-line description of `self`.
    pub fn info(&self) { log::info!("{}", self); }
}

impl<T: Writable, const N: usize, P: Protect> NdArray<T, N, P> {
    /// The address of the first element, or null if `self` is empty.
    pub fn as_mut_ptr(&self) -> *mut T::Scalar { self.as_ptr() as *mut T::Scalar }
}

fn check_alignment<S>(ptr: *const S) -> Result<()> {
    let alignment = std::mem::align_of::<S>();
    if (ptr as usize) % alignment != 0 {
        return Err(Error::Misaligned {alignment});
    }
    Ok(())
}

// ----------------------------------------------------------------------------

impl<T: Element, const N: usize, P: Protect> Default for NdArray<T, N, P> {
    fn default() -> Self { Self::new() }
}

/// Shares the memory of `self`, rather than copying it.
impl<T: Element, const N: usize, P: Protect> Clone for NdArray<T, N, P> {
    fn clone(&self) -> Self {
        Self {
            numel: self.numel,
            size: self.size,
            strides: self.strides,
            data: self.data.clone(),
            access: PhantomData,
        }
    }
}

impl<T: Element, const N: usize, P: Protect> Display for NdArray<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NdArray<{}, {}>", T::NAME, N)?;
        if self.is_empty() {
            f.write_str(" (empty)")
        } else {
            write!(f, " of size {:?}", self.size)
        }
    }
}

impl<T: Element, const N: usize, P: Protect> Debug for NdArray<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("class", &T::CLASS)
            .field("size", &self.size)
            .field("strides", &self.strides)
            .field("numel", &self.numel)
            .field("owner", &self.is_owner())
            .finish()
    }
}

impl<T: Element, const N: usize, P: Protect> std::ops::Index<usize> for NdArray<T, N, P> {
    type Output = T::Slot;
    #[inline(always)]
    fn index(&self, n: usize) -> &T::Slot { self.flat(n) }
}

impl<T: Element, const N: usize, P: Protect> std::ops::Index<[usize; N]> for NdArray<T, N, P> {
    type Output = T::Slot;
    #[inline(always)]
    fn index(&self, subs: [usize; N]) -> &T::Slot { self.get(subs) }
}

impl<'a, T: Element, const N: usize, P: Protect> IntoIterator for &'a NdArray<T, N, P> {
    type Item = &'a T::Slot;
    type IntoIter = std::slice::Iter<'a, T::Slot>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell};
    use std::rc::{Rc};

    use super::*;
    use crate::{ClassId, HeapSink, HostArray, Trust, Wrap};

    fn values<T: Element<Slot=Cell<T>> + Copy, const N: usize, P: Protect>(a: &NdArray<T, N, P>) -> Vec<T> {
        a.iter().map(Cell::get).collect()
    }

    /// An adopted `Ownership` that counts its releases.
    fn counting<S: 'static>(count: &Rc<Cell<usize>>) -> Ownership<S> {
        let count = Rc::clone(count);
        Ownership::Adopted(Box::new(move |_: NonNull<S>, _: usize| count.set(count.get() + 1)))
    }

    #[test]
    fn empty() {
        let a = NdArray::<f32, 3>::new();
        assert!(a.is_empty());
        assert!(!a.is_valid());
        assert_eq!(a.numel(), 0);
        assert_eq!(a.sizes(), &[0; 3]);
        assert_eq!(a.strides(), &[0; 3]);
        assert!(a.as_ptr().is_null());
        assert_eq!(a.as_ptr_range(), a.as_ptr()..a.as_ptr());
        assert_eq!(a.iter().count(), 0);
        assert_eq!(a.share_count(), 0);
        assert!(!a.is_owner());
    }

    #[test]
    fn empty_access_hits_sentinel() {
        let a = NdArray::<i32, 2>::default();
        let b = NdArray::<i32, 2>::new();
        let s = sentinel::<i32>();
        assert!(std::ptr::eq(&a[7], s));
        assert!(std::ptr::eq(&a[[3, 9]], s));
        assert!(std::ptr::eq(a.at(1, 2), s));
        assert!(std::ptr::eq(a.get((0, 0)), s));
        a[0].set(17);
        assert_eq!(b.at(5, 5).get(), 17);

        let c = NdArray::<ReadOnly<i32>, 1>::new();
        assert_eq!(c[4].get(), 17);
    }

    #[test]
    fn zero_elements_hit_sentinel() {
        let a = NdArray::<u8, 2>::from_vec([3, 0], vec![]).unwrap();
        assert!(a.is_valid());
        assert_eq!(a.numel(), 0);
        assert!(std::ptr::eq(&a[[1, 1]], sentinel::<u8>()));
    }

    #[test]
    fn strides_recomputed() {
        let mut a = NdArray::<f64, 3>::from_vec([2, 3, 4], vec![0.0; 24]).unwrap();
        assert_eq!(a.strides(), &[1, 2, 6]);
        assert_eq!(a.extent(1), 3);
        assert_eq!(a.extent(4), 3);
        assert_eq!(a.stride(5), 6);
        let mut data = vec![0.0; 10];
        unsafe { a.assign_raw(data.as_mut_ptr(), [5, 1, 2], false) };
        assert_eq!(a.sizes(), &[5, 1, 2]);
        assert_eq!(a.strides(), &[1, 5, 5]);
        assert_eq!(a.numel(), 10);
        drop(a);
        assert_eq!(data.len(), 10);
    }

    #[test]
    fn three_by_four() {
        let a = NdArray::<i32, 2>::from_vec([3, 4], (0..12).collect()).unwrap();
        assert_eq!(a.strides(), &[1, 3]);
        assert_eq!(a[[2, 1]].get(), 5);
        assert_eq!(a.get((2, 1)).get(), 5);
        assert_eq!(a.at(2, 1).get(), 5);
        for j in 0..4 {
            for i in 0..3 {
                assert_eq!(a.at(i, j).get(), (i + 3 * j) as i32);
            }
        }
    }

    #[test]
    fn safe_access_wraps() {
        let a = NdArray::<i32, 1, Wrap>::from_vec([5], vec![10, 11, 12, 13, 14]).unwrap();
        assert_eq!(a[7].get(), 12);
        assert_eq!(a[usize::MAX].get(), 10 + (usize::MAX % 5) as i32);

        let b = NdArray::<u16, 3, Wrap>::from_vec([2, 3, 4], (0..24).collect()).unwrap();
        let range = b.as_ptr_range();
        for subs in [[2, 3, 4], [9, 9, 9], [usize::MAX, 0, 1_000_000]] {
            let p: *const u16 = b[subs].as_ptr();
            assert!(range.contains(&p), "{:?}", subs);
        }
        assert_eq!(b.at(3, (4, 5)).get(), b.at(1, (1, 1)).get());
    }

    #[test]
    #[should_panic]
    fn trusted_access_is_bounds_checked() {
        let a = NdArray::<i32, 1, Trust>::from_vec([5], vec![0; 5]).unwrap();
        let _ = a[7].get();
    }

    #[test]
    fn rank_zero() {
        let a = NdArray::<f64, 0, Wrap>::from_vec([], vec![2.5]).unwrap();
        assert_eq!(a.numel(), 1);
        assert_eq!(a.extent(3), 1);
        assert_eq!(a.stride(0), 1);
        assert_eq!(a[[]].get(), 2.5);
        assert_eq!(a.get(()).get(), 2.5);
        assert_eq!(a[9].get(), 2.5);
    }

    #[test]
    fn rank_one() {
        let a = NdArray::<i8, 1>::from_vec([4], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(a.at(2, ()).get(), 3);
        assert_eq!(a[[3]].get(), 4);
        assert_eq!(a.get(1usize).get(), 2);
    }

    #[test]
    fn clone_shares() {
        let a = NdArray::<u32, 2>::from_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
        let b = a.clone();
        assert_eq!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.share_count(), 2);
        b.at(1, 1).set(40);
        assert_eq!(a[3].get(), 40);
        drop(b);
        assert_eq!(a.share_count(), 1);
    }

    #[test]
    fn borrowed_never_released() {
        let mut data = [1.0f32, 2.0, 3.0];
        let mut a = NdArray::<f32, 1>::new();
        unsafe { a.assign_raw(data.as_mut_ptr(), [3], false) };
        assert!(!a.is_owner());
        let b = a.clone();
        b[0].set(-1.0);
        drop(a);
        drop(b);
        assert_eq!(data, [-1.0, 2.0, 3.0]);
    }

    #[test]
    fn adopted_released_once() {
        let count = Rc::new(Cell::new(0));
        let mut data = [0i16; 6];
        let mut a = NdArray::<i16, 2>::new();
        unsafe { a.assign_with(data.as_mut_ptr(), [2, 3], counting(&count)) };
        assert!(a.is_owner());
        let b = a.clone();
        let c = b.clone();
        a.clear();
        a.clear();
        drop(b);
        assert_eq!(count.get(), 0);
        assert_eq!(c.numel(), 6);
        drop(c);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn rebinding_releases_previous() {
        let count = Rc::new(Cell::new(0));
        let mut first = [0u8; 2];
        let mut second = [0u8; 3];
        let mut a = NdArray::<u8, 1>::new();
        unsafe {
            a.assign_with(first.as_mut_ptr(), [2], counting(&count));
            a.assign_raw(second.as_mut_ptr(), [3], false);
        }
        assert_eq!(count.get(), 1);
        assert_eq!(a.numel(), 3);
        a.reset();
        assert!(a.is_empty());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn null_binds_nothing() {
        let count = Rc::new(Cell::new(0));
        let mut a = NdArray::<f64, 2>::from_vec([1, 1], vec![1.0]).unwrap();
        unsafe { a.assign_with(std::ptr::null_mut(), [4, 4], counting(&count)) };
        assert!(a.is_empty());
        assert_eq!(a.sizes(), &[0, 0]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn adopt_boxed() {
        let items: Box<[i32]> = vec![5, 6, 7].into_boxed_slice();
        let ptr = Box::into_raw(items).cast::<i32>();
        let a = unsafe { NdArray::<i32, 1>::from_raw(ptr, [3], true) };
        assert!(a.is_owner());
        assert_eq!(values(&a), [5, 6, 7]);
    }

    #[test]
    fn typed_copy() {
        let src = NdArray::<i32, 2>::from_vec([2, 2], vec![-1, 2, 300, 4]).unwrap();
        let dst = NdArray::<f32, 2>::from_vec([2, 2], vec![0.0; 4]).unwrap();
        dst.copy_from(&src).unwrap();
        assert_eq!(values(&dst), [-1.0, 2.0, 300.0, 4.0]);

        let narrow = NdArray::<u8, 2>::from_vec([4, 1], vec![0; 4]).unwrap();
        narrow.copy_from(&src.read_only()).unwrap();
        assert_eq!(values(&narrow), [255, 2, 44, 4]);
    }

    #[test]
    fn typed_copy_count_mismatch() {
        let src = NdArray::<i32, 1>::from_vec([3], vec![1, 2, 3]).unwrap();
        let dst = NdArray::<f64, 1>::from_vec([4], vec![9.0; 4]).unwrap();
        assert_eq!(dst.copy_from(&src), Err(Error::CountMismatch {expected: 4, found: 3}));
        assert_eq!(values(&dst), [9.0; 4]);

        let empty = NdArray::<f64, 1>::new();
        assert_eq!(empty.copy_from(&src), Err(Error::CountMismatch {expected: 0, found: 3}));
    }

    #[test]
    fn bind_source() {
        let host = HostArray::from_slice(&[2, 3], &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let a = unsafe { NdArray::<f64, 2>::from_source(&host) }.unwrap();
        assert!(!a.is_owner());
        assert_eq!(a.sizes(), &[2, 3]);
        assert_eq!(a.at(1, 2).get(), 6.0);
        a.at(0, 1).set(30.0);
        drop(a);
        assert_eq!(host.to_vec::<f64>().unwrap(), [1.0, 2.0, 30.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn bind_source_read_only() {
        let host = HostArray::from_slice(&[3], &[7u16, 8, 9]).unwrap();
        let a = unsafe { NdArray::<ReadOnly<u16>, 1>::from_source(&host) }.unwrap();
        assert_eq!(a[2].get(), 9);
        assert_eq!(a.iter().map(|x| x.get()).sum::<u16>(), 24);
    }

    #[test]
    fn bind_source_type_mismatch() {
        let host = HostArray::from_slice(&[2], &[1i32, 2]).unwrap();
        let mut a = NdArray::<u32, 1>::from_vec([1], vec![5]).unwrap();
        assert_eq!(
            unsafe { a.assign_from(&host) },
            Err(Error::TypeMismatch {expected: ClassId::UInt32, found: ClassId::Int32}),
        );
        assert!(a.is_empty());
        assert_eq!(a.numel(), 0);
    }

    #[test]
    fn bind_source_rank_mismatch() {
        let host = HostArray::from_slice(&[2, 1, 2], &[1i32, 2, 3, 4]).unwrap();
        let result = unsafe { NdArray::<i32, 2>::from_source(&host) };
        assert_eq!(result.unwrap_err(), Error::RankMismatch {expected: 2, found: 3});
    }

    #[test]
    fn allocate_from_sink() {
        let mut sink = HeapSink::new();
        let (a, handle) = unsafe { NdArray::<i16, 2>::allocate(&mut sink, [2, 2]) }.unwrap();
        assert!(!a.is_owner());
        assert_eq!(handle.class_id(), ClassId::Int16);
        assert_eq!(values(&a), [0; 4]);
        a[[1, 1]].set(3);
        assert_eq!(handle.to_vec::<i16>().unwrap(), [0, 0, 0, 3]);
        assert_eq!(sink.allocations(), 1);
    }

    #[test]
    fn change_access() {
        let a = NdArray::<u8, 1>::from_vec([4], vec![1, 2, 3, 4]).unwrap();
        let b: NdArray<u8, 1, Wrap> = a.clone().with_access();
        assert_eq!(b[6].get(), 3);
        assert_eq!(a.share_count(), 2);
    }

    #[test]
    fn display() {
        let _ = env_logger::builder().is_test(true).try_init();
        let a = NdArray::<i32, 2>::from_vec([3, 4], vec![0; 12]).unwrap();
        assert_eq!(a.to_string(), "NdArray<int32, 2> of size [3, 4]");
        assert_eq!(NdArray::<ReadOnly<f32>, 1>::new().to_string(), "NdArray<single, 1> (empty)");
        a.info();
    }

    #[test]
    fn into_iter() {
        let a = NdArray::<i32, 2>::from_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
        for x in &a { x.set(x.get() * 10); }
        assert_eq!(values(&a), [10, 20, 30, 40]);
        assert_eq!(a.as_slice().len(), 4);
        assert_eq!(a.as_mut_ptr() as *const i32, a.as_ptr());
    }
}
