//! Conversion of multi-dimensional subscripts into flat offsets.
//!
//! Arrays are stored in column-major order: dimension 0 varies fastest. For
//! an array of size `size`, the flat offset of the subscripts `subs` is
//! `Σ subs[i] * strides[i]`, where `strides[0] == 1` and
//! `strides[i] == strides[i - 1] * size[i - 1]`.
//!
//! What happens to a subscript that is out of range is decided by a
//! [`Protect`] policy: [`Wrap`] reduces it modulo the extent, so that every
//! subscript lands in bounds, whereas [`Trust`] uses it as it is.

/// A policy for subscripts that may exceed their extent.
///
/// This trait has no methods that take `self`. It is implemented for types
/// that cannot be instantiated, and is passed as a type parameter.
pub trait Protect {
    /// Maps the subscript `k` into a dimension of extent `n`.
    fn protect(k: usize, n: usize) -> usize;
}

/// A [`Protect`] policy that reduces every subscript modulo its extent.
///
/// Out-of-range access therefore never faults, but silently reaches a
/// different element.
pub enum Wrap {}

impl Protect for Wrap {
    #[inline(always)]
    fn protect(k: usize, n: usize) -> usize { k % n }
}

/// A [`Protect`] policy that uses every subscript as given.
pub enum Trust {}

impl Protect for Trust {
    #[inline(always)]
    fn protect(k: usize, _: usize) -> usize { k }
}

/// The [`Protect`] policy of arrays that do not name one: [`Wrap`] if the
/// `safe-access` feature is enabled, otherwise [`Trust`].
#[cfg(feature = "safe-access")]
pub type DefaultAccess = Wrap;

/// The [`Protect`] policy of arrays that do not name one: [`Wrap`] if the
/// `safe-access` feature is enabled, otherwise [`Trust`].
#[cfg(not(feature = "safe-access"))]
pub type DefaultAccess = Trust;

// ----------------------------------------------------------------------------

/// Returns the number of elements of an array of size `size`, or `None` if
/// it overflows.
///
/// ```
/// assert_eq!(ndbind::index::numel(&[3, 4]), Some(12));
/// assert_eq!(ndbind::index::numel(&[]), Some(1));
/// assert_eq!(ndbind::index::numel(&[usize::MAX, 2]), None);
/// ```
pub fn numel(size: &[usize]) -> Option<usize> {
    size.iter().try_fold(1usize, |n, &s| n.checked_mul(s))
}

/// Returns the column-major strides of an array of size `size`.
///
/// The caller must ensure that the product of `size` does not overflow.
///
/// ```
/// assert_eq!(ndbind::index::strides(&[3, 4, 5]), [1, 3, 12]);
/// ```
pub fn strides<const N: usize>(size: &[usize; N]) -> [usize; N] {
    let mut strides = [0; N];
    let mut stride = 1;
    for (s, &n) in strides.iter_mut().zip(size) {
        *s = stride;
        stride *= n;
    }
    strides
}

/// Returns the flat offset of `subs`, using the plain loop for every rank.
#[inline]
pub fn sub2ind_general<P: Protect, const N: usize>(
    subs: &[usize; N],
    size: &[usize; N],
    strides: &[usize; N],
) -> usize {
    let mut index = 0;
    for i in 0..N {
        index += P::protect(subs[i], size[i]) * strides[i];
    }
    index
}

/// Returns the flat offset of `subs` in an array with the given `size` and
/// `strides`.
///
/// Ranks 0, 1 and 2 take shortcuts that avoid the stride multiplications. For
/// in-range subscripts the result always equals [`sub2ind_general()`].
///
/// # Panics
///
/// With [`Wrap`], panics if any extent is zero.
///
/// ```
/// use ndbind::index::{sub2ind, strides, Wrap};
/// let size = [3, 4];
/// assert_eq!(sub2ind::<Wrap, 2>(&[2, 1], &size, &strides(&size)), 5);
/// ```
#[inline(always)]
pub fn sub2ind<P: Protect, const N: usize>(
    subs: &[usize; N],
    size: &[usize; N],
    strides: &[usize; N],
) -> usize {
    let (s, n): (&[usize], &[usize]) = (subs, size);
    match N {
        0 => 0,
        1 => P::protect(s[0], n[0]),
        2 => P::protect(s[0], n[0]) + P::protect(s[1], n[1]) * n[0],
        _ => sub2ind_general::<P, N>(subs, size, strides),
    }
}

/// Like [`sub2ind()`], but takes the first subscript separately from the
/// `N - 1` others.
#[inline(always)]
pub fn sub2ind_tail<P: Protect, const N: usize>(
    first: usize,
    rest: impl Tail<N>,
    size: &[usize; N],
    strides: &[usize; N],
) -> usize {
    sub2ind::<P, N>(&rest.with_head(first), size, strides)
}

// ----------------------------------------------------------------------------

/// Implemented by types that can be used as a complete set of `N`
/// subscripts.
///
/// ```
/// use ndbind::index::Coords;
/// assert_eq!(Coords::<3>::subs((1, 2, 3)), [1, 2, 3]);
/// assert_eq!(Coords::<1>::subs(7usize), [7]);
/// ```
pub trait Coords<const N: usize> {
    fn subs(self) -> [usize; N];
}

impl<const N: usize> Coords<N> for [usize; N] {
    #[inline(always)]
    fn subs(self) -> [usize; N] { self }
}

impl<const N: usize> Coords<N> for &[usize; N] {
    #[inline(always)]
    fn subs(self) -> [usize; N] { *self }
}

impl Coords<0> for () {
    #[inline(always)]
    fn subs(self) -> [usize; 0] { [] }
}

impl Coords<1> for usize {
    #[inline(always)]
    fn subs(self) -> [usize; 1] { [self] }
}

/// Implemented by types that hold exactly `N - 1` subscripts, i.e. all of
/// them except the first. This is the argument pack of
/// [`NdArray::at()`].
///
/// Rank 1 takes `()`, rank 2 takes a `usize`, and higher ranks take a tuple.
///
/// [`NdArray::at()`]: super::NdArray::at()
pub trait Tail<const N: usize> {
    /// Prepends `head` to `self`.
    fn with_head(self, head: usize) -> [usize; N];
}

impl Tail<1> for () {
    #[inline(always)]
    fn with_head(self, head: usize) -> [usize; 1] { [head] }
}

impl Tail<2> for usize {
    #[inline(always)]
    fn with_head(self, head: usize) -> [usize; 2] { [head, self] }
}

macro_rules! subscript {
    ($t:ident) => { usize };
}

macro_rules! impl_tuple {
    ($n:literal, $m:literal; $($t:ident),*) => {
        impl Coords<$n> for ($(subscript!($t),)*) {
            #[inline(always)]
            fn subs(self) -> [usize; $n] {
                let ($($t,)*) = self;
                [$($t),*]
            }
        }

        impl Tail<$m> for ($(subscript!($t),)*) {
            #[inline(always)]
            fn with_head(self, head: usize) -> [usize; $m] {
                let ($($t,)*) = self;
                [head, $($t),*]
            }
        }
    };
}

impl_tuple!(2, 3; i, j);
impl_tuple!(3, 4; i, j, k);
impl_tuple!(4, 5; i, j, k, l);
impl_tuple!(5, 6; i, j, k, l, m);

// ----------------------------------------------------------------------------
