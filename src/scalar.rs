//! Classification of element types.
//!
//! Every element type that an [`NdArray`] can hold maps at compile time to a
//! display name and a host [`ClassId`]. Writable scalars such as `i32` and
//! `f64` implement [`Scalar`] directly. Their read-only counterparts are
//! spelled [`ReadOnly<S>`], which reports the same name and class as `S`:
//! constness changes what element access hands out, not how the host
//! classifies the data.
//!
//! [`NdArray`]: super::NdArray

use std::cell::{Cell};
use std::fmt::{self, Debug, Display};
use std::marker::{PhantomData};

/// The class tag that a host runtime attaches to its array objects.
///
/// The discriminants are stable and match the host's numbering, so that a
/// raw tag received over a foreign interface can be decoded with
/// [`ClassId::from_raw()`].
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum ClassId {
    Unknown = 0,
    Cell = 1,
    Struct = 2,
    Logical = 3,
    Char = 4,
    Void = 5,
    Double = 6,
    Single = 7,
    Int8 = 8,
    UInt8 = 9,
    Int16 = 10,
    UInt16 = 11,
    Int32 = 12,
    UInt32 = 13,
    Int64 = 14,
    UInt64 = 15,
    Function = 16,
}

impl ClassId {
    const ALL: [Self; 17] = [
        Self::Unknown, Self::Cell, Self::Struct, Self::Logical, Self::Char,
        Self::Void, Self::Double, Self::Single, Self::Int8, Self::UInt8,
        Self::Int16, Self::UInt16, Self::Int32, Self::UInt32, Self::Int64,
        Self::UInt64, Self::Function,
    ];

    /// Decodes a raw host tag.
    ///
    /// ```
    /// use ndbind::ClassId;
    /// assert_eq!(ClassId::from_raw(12), Some(ClassId::Int32));
    /// assert_eq!(ClassId::from_raw(99), None);
    /// ```
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// The host's name for this class.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Cell => "cell",
            Self::Struct => "struct",
            Self::Logical => "logical",
            Self::Char => "char",
            Self::Void => "void",
            Self::Double => "double",
            Self::Single => "single",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Function => "function_handle",
        }
    }

    /// The size in bytes of one element, or `None` for classes that are not
    /// stored as a flat numeric buffer.
    pub const fn element_size(self) -> Option<usize> {
        match self {
            Self::Logical | Self::Int8 | Self::UInt8 => Some(1),
            Self::Char | Self::Int16 | Self::UInt16 => Some(2),
            Self::Single | Self::Int32 | Self::UInt32 => Some(4),
            Self::Double | Self::Int64 | Self::UInt64 => Some(8),
            _ => None,
        }
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

// ----------------------------------------------------------------------------

/// Implemented by the numeric types that can be stored in an array.
///
/// Only the types listed in this module implement it, so using any other type
/// as an element is a compile-time error.
pub trait Scalar: 'static + Copy + Default + Debug + PartialEq {
    /// The host's name for this type.
    const NAME: &'static str;

    /// The host's class tag for this type.
    const CLASS: ClassId;
}

/// Implemented by the `T` of an [`NdArray<T, N>`].
///
/// An `Element` names the [`Scalar`] that is actually stored, and the
/// `Slot` type through which element access exposes each stored value.
///
/// [`NdArray<T, N>`]: super::NdArray
pub trait Element: 'static {
    /// The stored type.
    type Scalar: Scalar;

    /// What element access returns a reference to.
    type Slot: 'static;

    /// Same as `Self::Scalar::NAME`.
    const NAME: &'static str = <Self::Scalar as Scalar>::NAME;

    /// Same as `Self::Scalar::CLASS`.
    const CLASS: ClassId = <Self::Scalar as Scalar>::CLASS;

    /// Views a stored cell as a `Slot`.
    fn slot(cell: &Cell<Self::Scalar>) -> &Self::Slot;

    /// Views a run of stored cells as `Slot`s.
    fn slots(cells: &[Cell<Self::Scalar>]) -> &[Self::Slot];
}

/// Implemented by [`Element`]s whose arrays may be written, e.g. as the
/// destination of [`NdArray::copy_from()`].
///
/// [`NdArray::copy_from()`]: super::NdArray::copy_from()
pub trait Writable: Element {}

macro_rules! impl_scalar {
    ($t:ty, $name:literal, $class:ident) => {
        impl Scalar for $t {
            const NAME: &'static str = $name;
            const CLASS: ClassId = ClassId::$class;
        }

        impl Element for $t {
            type Scalar = $t;
            type Slot = Cell<$t>;
            #[inline(always)]
            fn slot(cell: &Cell<$t>) -> &Self::Slot { cell }
            #[inline(always)]
            fn slots(cells: &[Cell<$t>]) -> &[Self::Slot] { cells }
        }

        impl Writable for $t {}
    };
}

impl_scalar!(i8, "int8", Int8);
impl_scalar!(u8, "uint8", UInt8);
impl_scalar!(i16, "int16", Int16);
impl_scalar!(u16, "uint16", UInt16);
impl_scalar!(i32, "int32", Int32);
impl_scalar!(u32, "uint32", UInt32);
impl_scalar!(f32, "single", Single);
impl_scalar!(f64, "double", Double);

// ----------------------------------------------------------------------------

/// The read-only counterpart of the scalar `S`, for use as the `T` of an
/// [`NdArray<T, N>`]. Never instantiated.
///
/// ```
/// use ndbind::{Element, ReadOnly};
/// assert_eq!(<ReadOnly<f32> as Element>::NAME, "single");
/// assert_eq!(<ReadOnly<f32> as Element>::CLASS, <f32 as Element>::CLASS);
/// ```
///
/// [`NdArray<T, N>`]: super::NdArray
pub struct ReadOnly<S>(PhantomData<S>);

/// A stored value that can be read but not written.
#[repr(transparent)]
pub struct Const<S>(Cell<S>);

impl<S: Copy> Const<S> {
    /// Returns a copy of the value.
    #[inline(always)]
    pub fn get(&self) -> S { self.0.get() }
}

impl<S: Copy + Debug> Debug for Const<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Const").field(&self.get()).finish()
    }
}

impl<S: Scalar> Element for ReadOnly<S> {
    type Scalar = S;
    type Slot = Const<S>;

    #[inline(always)]
    fn slot(cell: &Cell<S>) -> &Const<S> {
        // SAFETY: `Const<S>` is `repr(transparent)` over `Cell<S>`.
        unsafe { &*(cell as *const Cell<S> as *const Const<S>) }
    }

    #[inline(always)]
    fn slots(cells: &[Cell<S>]) -> &[Const<S>] {
        // SAFETY: As above, element-wise.
        unsafe { &*(cells as *const [Cell<S>] as *const [Const<S>]) }
    }
}

// ----------------------------------------------------------------------------
