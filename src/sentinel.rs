//! The value that empty arrays hand out instead of faulting.
//!
//! Each scalar type has one sentinel, created with `S::default()` the first
//! time it is needed and never freed. All empty arrays of that scalar type
//! share it, so a value written through one empty array can be read back
//! through any other.
//!
//! Sentinels are kept per thread: a `&Cell<S>` cannot cross threads, and
//! arrays cannot either.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap};
use std::marker::{PhantomData};

use super::{Scalar};

thread_local! {
    static SENTINELS: RefCell<HashMap<TypeId, &'static dyn Any>> = RefCell::new(HashMap::new());
}

/// Returns the sentinel for `S`.
///
/// ```
/// let a = ndbind::sentinel::<i16>();
/// a.set(12);
/// assert_eq!(ndbind::sentinel::<i16>().get(), 12);
/// ```
pub fn sentinel<S: Scalar>() -> &'static Cell<S> {
    SENTINELS.with(|sentinels| {
        let mut sentinels = sentinels.borrow_mut();
        let any = *sentinels.entry(TypeId::of::<S>()).or_insert_with(|| {
            log::trace!("Creating the {} sentinel", S::NAME);
            let leaked: &'static Cell<S> = Box::leak(Box::new(Cell::new(S::default())));
            leaked as &'static dyn Any
        });
        any.downcast_ref::<Cell<S>>().expect("sentinels are keyed by their own type")
    })
}

// ----------------------------------------------------------------------------

/// A container of `S` that has no storage: every index yields the
/// [`sentinel()`].
#[derive(Debug, Copy, Clone, Default)]
pub struct Fake<S>(PhantomData<S>);

impl<S: Scalar> Fake<S> {
    pub fn new() -> Self { Fake(PhantomData) }
}

impl<S: Scalar> std::ops::Index<usize> for Fake<S> {
    type Output = Cell<S>;
    #[inline(always)]
    fn index(&self, _: usize) -> &Cell<S> { sentinel::<S>() }
}

// ----------------------------------------------------------------------------
