//! Listener handles.
//!
//! A [`Listener`] is a reference-counted callback. Two listeners are equal
//! only when they are clones of the same handle, which mirrors the "same
//! function object" identity that conventional emitters use when removing
//! callbacks.

use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

/// A callback invoked with a reference to the emission arguments.
///
/// # Example
///
/// ```rust
/// use indirect_emitter::prelude::*;
///
/// let a = Listener::new(|v: &i32| println!("got {v}"));
/// let b = a.clone();
/// let c = Listener::new(|v: &i32| println!("got {v}"));
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
pub struct Listener<A>(Rc<dyn Fn(&A)>);

impl<A> Listener<A> {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(&A) + 'static,
  {
    Self(Rc::new(f))
  }

  #[inline]
  pub fn call(&self, args: &A) { (self.0)(args) }

  /// Identity comparison, ignoring the vtable.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<A> Clone for Listener<A> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<A> PartialEq for Listener<A> {
  #[inline]
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<A> Eq for Listener<A> {}

impl<A> Debug for Listener<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Listener")
      .field(&Rc::as_ptr(&self.0).cast::<()>())
      .finish()
  }
}

impl<A, F> From<F> for Listener<A>
where
  F: Fn(&A) + 'static,
{
  fn from(f: F) -> Self { Self::new(f) }
}
