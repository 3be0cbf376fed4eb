use std::{
  cell::{Ref, RefCell, RefMut},
  rc::{Rc, Weak},
};

pub trait RcDeref {
  type Inner;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Ref<'a, Self::Inner>;
}

pub trait RcDerefMut: RcDeref {
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> RefMut<'a, Self::Inner>;
}

/// Single-threaded shared mutable cell used for every facet of the wrapper.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

/// Non-owning back-reference to a [`MutRc`].
pub struct WeakMutRc<T>(Weak<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn downgrade(&self) -> WeakMutRc<T> { WeakMutRc(Rc::downgrade(&self.0)) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> WeakMutRc<T> {
  #[inline]
  pub fn upgrade(&self) -> Option<MutRc<T>> { self.0.upgrade().map(MutRc) }
}

impl<T> RcDeref for MutRc<T> {
  type Inner = T;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Ref<'a, T> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> RefMut<'a, T> { self.0.borrow_mut() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for WeakMutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> From<T> for MutRc<T> {
  #[inline]
  fn from(t: T) -> Self { Self::own(t) }
}
