//! Attachment state: which emitter backs the wrapper, and the limits that
//! move across attach/detach.

use crate::{
  emitter::{EmitterRef, EventEmitter},
  registry::Mirror,
};

/// The configured limit persists across swaps; the emitter's own limit is
/// saved on attach and handed back on detach so its owner never sees the
/// wrapper's setting leak onto it.
pub(crate) struct Binder<A> {
  emitter: Option<EmitterRef<A>>,
  original_max_listeners: usize,
  max_listeners: usize,
}

impl<A> Binder<A> {
  pub(crate) fn new(max_listeners: usize) -> Self {
    Self { emitter: None, original_max_listeners: 0, max_listeners }
  }

  #[inline]
  pub(crate) fn emitter(&self) -> Option<EmitterRef<A>> { self.emitter.clone() }

  #[inline]
  pub(crate) fn is_attached(&self) -> bool { self.emitter.is_some() }

  #[inline]
  pub(crate) fn max_listeners(&self) -> usize { self.max_listeners }

  #[inline]
  pub(crate) fn set_max_listeners(&mut self, n: usize) { self.max_listeners = n; }

  /// Take ownership of `emitter`, remembering `original` for restoration.
  pub(crate) fn bind(&mut self, emitter: EmitterRef<A>, original: usize) {
    self.emitter = Some(emitter);
    self.original_max_listeners = original;
  }

  /// Release the attached emitter along with the limit it had before
  /// attachment.
  pub(crate) fn unbind(&mut self) -> Option<(EmitterRef<A>, usize)> {
    self
      .emitter
      .take()
      .map(|emitter| (emitter, self.original_max_listeners))
  }
}

/// Register a single subscription on `emitter`.
pub(crate) fn mirror<A>(emitter: &EmitterRef<A>, m: Mirror<A>, prepend: bool) {
  let Mirror { event, dispatch, once } = m;
  match (once, prepend) {
    (false, false) => emitter.on(&event, dispatch),
    (true, false) => emitter.once(&event, dispatch),
    (false, true) => emitter.prepend_listener(&event, dispatch),
    (true, true) => emitter.prepend_once_listener(&event, dispatch),
  }
}

/// Apply the configured limit and mirror every subscription, appending in
/// logical order so the emitter's order matches the registry's.
pub(crate) fn attach_all<A>(emitter: &EmitterRef<A>, mirrors: Vec<Mirror<A>>, max_listeners: usize) {
  emitter.set_max_listeners(max_listeners);
  for m in mirrors {
    mirror(emitter, m, false);
  }
}

/// Restore the emitter's original limit and remove every mirrored handle.
pub(crate) fn detach_all<A>(emitter: &EmitterRef<A>, mirrors: &[Mirror<A>], original: usize) {
  emitter.set_max_listeners(original);
  for m in mirrors {
    emitter.remove_listener(&m.event, &m.dispatch);
  }
}
