//! Logical subscriptions, kept independently of any backing emitter.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::{
  listener::Listener,
  rc::{MutRc, RcDerefMut, WeakMutRc},
};

/// One call to a register-style operation.
pub(crate) struct Subscription<A> {
  pub(crate) id: usize,
  pub(crate) event: String,
  pub(crate) listener: Listener<A>,
  /// The handle actually registered on a backing emitter.
  pub(crate) dispatch: Listener<A>,
  pub(crate) once: bool,
  /// Cleared by an emission buffered while detached.
  pub(crate) active: bool,
}

/// What the binder needs to mirror a subscription onto an emitter.
pub(crate) struct Mirror<A> {
  pub(crate) event: String,
  pub(crate) dispatch: Listener<A>,
  pub(crate) once: bool,
}

/// Ordered subscription list with ID-based removal.
///
/// Order is registration order, except that a prepended subscription goes to
/// the head of the whole list regardless of its event name.
pub(crate) struct Registry<A> {
  next_id: usize,
  subscriptions: SmallVec<[Subscription<A>; 4]>,
  warned: HashSet<String>,
}

impl<A> Default for Registry<A> {
  fn default() -> Self {
    Self {
      next_id: 0,
      subscriptions: SmallVec::new(),
      warned: HashSet::new(),
    }
  }
}

impl<A: 'static> Registry<A> {
  /// Record a new subscription and return its mirror.
  ///
  /// The dispatch handle holds a weak back-reference to the registry and the
  /// subscription id; for once-subscriptions it removes exactly that
  /// subscription after the user callback returns.
  pub(crate) fn subscribe(
    this: &MutRc<Self>, event: &str, listener: Listener<A>, once: bool, prepend: bool,
  ) -> Mirror<A> {
    let mut registry = this.rc_deref_mut();
    let id = registry.reserve_id();
    let dispatch = dispatch_handle(this.downgrade(), id, listener.clone(), once);
    let subscription = Subscription {
      id,
      event: event.to_owned(),
      listener,
      dispatch: dispatch.clone(),
      once,
      active: true,
    };
    if prepend {
      registry.subscriptions.insert(0, subscription);
    } else {
      registry.subscriptions.push(subscription);
    }
    Mirror { event: event.to_owned(), dispatch, once }
  }
}

fn dispatch_handle<A: 'static>(
  registry: WeakMutRc<Registry<A>>, id: usize, listener: Listener<A>, once: bool,
) -> Listener<A> {
  Listener::new(move |args: &A| {
    listener.call(args);
    if once {
      if let Some(registry) = registry.upgrade() {
        registry.rc_deref_mut().remove_id(id);
      }
    }
  })
}

impl<A> Registry<A> {
  #[inline]
  fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  pub(crate) fn remove_id(&mut self, id: usize) -> Option<Subscription<A>> {
    self
      .subscriptions
      .iter()
      .position(|s| s.id == id)
      .map(|pos| self.subscriptions.remove(pos))
  }

  /// Remove every subscription matching both `event` and `listener`.
  pub(crate) fn remove_matching(
    &mut self, event: &str, listener: &Listener<A>,
  ) -> SmallVec<[Subscription<A>; 2]> {
    let mut removed = SmallVec::new();
    let mut i = 0;
    while i < self.subscriptions.len() {
      let s = &self.subscriptions[i];
      if s.event == event && s.listener == *listener {
        removed.push(self.subscriptions.remove(i));
      } else {
        i += 1;
      }
    }
    removed
  }

  /// Distinct user callbacks registered for `event`, active or not.
  pub(crate) fn distinct_listeners(&self, event: &str) -> Vec<Listener<A>> {
    let mut listeners: Vec<Listener<A>> = Vec::new();
    for s in self.for_event(event) {
      if !listeners.contains(&s.listener) {
        listeners.push(s.listener.clone());
      }
    }
    listeners
  }

  pub(crate) fn listeners(&self, event: &str) -> Vec<Listener<A>> {
    self
      .for_event(event)
      .filter(|s| s.active)
      .map(|s| s.listener.clone())
      .collect()
  }

  pub(crate) fn count(&self, event: &str) -> usize {
    self.for_event(event).filter(|s| s.active).count()
  }

  pub(crate) fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for s in self.subscriptions.iter().filter(|s| s.active) {
      if !names.contains(&s.event) {
        names.push(s.event.clone());
      }
    }
    names
  }

  /// Credit a buffered emission: every active subscription for `event` goes
  /// inactive. Returns whether any was active.
  pub(crate) fn deactivate(&mut self, event: &str) -> bool {
    let mut credited = false;
    for s in self
      .subscriptions
      .iter_mut()
      .filter(|s| s.event == event && s.active)
    {
      s.active = false;
      credited = true;
    }
    credited
  }

  pub(crate) fn reactivate_all(&mut self) {
    for s in self.subscriptions.iter_mut() {
      s.active = true;
    }
  }

  /// Snapshot of every subscription, in logical order, for mirroring.
  pub(crate) fn mirrors(&self) -> Vec<Mirror<A>> {
    self
      .subscriptions
      .iter()
      .map(|s| Mirror { event: s.event.clone(), dispatch: s.dispatch.clone(), once: s.once })
      .collect()
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.subscriptions.len() }

  /// Number of subscriptions for `event`, including inactive ones.
  #[inline]
  pub(crate) fn total_for(&self, event: &str) -> usize { self.for_event(event).count() }

  /// Returns `true` the first time `event` is reported as leaking.
  #[inline]
  pub(crate) fn mark_warned(&mut self, event: &str) -> bool { self.warned.insert(event.to_owned()) }

  #[inline]
  fn for_event<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Subscription<A>> + 'a {
    self.subscriptions.iter().filter(move |s| s.event == event)
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::rc::RcDeref;

  fn noop() -> Listener<i32> { Listener::new(|_| {}) }

  #[test]
  fn prepend_goes_to_head_of_whole_list() {
    let registry = MutRc::own(Registry::default());
    let a = noop();
    let b = noop();
    let c = noop();
    Registry::subscribe(&registry, "x", a.clone(), false, false);
    Registry::subscribe(&registry, "y", b.clone(), false, false);
    Registry::subscribe(&registry, "y", c.clone(), true, true);

    let registry = registry.rc_deref();
    assert_eq!(registry.listeners("y"), vec![c, b]);
    assert_eq!(registry.listeners("x"), vec![a]);
    assert_eq!(registry.names(), vec!["y", "x"]);
  }

  #[test]
  fn duplicates_coexist_and_are_removed_together() {
    let registry = MutRc::own(Registry::default());
    let a = noop();
    let b = noop();
    Registry::subscribe(&registry, "x", a.clone(), false, false);
    Registry::subscribe(&registry, "x", b.clone(), false, false);
    Registry::subscribe(&registry, "x", a.clone(), true, false);
    assert_eq!(registry.rc_deref().count("x"), 3);
    assert_eq!(registry.rc_deref().distinct_listeners("x"), vec![a.clone(), b.clone()]);

    let removed = registry.rc_deref_mut().remove_matching("x", &a);
    assert_eq!(removed.len(), 2);
    assert_eq!(registry.rc_deref().listeners("x"), vec![b]);
  }

  #[test]
  fn once_dispatch_removes_only_itself() {
    let hits = Rc::new(RefCell::new(vec![]));
    let c_hits = hits.clone();
    let l = Listener::new(move |v: &i32| c_hits.borrow_mut().push(*v));
    let registry = MutRc::own(Registry::default());
    let first = Registry::subscribe(&registry, "x", l.clone(), true, false);
    Registry::subscribe(&registry, "x", l.clone(), true, false);

    first.dispatch.call(&5);
    assert_eq!(*hits.borrow(), vec![5]);
    assert_eq!(registry.rc_deref().count("x"), 1);
  }

  #[test]
  fn deactivate_credits_once_per_activation() {
    let registry = MutRc::own(Registry::default());
    Registry::subscribe(&registry, "x", noop(), false, false);
    Registry::subscribe(&registry, "x", noop(), false, false);

    let mut r = registry.rc_deref_mut();
    assert!(!r.deactivate("y"));
    assert!(r.deactivate("x"));
    assert!(!r.deactivate("x"));
    assert_eq!(r.count("x"), 0);
    assert_eq!(r.total_for("x"), 2);
    assert!(r.names().is_empty());

    r.reactivate_all();
    assert_eq!(r.count("x"), 2);
    assert!(r.deactivate("x"));
  }

  #[test]
  fn mirrors_follow_logical_order() {
    let registry = MutRc::own(Registry::default());
    let first = Registry::subscribe(&registry, "x", noop(), false, false);
    let head = Registry::subscribe(&registry, "x", noop(), true, true);

    let mirrors = registry.rc_deref().mirrors();
    assert_eq!(mirrors.len(), 2);
    assert_eq!(mirrors[0].dispatch, head.dispatch);
    assert!(mirrors[0].once);
    assert_eq!(mirrors[1].dispatch, first.dispatch);
  }
}
