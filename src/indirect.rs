use std::fmt::{Debug, Formatter};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
  binder::{self, Binder},
  config::{default_max_listeners, exceeds_limit},
  delegator::{Delegator, OwnMember},
  emitter::{EmitterRef, EventEmitter},
  error::EmitterError,
  listener::Listener,
  rc::{MutRc, RcDeref, RcDerefMut},
  registry::Registry,
};

/// An event emitter whose backing emitter can be attached, swapped or
/// removed at any time.
///
/// Listeners registered on the wrapper are kept in its own registry and
/// mirrored onto whichever emitter is attached. Swapping emitters moves every
/// listener to the new one. Emissions made while no emitter is attached are
/// buffered and replayed, in order, on the next attach.
///
/// `IndirectEmitter` is a cheap handle: clones share the same state.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use indirect_emitter::prelude::*;
///
/// let indirect = IndirectEmitter::<i32>::new();
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// indirect.on("tick", Listener::new(move |v: &i32| c_seen.borrow_mut().push(*v)));
///
/// // Nothing attached yet: buffered.
/// assert!(indirect.emit("tick", 1));
/// assert!(seen.borrow().is_empty());
///
/// let backing: EmitterRef<i32> = Rc::new(LocalEmitter::new());
/// indirect.set_emitter(Some(backing.clone()));
/// assert_eq!(*seen.borrow(), vec![1]);
///
/// backing.emit("tick", &2);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
///
/// # Detached emission bookkeeping
///
/// While detached, `emit` reports `true` only if some subscription for the
/// event is still *active*, and every active subscription for that event
/// goes inactive. A second detached `emit` of the same event therefore
/// reports `false`, yet both payloads are replayed on attach. Inactive
/// subscriptions are hidden from [`listeners`](Self::listeners),
/// [`listener_count`](Self::listener_count) and
/// [`event_names`](Self::event_names) until an emitter attaches.
pub struct IndirectEmitter<A: 'static> {
  registry: MutRc<Registry<A>>,
  binder: MutRc<Binder<A>>,
  delegator: MutRc<Delegator<A>>,
}

impl<A: 'static> IndirectEmitter<A> {
  /// A detached wrapper using the process default limit.
  pub fn new() -> Self { Self::with_max_listeners(default_max_listeners()) }

  pub fn with_max_listeners(n: usize) -> Self {
    Self {
      registry: MutRc::own(Registry::default()),
      binder: MutRc::own(Binder::new(n)),
      delegator: MutRc::own(Delegator::default()),
    }
  }

  /// A wrapper attached to `emitter` from the start.
  pub fn with_emitter(emitter: EmitterRef<A>) -> Self {
    let this = Self::new();
    this.set_emitter(Some(emitter));
    this
  }

  // ==========================================================================
  // Registration
  // ==========================================================================

  #[inline]
  pub fn on(&self, event: &str, listener: impl Into<Listener<A>>) -> &Self {
    self.register(event, listener.into(), false, false)
  }

  #[inline]
  pub fn add_listener(&self, event: &str, listener: impl Into<Listener<A>>) -> &Self {
    self.on(event, listener)
  }

  #[inline]
  pub fn once(&self, event: &str, listener: impl Into<Listener<A>>) -> &Self {
    self.register(event, listener.into(), true, false)
  }

  #[inline]
  pub fn prepend_listener(&self, event: &str, listener: impl Into<Listener<A>>) -> &Self {
    self.register(event, listener.into(), false, true)
  }

  #[inline]
  pub fn prepend_once_listener(&self, event: &str, listener: impl Into<Listener<A>>) -> &Self {
    self.register(event, listener.into(), true, true)
  }

  fn register(&self, event: &str, listener: Listener<A>, once: bool, prepend: bool) -> &Self {
    let m = Registry::subscribe(&self.registry, event, listener, once, prepend);
    match self.emitter() {
      Some(emitter) => binder::mirror(&emitter, m, prepend),
      None => self.check_leak(event),
    }
    self
  }

  /// The attached emitter warns on its own; while detached the wrapper
  /// stands in for it.
  fn check_leak(&self, event: &str) {
    let limit = self.max_listeners();
    let mut registry = self.registry.rc_deref_mut();
    let count = registry.total_for(event);
    if exceeds_limit(count, limit) && registry.mark_warned(event) {
      warn!(event, count, max_listeners = limit, "possible listener leak detected");
    }
  }

  // ==========================================================================
  // Removal
  // ==========================================================================

  /// Remove every subscription of `listener` for `event`. Unknown pairs are
  /// ignored.
  pub fn remove_listener(&self, event: &str, listener: &Listener<A>) -> &Self {
    let removed = self
      .registry
      .rc_deref_mut()
      .remove_matching(event, listener);
    if let Some(emitter) = self.emitter() {
      for s in &removed {
        emitter.remove_listener(event, &s.dispatch);
      }
    }
    self
  }

  #[inline]
  pub fn off(&self, event: &str, listener: &Listener<A>) -> &Self {
    self.remove_listener(event, listener)
  }

  /// Remove every subscription for `event`, one distinct listener at a time.
  pub fn remove_all_listeners(&self, event: &str) -> &Self {
    let listeners = self.registry.rc_deref().distinct_listeners(event);
    for listener in &listeners {
      self.remove_listener(event, listener);
    }
    self
  }

  // ==========================================================================
  // Queries
  // ==========================================================================

  /// Active listeners for `event`, in registration order.
  pub fn listeners(&self, event: &str) -> Vec<Listener<A>> {
    self.registry.rc_deref().listeners(event)
  }

  pub fn listener_count(&self, event: &str) -> usize { self.registry.rc_deref().count(event) }

  /// Event names with at least one active listener, in order of first
  /// registration.
  pub fn event_names(&self) -> Vec<String> { self.registry.rc_deref().names() }

  // ==========================================================================
  // Emission
  // ==========================================================================

  /// Emit `event` on the attached emitter, or buffer it for replay.
  pub fn emit(&self, event: &str, args: A) -> bool {
    if let Some(emitter) = self.emitter() {
      return emitter.emit(event, &args);
    }

    self.delegator.rc_deref_mut().enqueue(event, args);
    let credited = self.registry.rc_deref_mut().deactivate(event);
    trace!(event, credited, "buffered emission while detached");
    credited
  }

  /// Number of buffered emissions waiting for an emitter.
  pub fn queued_len(&self) -> usize { self.delegator.rc_deref().len() }

  // ==========================================================================
  // Limits
  // ==========================================================================

  pub fn set_max_listeners(&self, n: usize) -> &Self {
    self.binder.rc_deref_mut().set_max_listeners(n);
    if let Some(emitter) = self.emitter() {
      emitter.set_max_listeners(n);
    }
    self
  }

  /// The configured limit; independent of the attached emitter's own value.
  pub fn max_listeners(&self) -> usize { self.binder.rc_deref().max_listeners() }

  // ==========================================================================
  // Attachment
  // ==========================================================================

  /// Attach `emitter`, replacing any current one, or detach with `None`.
  ///
  /// Attaching saves the emitter's limit and applies the configured one,
  /// mirrors every subscription in logical order, then replays the buffered
  /// emissions through it.
  pub fn set_emitter(&self, emitter: Option<EmitterRef<A>>) -> &Self {
    self.detach();
    let Some(emitter) = emitter else {
      return self;
    };

    let original = emitter.max_listeners();
    let mirrors = self.registry.rc_deref().mirrors();
    let subscriptions = mirrors.len();
    binder::attach_all(&emitter, mirrors, self.max_listeners());
    self.binder.rc_deref_mut().bind(emitter, original);
    self.registry.rc_deref_mut().reactivate_all();

    let queued = self.delegator.rc_deref_mut().drain();
    debug!(subscriptions, replayed = queued.len(), "attached emitter");
    for emission in queued {
      self.emit(&emission.event, emission.args);
    }
    self
  }

  /// Detach the current emitter, restoring its limit and removing every
  /// mirrored listener from it. No-op when detached.
  pub fn detach(&self) -> &Self {
    let Some((emitter, original)) = self.binder.rc_deref_mut().unbind() else {
      return self;
    };
    let mirrors = self.registry.rc_deref().mirrors();
    binder::detach_all(&emitter, &mirrors, original);
    debug!(subscriptions = mirrors.len(), "detached emitter");
    self
  }

  pub fn has_emitter(&self) -> bool { self.binder.rc_deref().is_attached() }

  /// The currently attached emitter, if any.
  pub fn emitter(&self) -> Option<EmitterRef<A>> { self.binder.rc_deref().emitter() }

  // ==========================================================================
  // Dynamic members
  // ==========================================================================

  /// Read a member by name. `maxListeners` belongs to the wrapper; any other
  /// name is read from the attached emitter, or is absent while detached.
  pub fn get_dynamic(&self, name: &str) -> Option<Value> {
    match OwnMember::parse(name) {
      Some(OwnMember::MaxListeners) => Some(Value::from(self.max_listeners())),
      None => self.emitter().and_then(|e| e.property(name)),
    }
  }

  /// Write a member by name. Writes to emitter members are discarded while
  /// detached; errors from the emitter are returned as-is.
  pub fn set_dynamic(&self, name: &str, value: Value) -> Result<(), EmitterError> {
    match OwnMember::parse(name) {
      Some(OwnMember::MaxListeners) => {
        let n = value
          .as_u64()
          .and_then(|n| usize::try_from(n).ok())
          .ok_or_else(|| EmitterError::InvalidValue { name: name.to_owned(), value: value.clone() })?;
        self.set_max_listeners(n);
        Ok(())
      }
      None => match self.emitter() {
        Some(emitter) => emitter.set_property(name, value),
        None => Ok(()),
      },
    }
  }
}

impl<A: 'static> Default for IndirectEmitter<A> {
  fn default() -> Self { Self::new() }
}

impl<A: 'static> Clone for IndirectEmitter<A> {
  fn clone(&self) -> Self {
    Self {
      registry: self.registry.clone(),
      binder: self.binder.clone(),
      delegator: self.delegator.clone(),
    }
  }
}

impl<A: 'static> PartialEq for IndirectEmitter<A> {
  /// Handles are equal when they share state.
  fn eq(&self, other: &Self) -> bool { self.registry.ptr_eq(&other.registry) }
}

impl<A: 'static> Debug for IndirectEmitter<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IndirectEmitter")
      .field("subscriptions", &self.registry.rc_deref().len())
      .field("queued", &self.queued_len())
      .field("attached", &self.has_emitter())
      .field("max_listeners", &self.max_listeners())
      .finish()
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use serde_json::json;

  use super::*;
  use crate::{
    config::DEFAULT_MAX_LISTENERS,
    emitter::{EventEmitter, LocalEmitter},
  };

  fn local() -> (Rc<LocalEmitter<i32>>, EmitterRef<i32>) {
    let local = Rc::new(LocalEmitter::new());
    let handle: EmitterRef<i32> = local.clone();
    (local, handle)
  }

  #[test]
  fn registration_while_attached_is_mirrored() {
    let (a, a_ref) = local();
    let indirect = IndirectEmitter::with_emitter(a_ref);
    let l = Listener::new(|_: &i32| {});
    indirect.on("x", l.clone()).prepend_once_listener("x", |_: &i32| {});

    assert_eq!(a.listener_count("x"), 2);
    assert_eq!(indirect.listeners("x").last(), Some(&l));

    indirect.off("x", &l);
    assert_eq!(a.listener_count("x"), 1);
  }

  #[test]
  fn once_fired_by_emitter_leaves_registry() {
    let (a, a_ref) = local();
    let indirect = IndirectEmitter::with_emitter(a_ref);
    indirect.once("x", |_: &i32| {});
    assert_eq!(indirect.listener_count("x"), 1);

    assert!(indirect.emit("x", 1));
    assert_eq!(indirect.listener_count("x"), 0);
    assert_eq!(a.listener_count("x"), 0);
    assert!(!indirect.emit("x", 2));
  }

  #[test]
  fn swap_moves_subscriptions() {
    let (a, a_ref) = local();
    let (b, b_ref) = local();
    let hits = Rc::new(RefCell::new(vec![]));
    let c_hits = hits.clone();

    let indirect = IndirectEmitter::with_emitter(a_ref);
    indirect.on("x", move |v: &i32| c_hits.borrow_mut().push(*v));
    indirect.set_emitter(Some(b_ref));

    assert_eq!(a.listener_count("x"), 0);
    assert!(!a.emit("x", &1));
    assert!(b.emit("x", &2));
    assert_eq!(*hits.borrow(), vec![2]);
  }

  #[test]
  fn listener_can_register_during_dispatch() {
    let (a, a_ref) = local();
    let indirect = IndirectEmitter::with_emitter(a_ref);
    let c_indirect = indirect.clone();
    indirect.once("x", move |_: &i32| {
      c_indirect.on("y", |_: &i32| {});
    });

    indirect.emit("x", 0);
    assert_eq!(indirect.listener_count("y"), 1);
    assert_eq!(a.listener_count("y"), 1);
  }

  #[test]
  fn replay_snapshot_requeues_after_detach() {
    let (_a, a_ref) = local();
    let indirect = IndirectEmitter::<i32>::new();
    let c_indirect = indirect.clone();
    indirect.once("x", move |_: &i32| {
      c_indirect.detach();
    });
    indirect.emit("x", 1);
    indirect.emit("x", 2);

    indirect.set_emitter(Some(a_ref));
    assert!(!indirect.has_emitter());
    assert_eq!(indirect.queued_len(), 1);
  }

  #[test]
  fn dynamic_max_listeners_is_own_member() {
    let (a, a_ref) = local();
    let indirect = IndirectEmitter::with_emitter(a_ref);
    assert_eq!(indirect.get_dynamic("maxListeners"), Some(json!(DEFAULT_MAX_LISTENERS)));

    indirect.set_dynamic("maxListeners", json!(25)).unwrap();
    assert_eq!(indirect.max_listeners(), 25);
    assert_eq!(a.max_listeners(), 25);

    let err = indirect
      .set_dynamic("maxListeners", json!(-1))
      .unwrap_err();
    assert_eq!(err, EmitterError::InvalidValue { name: "maxListeners".into(), value: json!(-1) });
  }

  #[test]
  fn emitter_without_members_rejects_writes() {
    struct Bare(LocalEmitter<i32>);
    impl EventEmitter<i32> for Bare {
      fn on(&self, event: &str, listener: Listener<i32>) { self.0.on(event, listener) }
      fn once(&self, event: &str, listener: Listener<i32>) { self.0.once(event, listener) }
      fn prepend_listener(&self, event: &str, listener: Listener<i32>) {
        self.0.prepend_listener(event, listener)
      }
      fn prepend_once_listener(&self, event: &str, listener: Listener<i32>) {
        self.0.prepend_once_listener(event, listener)
      }
      fn remove_listener(&self, event: &str, listener: &Listener<i32>) {
        self.0.remove_listener(event, listener)
      }
      fn emit(&self, event: &str, args: &i32) -> bool { self.0.emit(event, args) }
      fn max_listeners(&self) -> usize { self.0.max_listeners() }
      fn set_max_listeners(&self, n: usize) { self.0.set_max_listeners(n) }
    }

    let indirect = IndirectEmitter::<i32>::with_emitter(Rc::new(Bare(LocalEmitter::new())));
    assert_eq!(indirect.get_dynamic("testProperty"), None);
    assert_eq!(
      indirect.set_dynamic("testProperty", json!(1)),
      Err(EmitterError::UnsupportedProperty { name: "testProperty".into() })
    );
  }

  #[test]
  fn debug_reports_state() {
    let indirect = IndirectEmitter::<i32>::with_max_listeners(3);
    indirect.on("x", |_: &i32| {});
    indirect.emit("x", 1);
    assert_eq!(
      format!("{indirect:?}"),
      "IndirectEmitter { subscriptions: 1, queued: 1, attached: false, max_listeners: 3 }"
    );
  }
}
