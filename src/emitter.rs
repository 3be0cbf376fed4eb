//! Backing emitter contract and the crate's own synchronous emitter.
//!
//! [`EventEmitter`] is everything the wrapper needs from whatever object
//! ends up backing it. Methods take `&self`; implementations keep their
//! state behind interior mutability and must release it before invoking
//! listeners, so a listener may call back into the wrapper (or the emitter)
//! while an emission is in progress.

use std::{
  collections::HashSet,
  fmt::{Debug, Formatter},
  rc::Rc,
};

use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::warn;

use crate::{
  config::{default_max_listeners, exceeds_limit},
  error::EmitterError,
  listener::Listener,
  rc::{MutRc, RcDeref, RcDerefMut},
};

/// Shared handle to a backing emitter.
pub type EmitterRef<A> = Rc<dyn EventEmitter<A>>;

/// A multi-listener synchronous event emitter.
pub trait EventEmitter<A> {
  fn on(&self, event: &str, listener: Listener<A>);

  fn once(&self, event: &str, listener: Listener<A>);

  fn prepend_listener(&self, event: &str, listener: Listener<A>);

  fn prepend_once_listener(&self, event: &str, listener: Listener<A>);

  /// Remove the most recently added registration of `listener` for `event`.
  fn remove_listener(&self, event: &str, listener: &Listener<A>);

  /// Invoke every listener of `event` in order. Returns `true` if at least
  /// one listener was invoked.
  fn emit(&self, event: &str, args: &A) -> bool;

  fn max_listeners(&self) -> usize;

  fn set_max_listeners(&self, n: usize);

  /// Read a member that is not part of the emitter contract.
  fn property(&self, _name: &str) -> Option<Value> { None }

  /// Write a member that is not part of the emitter contract.
  fn set_property(&self, name: &str, _value: Value) -> Result<(), EmitterError> {
    Err(EmitterError::UnsupportedProperty { name: name.to_owned() })
  }
}

struct Registration<A> {
  event: String,
  listener: Listener<A>,
  once: bool,
}

struct EmitterState<A> {
  registrations: Vec<Registration<A>>,
  max_listeners: usize,
  warned: HashSet<String>,
  properties: Map<String, Value>,
}

/// Ordered, synchronous [`EventEmitter`] with a free-form property map.
///
/// Listeners fire in registration order; `prepend_*` places a listener in
/// front of the others registered for the same event. Once-listeners are
/// unregistered before they are invoked.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use indirect_emitter::prelude::*;
///
/// let emitter = LocalEmitter::<&str>::new();
/// let log = Rc::new(RefCell::new(vec![]));
///
/// let c_log = log.clone();
/// emitter.on("greet", Listener::new(move |v: &&str| c_log.borrow_mut().push(format!("on {v}"))));
/// let c_log = log.clone();
/// emitter.prepend_once_listener(
///   "greet",
///   Listener::new(move |v: &&str| c_log.borrow_mut().push(format!("first {v}"))),
/// );
///
/// assert!(emitter.emit("greet", &"a"));
/// assert!(emitter.emit("greet", &"b"));
/// assert_eq!(*log.borrow(), vec!["first a", "on a", "on b"]);
/// ```
pub struct LocalEmitter<A> {
  state: MutRc<EmitterState<A>>,
}

impl<A> LocalEmitter<A> {
  pub fn new() -> Self {
    Self {
      state: MutRc::own(EmitterState {
        registrations: Vec::new(),
        max_listeners: default_max_listeners(),
        warned: HashSet::new(),
        properties: Map::new(),
      }),
    }
  }

  /// Attach a free-form member, readable through [`EventEmitter::property`].
  pub fn with_property(self, name: impl Into<String>, value: Value) -> Self {
    self
      .state
      .rc_deref_mut()
      .properties
      .insert(name.into(), value);
    self
  }

  pub fn listener_count(&self, event: &str) -> usize {
    self
      .state
      .rc_deref()
      .registrations
      .iter()
      .filter(|r| r.event == event)
      .count()
  }

  pub fn listeners(&self, event: &str) -> Vec<Listener<A>> {
    self
      .state
      .rc_deref()
      .registrations
      .iter()
      .filter(|r| r.event == event)
      .map(|r| r.listener.clone())
      .collect()
  }

  /// Distinct event names in order of first registration.
  pub fn event_names(&self) -> Vec<String> {
    let state = self.state.rc_deref();
    let mut names: Vec<String> = Vec::new();
    for r in &state.registrations {
      if !names.contains(&r.event) {
        names.push(r.event.clone());
      }
    }
    names
  }

  fn add(&self, event: &str, listener: Listener<A>, once: bool, prepend: bool) {
    let mut state = self.state.rc_deref_mut();
    let registration = Registration { event: event.to_owned(), listener, once };
    if prepend {
      let pos = state
        .registrations
        .iter()
        .position(|r| r.event == event)
        .unwrap_or(0);
      state.registrations.insert(pos, registration);
    } else {
      state.registrations.push(registration);
    }

    let count = state
      .registrations
      .iter()
      .filter(|r| r.event == event)
      .count();
    if exceeds_limit(count, state.max_listeners) && state.warned.insert(event.to_owned()) {
      warn!(
        event,
        count,
        max_listeners = state.max_listeners,
        "possible listener leak detected on backing emitter"
      );
    }
  }
}

impl<A> Default for LocalEmitter<A> {
  fn default() -> Self { Self::new() }
}

impl<A> EventEmitter<A> for LocalEmitter<A> {
  #[inline]
  fn on(&self, event: &str, listener: Listener<A>) { self.add(event, listener, false, false) }

  #[inline]
  fn once(&self, event: &str, listener: Listener<A>) { self.add(event, listener, true, false) }

  #[inline]
  fn prepend_listener(&self, event: &str, listener: Listener<A>) {
    self.add(event, listener, false, true)
  }

  #[inline]
  fn prepend_once_listener(&self, event: &str, listener: Listener<A>) {
    self.add(event, listener, true, true)
  }

  fn remove_listener(&self, event: &str, listener: &Listener<A>) {
    let mut state = self.state.rc_deref_mut();
    if let Some(pos) = state
      .registrations
      .iter()
      .rposition(|r| r.event == event && r.listener == *listener)
    {
      state.registrations.remove(pos);
    }
  }

  fn emit(&self, event: &str, args: &A) -> bool {
    // Snapshot first: listeners may register or remove listeners on this
    // emitter while it dispatches.
    let snapshot: SmallVec<[Listener<A>; 4]> = {
      let mut state = self.state.rc_deref_mut();
      let snapshot = state
        .registrations
        .iter()
        .filter(|r| r.event == event)
        .map(|r| r.listener.clone())
        .collect();
      state
        .registrations
        .retain(|r| !(r.once && r.event == event));
      snapshot
    };

    for listener in &snapshot {
      listener.call(args);
    }
    !snapshot.is_empty()
  }

  #[inline]
  fn max_listeners(&self) -> usize { self.state.rc_deref().max_listeners }

  #[inline]
  fn set_max_listeners(&self, n: usize) { self.state.rc_deref_mut().max_listeners = n; }

  fn property(&self, name: &str) -> Option<Value> {
    self.state.rc_deref().properties.get(name).cloned()
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), EmitterError> {
    self
      .state
      .rc_deref_mut()
      .properties
      .insert(name.to_owned(), value);
    Ok(())
  }
}

impl<A> Debug for LocalEmitter<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.state.rc_deref();
    f.debug_struct("LocalEmitter")
      .field("registrations", &state.registrations.len())
      .field("max_listeners", &state.max_listeners)
      .field("properties", &state.properties.len())
      .finish()
  }
}
