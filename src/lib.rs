//! # indirect_emitter: deferred-binding event emitters
//!
//! An [`IndirectEmitter`] exposes the whole listener contract (`on`, `once`,
//! `prepend_listener`, `remove_listener`, max-listener limits, ...) before any
//! real emitter exists. A backing [`EventEmitter`] can be attached later,
//! swapped at runtime, or removed again; the wrapper keeps its own record of
//! every subscription and re-registers them on whichever emitter is current.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use indirect_emitter::prelude::*;
//!
//! let indirect = IndirectEmitter::<String>::new();
//! let log = Rc::new(RefCell::new(vec![]));
//! let c_log = log.clone();
//! indirect.on("msg", Listener::new(move |m: &String| c_log.borrow_mut().push(m.clone())));
//!
//! // Buffered until something backs the wrapper.
//! indirect.emit("msg", "early".to_owned());
//!
//! let a: EmitterRef<String> = Rc::new(LocalEmitter::new());
//! let b: EmitterRef<String> = Rc::new(LocalEmitter::new());
//! indirect.set_emitter(Some(a.clone()));
//! indirect.set_emitter(Some(b.clone()));
//!
//! a.emit("msg", &"ignored".to_owned());
//! b.emit("msg", &"late".to_owned());
//! assert_eq!(*log.borrow(), vec!["early", "late"]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`IndirectEmitter`] | The wrapper: registry, binder and delegator in one handle |
//! | [`EventEmitter`] | What a backing emitter must provide |
//! | [`LocalEmitter`] | A ready-made synchronous backing emitter |
//! | [`Listener`] | Callback handle compared by identity |
//!
//! Dynamic members are reached through [`IndirectEmitter::get_dynamic`] and
//! [`IndirectEmitter::set_dynamic`]; static access is limited to the
//! wrapper's declared methods.
//!
//! [`IndirectEmitter`]: indirect::IndirectEmitter
//! [`EventEmitter`]: emitter::EventEmitter
//! [`LocalEmitter`]: emitter::LocalEmitter
//! [`Listener`]: listener::Listener

pub mod config;
pub mod emitter;
pub mod error;
pub mod indirect;
pub mod listener;
pub mod prelude;
pub mod rc;

mod binder;
mod delegator;
mod registry;

pub use prelude::*;
