//! Prelude module for convenient imports

pub use crate::{
  config::{default_max_listeners, set_default_max_listeners, DEFAULT_MAX_LISTENERS},
  emitter::{EmitterRef, EventEmitter, LocalEmitter},
  error::EmitterError,
  indirect::IndirectEmitter,
  listener::Listener,
};
