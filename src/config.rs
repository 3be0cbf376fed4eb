//! Process-wide default for the max-listener limit.
//!
//! The default is read once when a wrapper or [`LocalEmitter`] is
//! constructed; changing it afterwards has no effect on existing instances.
//!
//! [`LocalEmitter`]: crate::emitter::LocalEmitter

use once_cell::sync::OnceCell;

use crate::error::EmitterError;

/// The conventional per-event listener cap before a leak warning.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

static DEFAULT_OVERRIDE: OnceCell<usize> = OnceCell::new();

/// Override [`DEFAULT_MAX_LISTENERS`] for the rest of the process.
///
/// May be called at most once. A value of `0` disables the limit.
pub fn set_default_max_listeners(n: usize) -> Result<(), EmitterError> {
  DEFAULT_OVERRIDE
    .set(n)
    .map_err(|_| EmitterError::DefaultAlreadySet { current: default_max_listeners() })
}

#[inline]
pub fn default_max_listeners() -> usize {
  DEFAULT_OVERRIDE
    .get()
    .copied()
    .unwrap_or(DEFAULT_MAX_LISTENERS)
}

/// `true` when `count` listeners for one event exceed a non-zero `limit`.
#[inline]
pub(crate) fn exceeds_limit(count: usize, limit: usize) -> bool { limit > 0 && count > limit }

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn zero_limit_is_unlimited() {
    assert!(!exceeds_limit(1_000, 0));
    assert!(!exceeds_limit(10, 10));
    assert!(exceeds_limit(11, 10));
  }
}
