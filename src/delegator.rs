//! Emission buffering while detached, and the member table that decides
//! whether a dynamic member belongs to the wrapper or to the emitter.

use std::collections::VecDeque;

/// An emission recorded while no emitter was attached.
pub(crate) struct QueuedEmission<A> {
  pub(crate) event: String,
  pub(crate) args: A,
}

/// FIFO of emissions awaiting the next attach.
pub(crate) struct Delegator<A> {
  queue: VecDeque<QueuedEmission<A>>,
}

impl<A> Default for Delegator<A> {
  fn default() -> Self { Self { queue: VecDeque::new() } }
}

impl<A> Delegator<A> {
  #[inline]
  pub(crate) fn enqueue(&mut self, event: &str, args: A) {
    self
      .queue
      .push_back(QueuedEmission { event: event.to_owned(), args });
  }

  /// Take the whole buffer. Emissions queued while the snapshot replays land
  /// in a fresh buffer.
  #[inline]
  pub(crate) fn drain(&mut self) -> VecDeque<QueuedEmission<A>> { std::mem::take(&mut self.queue) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.queue.len() }
}

/// Dynamic members owned by the wrapper itself. Every other name is
/// forwarded to the attached emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnMember {
  MaxListeners,
}

impl OwnMember {
  pub(crate) fn parse(name: &str) -> Option<Self> {
    match name {
      "maxListeners" => Some(Self::MaxListeners),
      _ => None,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn drain_preserves_arrival_order() {
    let mut delegator = Delegator::default();
    delegator.enqueue("a", 1);
    delegator.enqueue("b", 2);
    delegator.enqueue("a", 3);
    assert_eq!(delegator.len(), 3);

    let drained: Vec<_> = delegator
      .drain()
      .into_iter()
      .map(|q| (q.event, q.args))
      .collect();
    assert_eq!(drained, vec![("a".to_owned(), 1), ("b".to_owned(), 2), ("a".to_owned(), 3)]);
    assert_eq!(delegator.len(), 0);
  }

  #[test]
  fn own_members() {
    assert_eq!(OwnMember::parse("maxListeners"), Some(OwnMember::MaxListeners));
    assert_eq!(OwnMember::parse("testProperty"), None);
  }
}
