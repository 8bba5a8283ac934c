//! One-shot deferred events, drained by the control loop once per tick.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct Pending<E> {
    fire_at_ms: u64,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Pending<E> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_ms == other.fire_at_ms && self.seq == other.seq
    }
}

impl<E> Eq for Pending<E> {}

impl<E> PartialOrd for Pending<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Pending<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at_ms, self.seq).cmp(&(other.fire_at_ms, other.seq))
    }
}

/// Priority queue of `(fire time, event)` pairs.
///
/// Events with equal fire times come out in registration order. Each event
/// is returned by [`DeferredQueue::drain_due`] exactly once.
#[derive(Debug)]
pub struct DeferredQueue<E> {
    heap: BinaryHeap<Reverse<Pending<E>>>,
    next_seq: u64,
}

impl<E: Debug> DeferredQueue<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Registers `event` to fire `delay` after `now_ms`
    pub fn schedule(&mut self, now_ms: u64, delay: Duration, event: E) {
        let fire_at_ms = now_ms.saturating_add(delay.as_millis() as u64);
        debug!(?event, fire_at_ms, "deferred event scheduled");
        self.heap.push(Reverse(Pending {
            fire_at_ms,
            seq: self.next_seq,
            event,
        }));
        self.next_seq += 1;
    }

    /// Removes and returns every event due at `now_ms`, earliest first
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<E> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.heap.peek() {
            if next.fire_at_ms > now_ms {
                break;
            }
            if let Some(Reverse(pending)) = self.heap.pop() {
                due.push(pending.event);
            }
        }
        due
    }

    pub fn next_fire_ms(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(p)| p.fire_at_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending event
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<E: Debug> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_fires_before_its_time() {
        let mut queue = DeferredQueue::new();
        queue.schedule(100, Duration::from_millis(500), "cue");
        assert!(queue.drain_due(599).is_empty());
        assert_eq!(queue.drain_due(600), vec!["cue"]);
        assert!(queue.drain_due(10_000).is_empty());
    }

    #[test]
    fn due_events_come_out_in_fire_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0, Duration::from_secs(6), "trial window");
        queue.schedule(0, Duration::from_secs(2), "success window");
        queue.schedule(0, Duration::from_secs(2), "second at two");
        assert_eq!(queue.next_fire_ms(), Some(2000));
        assert_eq!(
            queue.drain_due(6000),
            vec!["success window", "second at two", "trial window"]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_drops_pending_events() {
        let mut queue = DeferredQueue::new();
        queue.schedule(0, Duration::from_secs(1), 1u8);
        queue.schedule(0, Duration::from_secs(2), 2u8);
        assert_eq!(queue.len(), 2);
        queue.clear();
        assert!(queue.drain_due(u64::MAX).is_empty());
    }
}
