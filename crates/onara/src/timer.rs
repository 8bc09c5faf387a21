//! # Timer Queue
//!
//! Deterministic delayed actions. Times are offsets from the session epoch,
//! so a test can drive the queue with plain `Duration`s.
//!
//! Ordering is by due time, then by scheduling order: two actions due at
//! the same instant fire first-in first-out.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<T> {
    due: Duration,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed: BinaryHeap is a max-heap, we want the earliest on top
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Min-heap of `(due, seq, item)`.
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `item` at `due`.
    pub fn schedule(&mut self, due: Duration, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, item });
    }

    /// Removes and returns the earliest item if it is due at `now`.
    pub fn pop_next_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| (e.due, e.item))
    }

    /// Removes and returns every item due at `now`, in order.
    pub fn pop_due(&mut self, now: Duration) -> Vec<(Duration, T)> {
        let mut due = Vec::new();
        while let Some(entry) = self.pop_next_due(now) {
            due.push(entry);
        }
        due
    }

    /// Due time of the earliest item.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|e| e.due)
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending item.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TimerQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("len", &self.heap.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pops_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(30), "c");
        q.schedule(ms(10), "a");
        q.schedule(ms(20), "b");

        let items: Vec<_> = q.pop_due(ms(100)).into_iter().map(|(_, i)| i).collect();
        assert_eq!(items, vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_fifo_on_ties() {
        let mut q = TimerQueue::new();
        for i in 0..5 {
            q.schedule(ms(50), i);
        }
        let items: Vec<_> = q.pop_due(ms(50)).into_iter().map(|(_, i)| i).collect();
        assert_eq!(items, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_not_yet_due_stays() {
        let mut q = TimerQueue::new();
        q.schedule(ms(10), 1);
        q.schedule(ms(40), 2);

        assert_eq!(q.pop_due(ms(9)).len(), 0);
        assert_eq!(q.pop_due(ms(10)), vec![(ms(10), 1)]);
        assert_eq!(q.next_due(), Some(ms(40)));
        assert_eq!(q.len(), 1);

        q.clear();
        assert_eq!(q.next_due(), None);
    }
}
