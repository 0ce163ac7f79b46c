//! Per-interval byte buckets with lazy growth.

/// Circular buffer of byte counts, one bucket per tick interval.
///
/// Starts with `len` live buckets and grows by one per [`advance`](Self::advance)
/// until it reaches `capacity`, after which it wraps and reuses the oldest bucket.
#[derive(Debug, Clone)]
pub(crate) struct RateRing {
    slots: Box<[u64]>,
    len: usize,
    cursor: usize,
}

impl RateRing {
    pub(crate) fn new(initial_len: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            len: initial_len.clamp(1, capacity),
            cursor: 0,
        }
    }

    /// Add `n` bytes to the current bucket.
    pub(crate) fn record(&mut self, n: u64) {
        let slot = &mut self.slots[self.cursor];
        *slot = slot.saturating_add(n);
    }

    /// Mean bytes per live bucket (integer division).
    pub(crate) fn mean(&self) -> u64 {
        let sum: u64 = self.slots[..self.len].iter().sum();
        sum / self.len as u64
    }

    /// Move to the next bucket, growing if below capacity, and zero it.
    pub(crate) fn advance(&mut self) {
        if self.len < self.slots.len() {
            self.len += 1;
        }
        self.cursor = (self.cursor + 1) % self.len;
        self.slots[self.cursor] = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_one_slot_per_advance_until_capacity() {
        let mut ring = RateRing::new(1, 3);
        assert_eq!(ring.len(), 1);
        ring.advance();
        assert_eq!((ring.len(), ring.cursor()), (2, 1));
        ring.advance();
        assert_eq!((ring.len(), ring.cursor()), (3, 2));
        ring.advance();
        assert_eq!((ring.len(), ring.cursor()), (3, 0));
        assert_eq!(ring.capacity(), 3);
    }

    #[test]
    fn mean_covers_live_slots_only() {
        let mut ring = RateRing::new(1, 4);
        ring.record(100);
        assert_eq!(ring.mean(), 100);
        ring.advance();
        ring.record(300);
        assert_eq!(ring.mean(), 200);
    }

    #[test]
    fn wrapping_zeroes_reused_slot() {
        let mut ring = RateRing::new(2, 2);
        ring.record(10);
        ring.advance();
        ring.record(30);
        assert_eq!(ring.mean(), 20);
        ring.advance();
        assert_eq!(ring.cursor(), 0);
        assert_eq!(ring.mean(), 15);
    }

    #[test]
    fn initial_len_is_clamped() {
        assert_eq!(RateRing::new(0, 4).len(), 1);
        assert_eq!(RateRing::new(9, 4).len(), 4);
        assert_eq!(RateRing::new(3, 0).capacity(), 1);
    }
}
