//! Scratch-buffer pool for record rendering.
//!
//! Buffers carry no type tag; a single shared idle set serves every render.
//! A buffer is borrowed for the duration of one render and comes back reset,
//! so logical length is always zero on the way out of the pool.

use crossbeam::queue::SegQueue;

/// Starting capacity of a freshly minted scratch buffer.
const SCRATCH_CAPACITY: usize = 4096;

/// Buffers grown past this are shrunk back before re-entering the idle set,
/// so one oversized render does not pin memory forever.
const SHRINK_THRESHOLD: usize = 64 * 1024;

/// Pool of reusable byte buffers used as scratch space while serializing a
/// log record.
///
/// Concurrency-safe under the same model as the event pool: any number of
/// threads may call [`get`](BufferPool::get) and [`put`](BufferPool::put)
/// with no external locking.
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: SegQueue<Vec<u8>>,
}

impl BufferPool {
    /// Creates an empty pool. Buffers are minted lazily on first use.
    pub fn new() -> Self {
        Self {
            idle: SegQueue::new(),
        }
    }

    /// Returns an idle buffer with retained capacity, or a new buffer with
    /// the starting capacity if none is idle. The returned buffer always has
    /// zero logical length.
    pub fn get(&self) -> Vec<u8> {
        self.idle
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(SCRATCH_CAPACITY))
    }

    /// Resets the buffer and returns it to the idle set.
    ///
    /// Capacity is retained unless the buffer grew past the shrink
    /// threshold, in which case it is trimmed back to the starting capacity.
    pub fn put(&self, mut buf: Vec<u8>) {
        buf.clear();
        if buf.capacity() > SHRINK_THRESHOLD {
            buf.shrink_to(SCRATCH_CAPACITY);
        }
        self.idle.push(buf);
    }

    /// Number of buffers currently idle. Momentary under concurrent traffic.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_put_has_zero_length_and_retained_capacity() {
        let pool = BufferPool::new();
        let mut buf = pool.get();
        buf.extend_from_slice(b"{\"eventname\":\"ProcessCreate\"}");
        let capacity = buf.capacity();
        pool.put(buf);

        let buf = pool.get();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn round_trips_never_grow_the_idle_set_past_k() {
        let pool = BufferPool::new();
        for _ in 0..100 {
            let buf = pool.get();
            pool.put(buf);
        }
        assert_eq!(pool.idle_len(), 1);

        // K buffers out at once leaves at most K idle afterwards
        let held: Vec<_> = (0..8).map(|_| pool.get()).collect();
        for buf in held {
            pool.put(buf);
        }
        assert!(pool.idle_len() <= 8);
    }

    #[test]
    fn oversized_buffers_are_shrunk_on_put() {
        let pool = BufferPool::new();
        let mut buf = pool.get();
        buf.resize(SHRINK_THRESHOLD * 2, 0);
        pool.put(buf);

        let buf = pool.get();
        assert!(buf.capacity() <= SHRINK_THRESHOLD);
    }
}
