//! Typed event pool registry.
//!
//! One reuse pool per event kind, built once from the event model's factory
//! table. Steady state is read-only registry lookups plus lock-free idle-queue
//! traffic, so allocate and free complete in bounded time and never touch I/O.

use super::PoolError;
use crate::events::{self, EventFactory, PooledEvent};
use crate::types::EventKind;
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use tracing::{debug, warn};

/// Per-kind reuse container: the idle records of one shape plus the factory
/// used to mint a new one when the idle set is empty.
struct PoolEntry {
    idle: SegQueue<Box<dyn PooledEvent>>,
    factory: EventFactory,
}

impl PoolEntry {
    fn new(factory: EventFactory) -> Self {
        Self {
            idle: SegQueue::new(),
            factory,
        }
    }
}

/// Registry of per-kind event pools.
///
/// Hands out zero-equivalent records keyed by [`EventKind`] and reclaims them
/// after export. Entries are inserted only during construction; afterwards the
/// kind → entry mapping is read-only and lookups take no lock a caller can
/// contend on beyond the map shard's read path.
///
/// # Thread Safety
///
/// Fully thread-safe: share it as `Arc<EventPool>` across producers and
/// exporters. A record freed by one thread may be immediately reused by
/// another; exclusivity holds only between `allocate` and the matching
/// `free`, during which the holder has the record to itself.
///
/// # Examples
///
/// ```rust
/// use sensor_event_pool::{EventKind, EventPool, PooledEvent};
///
/// let pool = EventPool::new();
/// let mut event = pool.allocate(EventKind::ProcessCreate)?;
/// event.header_mut().source = "eBPF".to_string();
/// // ... fill, render, export ...
/// pool.free(EventKind::ProcessCreate, event)?;
/// # Ok::<(), sensor_event_pool::PoolError>(())
/// ```
pub struct EventPool {
    entries: DashMap<EventKind, PoolEntry>,
}

impl EventPool {
    /// Builds the registry from the event model's full factory table.
    ///
    /// One-time setup; not intended to run concurrently with itself. Call it
    /// once at process start and share the result.
    pub fn new() -> Self {
        Self::from_factories(events::factory_table())
    }

    /// Builds a registry from an explicit kind → factory table.
    ///
    /// Lets tests construct an isolated registry, including partial ones
    /// that deliberately omit kinds.
    pub fn from_factories(table: impl IntoIterator<Item = (EventKind, EventFactory)>) -> Self {
        let entries = DashMap::new();
        for (kind, factory) in table {
            entries.insert(kind, PoolEntry::new(factory));
        }
        debug!(kinds = entries.len(), "event pool registry built");
        Self { entries }
    }

    /// Retrieves a zero-equivalent record of the given kind.
    ///
    /// Returns an idle record if one exists, otherwise mints a new one via
    /// the kind's factory. Recycled records were reset when freed, so callers
    /// may assume zero-equivalent fields either way.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownEventType`] if `kind` has no registry entry.
    pub fn allocate(&self, kind: EventKind) -> Result<Box<dyn PooledEvent>, PoolError> {
        let entry = self
            .entries
            .get(&kind)
            .ok_or(PoolError::UnknownEventType(kind))?;
        Ok(entry.idle.pop().unwrap_or_else(|| (entry.factory)()))
    }

    /// Returns a record to the pool for the given kind.
    ///
    /// The record is reset and becomes available to a future `allocate` of
    /// the same kind. Taking the record by value means a caller cannot free
    /// it twice or touch it afterwards.
    ///
    /// # Errors
    ///
    /// [`PoolError::UnknownEventType`] if `kind` has no registry entry.
    /// [`PoolError::TypeMismatch`] if the record's own kind disagrees with
    /// `kind`; the record is dropped rather than inserted into the wrong
    /// pool.
    pub fn free(&self, kind: EventKind, mut event: Box<dyn PooledEvent>) -> Result<(), PoolError> {
        let entry = self
            .entries
            .get(&kind)
            .ok_or(PoolError::UnknownEventType(kind))?;
        let actual = event.kind();
        if actual != kind {
            warn!(expected = %kind, %actual, "rejected free of mismatched event record");
            return Err(PoolError::TypeMismatch {
                expected: kind,
                actual,
            });
        }
        event.reset();
        entry.idle.push(event);
        Ok(())
    }

    /// Number of idle records currently held for `kind`.
    ///
    /// Zero for unknown kinds. Intended for tests and monitoring; the value
    /// is momentary under concurrent traffic.
    pub fn idle_count(&self, kind: EventKind) -> usize {
        self.entries.get(&kind).map_or(0, |entry| entry.idle.len())
    }
}

impl Default for EventPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPool")
            .field("kinds", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ProcessCreateEvent, TcpConnectEvent};
    use std::sync::Arc;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sensor_event_pool=debug")
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn allocate_returns_record_of_requested_shape() {
        let pool = EventPool::new();
        let event = pool.allocate(EventKind::ProcessCreate).unwrap();

        assert_eq!(event.kind(), EventKind::ProcessCreate);
        assert!(event.as_any().is::<ProcessCreateEvent>());
        pool.free(EventKind::ProcessCreate, event).unwrap();
    }

    #[test]
    fn allocate_unknown_kind_fails() {
        // partial registry that deliberately leaves FileEvent out
        let pool = EventPool::from_factories(
            events::factory_table()
                .into_iter()
                .filter(|(kind, _)| *kind != EventKind::FileEvent),
        );

        let err = pool.allocate(EventKind::FileEvent).unwrap_err();
        assert_eq!(err, PoolError::UnknownEventType(EventKind::FileEvent));
    }

    #[test]
    fn free_unknown_kind_fails() {
        let pool = EventPool::from_factories(
            events::factory_table()
                .into_iter()
                .filter(|(kind, _)| *kind != EventKind::Service),
        );

        let event: Box<dyn PooledEvent> = Box::<crate::events::ServiceEvent>::default();
        let err = pool.free(EventKind::Service, event).unwrap_err();
        assert_eq!(err, PoolError::UnknownEventType(EventKind::Service));
    }

    #[test]
    fn cross_kind_free_is_rejected_and_pools_unchanged() {
        init_tracing();
        let pool = EventPool::new();
        let event = pool.allocate(EventKind::ProcessCreate).unwrap();

        let err = pool.free(EventKind::TcpConnect, event).unwrap_err();
        assert_eq!(
            err,
            PoolError::TypeMismatch {
                expected: EventKind::TcpConnect,
                actual: EventKind::ProcessCreate,
            }
        );
        for kind in EventKind::ALL {
            assert_eq!(pool.idle_count(kind), 0, "idle set for {kind} changed");
        }
    }

    #[test]
    fn freed_record_is_reused_and_zeroed() {
        let pool = EventPool::new();

        let mut event = pool.allocate(EventKind::TcpConnect).unwrap();
        {
            let tcp = event
                .as_any_mut()
                .downcast_mut::<TcpConnectEvent>()
                .unwrap();
            tcp.header.source = "eBPF".to_string();
            tcp.metadata.pid = 777;
            tcp.metadata.daddr = "10.0.0.1".to_string();
        }
        pool.free(EventKind::TcpConnect, event).unwrap();
        assert_eq!(pool.idle_count(EventKind::TcpConnect), 1);

        let event = pool.allocate(EventKind::TcpConnect).unwrap();
        assert_eq!(pool.idle_count(EventKind::TcpConnect), 0);
        let tcp = event.as_any().downcast_ref::<TcpConnectEvent>().unwrap();
        assert!(tcp.header.source.is_empty());
        assert_eq!(tcp.metadata.pid, 0);
        assert!(tcp.metadata.daddr.is_empty());
        pool.free(EventKind::TcpConnect, event).unwrap();
    }

    #[test]
    fn repeated_round_trips_do_not_grow_the_idle_set() {
        let pool = EventPool::new();
        for _ in 0..1000 {
            let event = pool.allocate(EventKind::BashReadline).unwrap();
            pool.free(EventKind::BashReadline, event).unwrap();
        }
        assert_eq!(pool.idle_count(EventKind::BashReadline), 1);
    }

    #[test]
    fn lost_record_does_not_corrupt_the_pool() {
        let pool = EventPool::new();
        let event = pool.allocate(EventKind::FileEvent).unwrap();
        drop(event); // never freed; only costs the allocation

        let event = pool.allocate(EventKind::FileEvent).unwrap();
        pool.free(EventKind::FileEvent, event).unwrap();
        assert_eq!(pool.idle_count(EventKind::FileEvent), 1);
    }

    #[test]
    fn concurrent_allocate_free_on_one_kind() {
        init_tracing();
        const WORKERS: usize = 10;
        const CYCLES: usize = 100_000;

        let pool = Arc::new(EventPool::new());
        let mut handles = Vec::with_capacity(WORKERS);
        for _ in 0..WORKERS {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                for _ in 0..CYCLES {
                    let event = pool
                        .allocate(EventKind::ProcessCreate)
                        .expect("allocate failed under contention");
                    pool.free(EventKind::ProcessCreate, event)
                        .expect("free failed under contention");
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        // pool is still usable and holds at most one idle record per worker
        let event = pool.allocate(EventKind::ProcessCreate).unwrap();
        pool.free(EventKind::ProcessCreate, event).unwrap();
        assert!(pool.idle_count(EventKind::ProcessCreate) <= WORKERS);
    }

    #[test]
    fn concurrent_unknown_kind_always_fails() {
        let pool = Arc::new(EventPool::from_factories(
            events::factory_table()
                .into_iter()
                .filter(|(kind, _)| *kind != EventKind::TcpDisconnect),
        ));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    assert!(pool.allocate(EventKind::TcpDisconnect).is_err());
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked");
        }
    }
}
