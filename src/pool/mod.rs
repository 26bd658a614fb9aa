//! Object pooling subsystem - typed event records and scratch buffers
//!
//! Producers on the capture hot path allocate a zeroed record of a given
//! [`crate::EventKind`] from the [`EventPool`], fill it, hand it to the log
//! builder, and free it back. Rendering borrows byte buffers from the
//! [`BufferPool`] for the duration of a single render. Both pools are safe
//! for concurrent use from arbitrarily many threads with no external locking.

mod buffer_pool;
mod event_pool;

pub use buffer_pool::BufferPool;
pub use event_pool::EventPool;

use crate::types::EventKind;
use thiserror::Error;

/// Errors surfaced by the typed event pool.
///
/// Every error is returned to the immediate caller; the pool never retries
/// internally and stays fully usable after any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Allocate or free referenced a kind with no entry in the registry.
    #[error("event kind '{0}' not found in pool")]
    UnknownEventType(EventKind),
    /// Free was called with a record whose own kind disagrees with the
    /// stated kind. The record is discarded, never inserted into any pool.
    #[error("event kind mismatch: pool entry is '{expected}', record is '{actual}'")]
    TypeMismatch {
        /// The kind the caller claimed.
        expected: EventKind,
        /// The kind the record actually carries.
        actual: EventKind,
    },
}
