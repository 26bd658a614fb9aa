//! # Sensor Event Pool
//!
//! Allocation-reuse layer for a kernel-sensor telemetry pipeline. Events
//! (process, network, file, and shell activity) arrive at high frequency on
//! the capture hot path, so records are recycled through typed pools instead
//! of being allocated per event.
//!
//! ## Core Features
//!
//! - **Typed Event Pool**: one reuse pool per event kind, built once from the
//!   event model's factory table; allocate-by-kind and free with kind/shape
//!   consistency enforced
//! - **Self-Describing Records**: every pooled record reports its own
//!   [`EventKind`], so a cross-kind free is rejected instead of poisoning a
//!   pool with the wrong shape
//! - **Buffer Pool**: shared scratch buffers for building the serialized
//!   record, reset between uses with capacity retained
//! - **Log Builder**: validates fields, stamps or validates RFC3339
//!   timestamps, and renders the unified record as a single line or pretty
//!   JSON
//! - **Thread Safety**: all pools are safe for unbounded concurrent
//!   producers and exporters with no external locking
//!
//! ## Data Flow
//!
//! A producer allocates a zeroed record of a given kind, fills header and
//! metadata, hands it to the log builder for rendering, and frees it back to
//! the pool. Scratch buffers flow the same way, borrowed for one render and
//! returned reset.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use sensor_event_pool::{create_event_pool, EventKind, LogBuilder, PooledEvent};
//! use sensor_event_pool::events::ProcessCreateEvent;
//! use chrono::Utc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_event_pool();
//! let builder = LogBuilder::new();
//!
//! // Producer: allocate and fill a record
//! let mut event = pool.allocate(EventKind::ProcessCreate)?;
//! {
//!     let header = event.header_mut();
//!     header.event_name = EventKind::ProcessCreate.as_str().to_string();
//!     header.source = "eBPF".to_string();
//!     header.timestamp = Utc::now();
//! }
//! let record = event
//!     .as_any_mut()
//!     .downcast_mut::<ProcessCreateEvent>()
//!     .expect("allocated shape matches the kind");
//! record.metadata.pid = 1234;
//! record.metadata.commandline = "bash rm -rf /tmp".to_string();
//!
//! // Exporter: render and reclaim
//! let log = builder.build_from_event(event.as_ref(), "process spawned")?;
//! println!("{}", builder.render_line(&log)?);
//! pool.free(EventKind::ProcessCreate, event)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod builder;
pub mod events;
pub mod pool;
pub mod types;

pub use builder::{parse_timestamp, LogBuildError, LogBuilder, LogRecord};
pub use events::{EventFactory, EventHeader, PooledEvent};
pub use pool::{BufferPool, EventPool, PoolError};
pub use types::EventKind;

/// Creates a new event pool registry covering every kind the sensor emits.
///
/// This is the standard way to create an event pool for production use.
/// The pool is wrapped in an `Arc` so it can be shared across producer and
/// exporter threads.
///
/// # Returns
///
/// A new `Arc<EventPool>` ready for use.
pub fn create_event_pool() -> Arc<EventPool> {
    Arc::new(EventPool::new())
}

// ============================================================================
// Integration Test Suite
// ============================================================================
