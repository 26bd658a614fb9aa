//! # Core Type Definitions
//!
//! This module contains the fundamental identifier types used throughout the
//! sensor event pool. The central type is [`EventKind`], the closed enumeration
//! of telemetry event categories the kernel sensor emits.
//!
//! ## Design Principles
//!
//! - **Closed set**: every pooled record maps to exactly one `EventKind`, and
//!   the set is fixed at compile time. Adding a kind means adding a variant,
//!   a metadata shape, and a factory entry together.
//! - **Type Safety**: the kind is a real enum, not a string or integer, so a
//!   mistyped tag is a compile error rather than a runtime lookup miss.
//! - **Serialization**: kinds serialize for inclusion in exported records.

use serde::{Deserialize, Serialize};

/// Identifies which category of telemetry event a pooled record represents.
///
/// Each variant corresponds to exactly one metadata shape in
/// [`crate::events`] and one entry in the typed event pool registry.
///
/// # Examples
///
/// ```rust
/// use sensor_event_pool::EventKind;
///
/// let kind = EventKind::ProcessCreate;
/// assert_eq!(kind.as_str(), "ProcessCreate");
/// assert!(EventKind::ALL.contains(&kind));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A process was spawned.
    ProcessCreate,
    /// A process exited.
    ProcessTerminate,
    /// An interactive shell read a command line.
    BashReadline,
    /// A system service changed state.
    Service,
    /// An outbound or inbound TCP connection was established.
    TcpConnect,
    /// A TCP connection was torn down.
    TcpDisconnect,
    /// A file was opened, written, or removed.
    FileEvent,
}

impl EventKind {
    /// Every kind the sensor emits, in registry order.
    ///
    /// Useful for building the full pool registry and for exhaustive tests.
    pub const ALL: [EventKind; 7] = [
        EventKind::ProcessCreate,
        EventKind::ProcessTerminate,
        EventKind::BashReadline,
        EventKind::Service,
        EventKind::TcpConnect,
        EventKind::TcpDisconnect,
        EventKind::FileEvent,
    ];

    /// Returns the stable event name used in exported records.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ProcessCreate => "ProcessCreate",
            EventKind::ProcessTerminate => "ProcessTerminate",
            EventKind::BashReadline => "BashReadline",
            EventKind::Service => "Service",
            EventKind::TcpConnect => "TcpConnect",
            EventKind::TcpDisconnect => "TcpDisconnect",
            EventKind::FileEvent => "FileEvent",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
