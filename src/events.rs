//! # Event Model
//!
//! Concrete record shapes for every telemetry event the kernel sensor emits,
//! plus the [`PooledEvent`] capability trait that makes records self-describing
//! so the typed pool can dispatch on a record's own kind instead of downcasting
//! blindly.
//!
//! Every event is a [`EventHeader`] (name, source, timestamp) plus one
//! kind-specific metadata payload. Field names serialize in PascalCase to match
//! the exporter's record format.
//!
//! The [`factory_table`] at the bottom is the one-time kind → constructor table
//! the pool registry is built from; it is the only coupling between the model
//! and the pool.

use crate::types::EventKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;

// ============================================================================
// Common Header
// ============================================================================

/// Common header carried by every event record.
///
/// Producers fill all three fields before handing the record to the log
/// builder. A freshly allocated record carries empty strings and the Unix
/// epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventHeader {
    /// Stable event name, e.g. "ProcessCreate".
    pub event_name: String,
    /// Capture source, e.g. "eBPF".
    pub source: String,
    /// When the sensor observed the event.
    pub timestamp: DateTime<Utc>,
}

impl Default for EventHeader {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            source: String::new(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl EventHeader {
    /// Clears the header back to its zero-equivalent state, keeping the
    /// string capacities for reuse.
    pub fn reset(&mut self) {
        self.event_name.clear();
        self.source.clear();
        self.timestamp = DateTime::<Utc>::UNIX_EPOCH;
    }
}

// ============================================================================
// Metadata Shapes
// ============================================================================

/// Metadata for process creation events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessCreateMetadata {
    /// Process id of the new process.
    pub pid: i64,
    /// Parent process id.
    pub ppid: i64,
    /// Owning user id.
    pub uid: i64,
    /// Resolved user name.
    pub username: String,
    /// Thread group id.
    pub tgid: i64,
    /// Full command line, e.g. "bash rm -rf /tmp".
    pub commandline: String,
    /// Environment at spawn time.
    pub env: String,
    /// Executable image path, e.g. "/usr/bin/bash".
    pub image: String,
}

impl ProcessCreateMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.ppid = 0;
        self.uid = 0;
        self.username.clear();
        self.tgid = 0;
        self.commandline.clear();
        self.env.clear();
        self.image.clear();
    }
}

/// Metadata for process termination events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessTerminateMetadata {
    /// Process id of the exiting process.
    pub pid: i64,
    /// Exit code.
    pub ret: i32,
    /// Owning user id.
    pub uid: i64,
    /// Resolved user name.
    pub username: String,
}

impl ProcessTerminateMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.ret = 0;
        self.uid = 0;
        self.username.clear();
    }
}

/// Metadata for interactive shell readline events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BashReadlineMetadata {
    /// Process id of the shell.
    pub pid: i64,
    /// The command line the shell read.
    pub commandline: String,
    /// Owning user id.
    pub uid: i64,
    /// Resolved user name.
    pub username: String,
}

impl BashReadlineMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.commandline.clear();
        self.uid = 0;
        self.username.clear();
    }
}

/// Metadata for system service state changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceMetadata {
    /// Service name, e.g. "sshd".
    pub name: String,
    /// What happened to the service, e.g. "start", "stop", "reload".
    pub action: String,
    /// Unit file path backing the service.
    pub unit_path: String,
    /// Main process id of the service, if running.
    pub pid: i64,
}

impl ServiceMetadata {
    fn reset(&mut self) {
        self.name.clear();
        self.action.clear();
        self.unit_path.clear();
        self.pid = 0;
    }
}

/// Metadata for TCP connection establishment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TcpConnectMetadata {
    /// Process id that opened the connection.
    pub pid: i64,
    /// Source address.
    pub saddr: String,
    /// Destination address.
    pub daddr: String,
    /// Source port.
    pub sport: u16,
    /// Destination port.
    pub dport: u16,
    /// Resolved user name.
    pub username: String,
}

impl TcpConnectMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.saddr.clear();
        self.daddr.clear();
        self.sport = 0;
        self.dport = 0;
        self.username.clear();
    }
}

/// Metadata for TCP connection teardown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TcpDisconnectMetadata {
    /// Process id that held the connection.
    pub pid: i64,
    /// Source address.
    pub saddr: String,
    /// Destination address.
    pub daddr: String,
    /// Source port.
    pub sport: u16,
    /// Destination port.
    pub dport: u16,
}

impl TcpDisconnectMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.saddr.clear();
        self.daddr.clear();
        self.sport = 0;
        self.dport = 0;
    }
}

/// Metadata for file activity events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileEventMetadata {
    /// Process id that touched the file.
    pub pid: i64,
    /// Owning user id.
    pub uid: i64,
    /// Absolute path of the file.
    pub path: String,
    /// Operation performed, e.g. "open", "write", "unlink".
    pub operation: String,
    /// Resolved user name.
    pub username: String,
}

impl FileEventMetadata {
    fn reset(&mut self) {
        self.pid = 0;
        self.uid = 0;
        self.path.clear();
        self.operation.clear();
        self.username.clear();
    }
}

// ============================================================================
// Pooled Event Trait
// ============================================================================

/// Capability trait for records that circulate through the typed event pool.
///
/// Records are self-describing: the pool recovers a record's kind from the
/// record itself via [`PooledEvent::kind`] and rejects a free whose stated
/// kind disagrees, instead of trusting an unchecked downcast.
///
/// # Safety
///
/// Records must be `Send` because a record freed by one thread may be handed
/// to a different thread on the next allocation. They are never shared:
/// between `allocate` and the matching `free` exactly one holder has the
/// record.
pub trait PooledEvent: Send + std::fmt::Debug {
    /// The kind this record's metadata shape belongs to.
    fn kind(&self) -> EventKind;

    /// Read access to the common header.
    fn header(&self) -> &EventHeader;

    /// Write access to the common header, for producers filling the record.
    fn header_mut(&mut self) -> &mut EventHeader;

    /// Clears every field back to its zero-equivalent state, retaining
    /// allocated capacity. Called by the pool when a record is freed.
    fn reset(&mut self);

    /// Serializes the kind-specific metadata payload to a JSON value for the
    /// log builder.
    fn metadata_value(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Returns this record as `&dyn Any` for downcasting to the concrete
    /// event struct.
    fn as_any(&self) -> &dyn Any;

    /// Returns this record as `&mut dyn Any` for downcasting to the concrete
    /// event struct.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implements [`PooledEvent`] for an event struct with a `header` field and a
/// resettable `metadata` field.
macro_rules! impl_pooled_event {
    ($event:ty, $kind:expr) => {
        impl PooledEvent for $event {
            fn kind(&self) -> EventKind {
                $kind
            }

            fn header(&self) -> &EventHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut EventHeader {
                &mut self.header
            }

            fn reset(&mut self) {
                self.header.reset();
                self.metadata.reset();
            }

            fn metadata_value(&self) -> Result<serde_json::Value, serde_json::Error> {
                serde_json::to_value(&self.metadata)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

// ============================================================================
// Event Records
// ============================================================================

/// Event record for process creation.
#[derive(Debug, Default, Serialize)]
pub struct ProcessCreateEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: ProcessCreateMetadata,
}

/// Event record for process termination.
#[derive(Debug, Default, Serialize)]
pub struct ProcessTerminateEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: ProcessTerminateMetadata,
}

/// Event record for shell readline activity.
#[derive(Debug, Default, Serialize)]
pub struct BashReadlineEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: BashReadlineMetadata,
}

/// Event record for service state changes.
#[derive(Debug, Default, Serialize)]
pub struct ServiceEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: ServiceMetadata,
}

/// Event record for TCP connection establishment.
#[derive(Debug, Default, Serialize)]
pub struct TcpConnectEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: TcpConnectMetadata,
}

/// Event record for TCP connection teardown.
#[derive(Debug, Default, Serialize)]
pub struct TcpDisconnectEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: TcpDisconnectMetadata,
}

/// Event record for file activity.
#[derive(Debug, Default, Serialize)]
pub struct FileEvent {
    /// Common header.
    #[serde(flatten)]
    pub header: EventHeader,
    /// Kind-specific payload.
    pub metadata: FileEventMetadata,
}

impl_pooled_event!(ProcessCreateEvent, EventKind::ProcessCreate);
impl_pooled_event!(ProcessTerminateEvent, EventKind::ProcessTerminate);
impl_pooled_event!(BashReadlineEvent, EventKind::BashReadline);
impl_pooled_event!(ServiceEvent, EventKind::Service);
impl_pooled_event!(TcpConnectEvent, EventKind::TcpConnect);
impl_pooled_event!(TcpDisconnectEvent, EventKind::TcpDisconnect);
impl_pooled_event!(FileEvent, EventKind::FileEvent);

// ============================================================================
// Factory Table
// ============================================================================

/// Constructor for a zeroed record of one kind.
pub type EventFactory = fn() -> Box<dyn PooledEvent>;

/// The full kind → factory table the pool registry is built from.
///
/// Changes here are a build-time operation: the registry is constructed once
/// from this table and never mutated afterwards.
pub fn factory_table() -> [(EventKind, EventFactory); 7] {
    [
        (EventKind::ProcessCreate, || {
            Box::<ProcessCreateEvent>::default()
        }),
        (EventKind::ProcessTerminate, || {
            Box::<ProcessTerminateEvent>::default()
        }),
        (EventKind::BashReadline, || {
            Box::<BashReadlineEvent>::default()
        }),
        (EventKind::Service, || Box::<ServiceEvent>::default()),
        (EventKind::TcpConnect, || Box::<TcpConnectEvent>::default()),
        (EventKind::TcpDisconnect, || {
            Box::<TcpDisconnectEvent>::default()
        }),
        (EventKind::FileEvent, || Box::<FileEvent>::default()),
    ]
}
