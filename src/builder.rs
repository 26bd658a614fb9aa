//! # Log Record Builder
//!
//! Turns a filled event (or raw field values) into the unified record the
//! exporter ships downstream:
//!
//! ```json
//! {
//!   "eventname": "<eventName>",
//!   "source": "<source>",
//!   "timestamp": "<timestamp>",
//!   "log": "<eventLog>",
//!   "metadata": { ... }
//! }
//! ```
//!
//! Required fields are validated in order (source, then eventName, then
//! eventLog); metadata is optional and renders as an empty object, never
//! null. Rendering borrows scratch buffers from the [`BufferPool`] so the
//! hot path stays allocation-free once warm.

use crate::events::PooledEvent;
use crate::pool::BufferPool;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// RFC3339 at second precision with a numeric offset.
const TS_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%:z";
/// RFC3339 with a 6-digit fractional second.
const TS_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// Errors surfaced while building or rendering a log record.
#[derive(Debug, Error)]
pub enum LogBuildError {
    /// A required field was empty. Carries the name of the first empty field
    /// in validation order: source, eventName, eventLog.
    #[error("required field '{0}' is empty")]
    EmptyField(&'static str),
    /// A caller-supplied timestamp matched none of the accepted RFC3339
    /// layouts.
    #[error("timestamp '{0}' does not match any accepted RFC3339 layout")]
    InvalidTimestampFormat(String),
    /// The record could not be serialized to JSON.
    #[error("failed to serialize log record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The unified structured record shipped downstream.
///
/// Field order matches the exported wire shape. `metadata` always renders as
/// an object; when no metadata was supplied it is `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Stable event name, e.g. "ProcessCreate".
    pub eventname: String,
    /// Capture source, e.g. "eBPF".
    pub source: String,
    /// RFC3339 timestamp text. Caller-supplied timestamps are echoed
    /// verbatim after validation.
    pub timestamp: String,
    /// Free-form log text.
    pub log: String,
    /// Arbitrary nested key/value metadata.
    pub metadata: Map<String, Value>,
}

/// Parses a caller-supplied timestamp under the accepted layouts, first
/// match wins: second precision, 6-digit fraction, then general RFC3339
/// with up to a 9-digit fraction.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, LogBuildError> {
    DateTime::parse_from_str(text, TS_SECONDS)
        .or_else(|_| DateTime::parse_from_str(text, TS_MICROS))
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map_err(|_| LogBuildError::InvalidTimestampFormat(text.to_string()))
}

/// Builds and renders unified log records, borrowing scratch buffers from
/// its [`BufferPool`] during rendering.
///
/// # Examples
///
/// ```rust
/// use sensor_event_pool::LogBuilder;
///
/// let builder = LogBuilder::new();
/// let record = builder.build(
///     "eBPF",
///     "openat",
///     "File descriptor opened successfully",
///     None,
///     None,
/// )?;
/// let line = builder.render_line(&record)?;
/// assert!(line.contains("\"eventname\":\"openat\""));
/// # Ok::<(), sensor_event_pool::LogBuildError>(())
/// ```
#[derive(Debug, Default)]
pub struct LogBuilder {
    buffers: BufferPool,
}

impl LogBuilder {
    /// Creates a builder with an empty scratch-buffer pool.
    pub fn new() -> Self {
        Self {
            buffers: BufferPool::new(),
        }
    }

    /// Creates a builder rendering through an existing buffer pool.
    pub fn with_buffers(buffers: BufferPool) -> Self {
        Self { buffers }
    }

    /// Validates the inputs and assembles a [`LogRecord`].
    ///
    /// A supplied `timestamp` must parse under one of the accepted RFC3339
    /// layouts and is echoed into the record verbatim; when omitted, the
    /// current time is stamped at second precision. Omitted metadata becomes
    /// an empty object.
    ///
    /// # Errors
    ///
    /// [`LogBuildError::EmptyField`] naming the first empty required field,
    /// or [`LogBuildError::InvalidTimestampFormat`] for an unparseable
    /// timestamp. No partial record is returned on error.
    pub fn build(
        &self,
        source: &str,
        event_name: &str,
        event_log: &str,
        timestamp: Option<&str>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<LogRecord, LogBuildError> {
        if source.is_empty() {
            return Err(LogBuildError::EmptyField("source"));
        }
        if event_name.is_empty() {
            return Err(LogBuildError::EmptyField("eventName"));
        }
        if event_log.is_empty() {
            return Err(LogBuildError::EmptyField("eventLog"));
        }

        let timestamp = match timestamp {
            Some(text) => {
                parse_timestamp(text)?;
                text.to_string()
            }
            None => Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        };

        Ok(LogRecord {
            eventname: event_name.to_string(),
            source: source.to_string(),
            timestamp,
            log: event_log.to_string(),
            metadata: metadata.unwrap_or_default(),
        })
    }

    /// Assembles a [`LogRecord`] from a filled pooled event.
    ///
    /// The header supplies source, event name, and timestamp; the event's
    /// metadata payload is serialized into the record's metadata object.
    ///
    /// # Errors
    ///
    /// [`LogBuildError::EmptyField`] if the header's source or event name is
    /// empty, or [`LogBuildError::Serialization`] if the metadata payload
    /// cannot be serialized.
    pub fn build_from_event(
        &self,
        event: &dyn PooledEvent,
        event_log: &str,
    ) -> Result<LogRecord, LogBuildError> {
        let header = event.header();
        if header.source.is_empty() {
            return Err(LogBuildError::EmptyField("source"));
        }
        if header.event_name.is_empty() {
            return Err(LogBuildError::EmptyField("eventName"));
        }
        if event_log.is_empty() {
            return Err(LogBuildError::EmptyField("eventLog"));
        }

        let metadata = match event.metadata_value()? {
            Value::Object(map) => map,
            other => {
                // metadata shapes are structs, so this arm is unreachable in
                // practice, but a scalar payload still renders as an object
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        Ok(LogRecord {
            eventname: header.event_name.clone(),
            source: header.source.clone(),
            timestamp: header
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            log: event_log.to_string(),
            metadata,
        })
    }

    /// Renders the record as a single JSON line.
    pub fn render_line(&self, record: &LogRecord) -> Result<String, LogBuildError> {
        self.render(record, false)
    }

    /// Renders the record as pretty-printed JSON.
    pub fn render_pretty(&self, record: &LogRecord) -> Result<String, LogBuildError> {
        self.render(record, true)
    }

    fn render(&self, record: &LogRecord, pretty: bool) -> Result<String, LogBuildError> {
        let mut buf = self.buffers.get();
        let result = if pretty {
            serde_json::to_writer_pretty(&mut buf, record)
        } else {
            serde_json::to_writer(&mut buf, record)
        };
        // serde_json output is always valid UTF-8, so the lossy pass copies as-is
        let text = result.map(|()| String::from_utf8_lossy(&buf).into_owned());
        self.buffers.put(buf);
        text.map_err(LogBuildError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_source_is_rejected_first() {
        let builder = LogBuilder::new();
        let err = builder.build("", "x", "y", None, None).unwrap_err();
        assert!(matches!(err, LogBuildError::EmptyField("source")));

        let err = builder.build("s", "", "y", None, None).unwrap_err();
        assert!(matches!(err, LogBuildError::EmptyField("eventName")));

        let err = builder.build("s", "e", "", None, None).unwrap_err();
        assert!(matches!(err, LogBuildError::EmptyField("eventLog")));
    }

    #[test]
    fn supplied_timestamp_is_echoed_verbatim() {
        let builder = LogBuilder::new();
        let record = builder
            .build(
                "s",
                "e",
                "l",
                Some("2004-09-26T12:34:56.123456+00:00"),
                None,
            )
            .unwrap();
        assert_eq!(record.timestamp, "2004-09-26T12:34:56.123456+00:00");
    }

    #[test]
    fn each_accepted_layout_parses() {
        for text in [
            "2004-09-26T12:34:56+00:00",
            "2004-09-26T12:34:56.123456+00:00",
            "2004-09-26T12:34:56.123456789+09:00",
            "2004-09-26T12:34:56.123+00:00",
            "2004-09-26T12:34:56Z",
        ] {
            assert!(parse_timestamp(text).is_ok(), "rejected {text}");
        }
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let builder = LogBuilder::new();
        let err = builder
            .build("s", "e", "l", Some("not-a-date"), None)
            .unwrap_err();
        assert!(matches!(err, LogBuildError::InvalidTimestampFormat(_)));

        let err = builder
            .build("s", "e", "l", Some("2004-09-26 12:34:56"), None)
            .unwrap_err();
        assert!(matches!(err, LogBuildError::InvalidTimestampFormat(_)));
    }

    #[test]
    fn omitted_timestamp_parses_back_at_second_precision() {
        let builder = LogBuilder::new();
        let record = builder.build("s", "e", "l", None, None).unwrap();
        assert!(
            DateTime::parse_from_str(&record.timestamp, TS_SECONDS).is_ok(),
            "stamped timestamp {} is not second-precision RFC3339",
            record.timestamp
        );
    }

    #[test]
    fn omitted_metadata_renders_as_empty_object() {
        let builder = LogBuilder::new();
        let record = builder.build("s", "e", "l", None, None).unwrap();
        let line = builder.render_line(&record).unwrap();
        assert!(line.ends_with("\"metadata\":{}}"), "got: {line}");
    }

    #[test]
    fn metadata_round_trips_through_rendering() {
        let builder = LogBuilder::new();
        let mut metadata = Map::new();
        metadata.insert("pid".to_string(), json!(1234));
        metadata.insert("ip".to_string(), json!("192.168.1.100"));

        let record = builder
            .build("libpcap", "connect", "established", None, Some(metadata))
            .unwrap();
        let line = builder.render_line(&record).unwrap();

        let parsed: LogRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.metadata["pid"], json!(1234));
    }

    #[test]
    fn pretty_rendering_contains_all_fields() {
        let builder = LogBuilder::new();
        let record = builder.build("eBPF", "openat", "opened", None, None).unwrap();
        let pretty = builder.render_pretty(&record).unwrap();
        for field in ["eventname", "source", "timestamp", "log", "metadata"] {
            assert!(pretty.contains(field), "missing {field}");
        }
    }

    #[test]
    fn rendering_reuses_the_scratch_buffer() {
        let builder = LogBuilder::new();
        let record = builder.build("s", "e", "l", None, None).unwrap();
        for _ in 0..50 {
            builder.render_line(&record).unwrap();
        }
        assert_eq!(builder.buffers.idle_len(), 1);
    }
}
