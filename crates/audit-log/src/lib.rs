//! Append-only JSON-lines audit trail for waf-gate.
//!
//! Rejections, malformed requests and lifecycle events are serialised as one
//! JSON object per line and appended to a file by a background task, giving a
//! [JSON Lines](https://jsonlines.org/) stream that is easy to ship and parse.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use audit_log::{AuditEntry, AuditEventType, AuditSink, AuditSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (sink, _handle) = AuditSink::start("/var/log/waf-gate/audit.jsonl").await?;
//!
//! sink.log(AuditEntry::new(
//!     AuditEventType::GatewayStarted,
//!     AuditSource::new("waf-gate"),
//!     serde_json::json!({"version": "0.1.0"}),
//! ));
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod sink;
pub mod writer;

pub use entry::{AuditEntry, AuditEventType, AuditSource, DetectionRecord};
pub use sink::AuditSink;
pub use writer::{AuditWriteError, AuditWriter};
