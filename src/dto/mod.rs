use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Player action envelope and its parsing into the closed action set.
pub mod action;
/// Health check data structures.
pub mod health;
/// Cost preset data structures.
pub mod preset;
/// Session request/response data structures and the shaped session view.
pub mod session;
/// Server-Sent Events data structures.
pub mod sse;
/// Request validation utilities.
pub mod validation;

/// Formats a SystemTime as an RFC3339 timestamp string.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
