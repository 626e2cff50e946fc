//! Diagnostics snapshot of a time domain.

use serde::Serialize;

/// What [`TimeDomain::as_value`](super::TimeDomain::as_value) reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDomainSnapshot {
    /// Domain name.
    pub name: String,
    /// Number of queues with a pending wake-up.
    pub registered_delay_count: usize,
    /// Milliseconds from the clock reading to the earliest wake-up. Negative
    /// when the wake-up is overdue. Absent when nothing is pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_delay_ms: Option<f64>,
}

impl TimeDomainSnapshot {
    /// Serializes the snapshot as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
