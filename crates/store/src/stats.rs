//! Statistics shapes served by the repository read side
//!
//! The metric names here are contracts consumed by dashboards; renaming a
//! field is a breaking change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Activity counters over the trailing 24 hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    /// Views recorded in the last 24 hours.
    pub transactions_24h: u64,
    /// Mismatches detected in the last 24 hours.
    pub mismatches_24h: u64,
}

/// The aggregate metric set for the operations dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Total view rows recorded.
    pub total_transactions: u64,
    /// Total mismatch rows recorded.
    pub total_mismatches: u64,
    /// Views whose transaction id has a verdict (matched or mismatch).
    pub total_reconciled: u64,
    /// Views still awaiting a verdict.
    pub pending_reconciliation: u64,
    /// matched / (matched + mismatch) * 100, or 100.0 when nothing has been
    /// reconciled yet. Rounded to one decimal.
    pub success_rate: f64,
    /// View counts per reconciliation status.
    pub reconciliation_breakdown: BTreeMap<String, u64>,
    /// View counts per source.
    pub source_distribution: BTreeMap<String, u64>,
    /// View counts per reported transaction status.
    pub status_distribution: BTreeMap<String, u64>,
    /// Mismatch counts per mismatch type.
    pub mismatch_types: BTreeMap<String, u64>,
    /// Trailing 24-hour activity.
    pub recent_activity: RecentActivity,
}

/// Width of a timeline bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineInterval {
    /// One bucket per minute.
    Minute,
    /// One bucket per hour.
    Hour,
    /// One bucket per day.
    Day,
}

impl TimelineInterval {
    /// Bucket width as a duration.
    pub fn step(self) -> Duration {
        match self {
            TimelineInterval::Minute => Duration::from_secs(60),
            TimelineInterval::Hour => Duration::from_secs(3600),
            TimelineInterval::Day => Duration::from_secs(86400),
        }
    }

    /// Label for a bucket that starts at `start`.
    pub fn label(self, start: DateTime<Utc>) -> String {
        match self {
            TimelineInterval::Minute => start.format("%H:%M").to_string(),
            TimelineInterval::Hour => start.format("%H:00").to_string(),
            TimelineInterval::Day => start.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for TimelineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimelineInterval::Minute => "minute",
            TimelineInterval::Hour => "hour",
            TimelineInterval::Day => "day",
        };
        f.write_str(s)
    }
}

impl FromStr for TimelineInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(TimelineInterval::Minute),
            "hour" => Ok(TimelineInterval::Hour),
            "day" => Ok(TimelineInterval::Day),
            other => Err(format!("unknown timeline interval: {other}")),
        }
    }
}

/// One bucket of the activity timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    /// Display label derived from the bucket start.
    pub bucket_label: String,
    /// Bucket start instant.
    pub timestamp: DateTime<Utc>,
    /// Views recorded inside the bucket.
    pub transactions: u64,
    /// Mismatches detected inside the bucket.
    pub mismatches: u64,
}

/// Per-minute activity rates over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Views per minute.
    pub transaction_rate: f64,
    /// Mismatches per minute.
    pub mismatch_rate: f64,
    /// Views in the window.
    pub total_transactions: u64,
    /// Mismatches in the window.
    pub total_mismatches: u64,
    /// Window length in minutes.
    pub period_minutes: u32,
}

/// Derived system status for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    /// Writes observed within the last hour.
    #[serde(rename = "HEALTHY")]
    Healthy,
    /// Data exists but nothing arrived in the last hour.
    #[serde(rename = "IDLE")]
    Idle,
    /// No data has ever arrived.
    #[serde(rename = "WAITING")]
    Waiting,
}

/// Repository health summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Derived status.
    pub status: HealthState,
    /// Instant of the most recent view, if any.
    pub last_transaction: Option<DateTime<Utc>>,
    /// Views recorded in the last hour.
    pub transactions_last_hour: u64,
    /// Total view rows.
    pub total_transactions: u64,
}
