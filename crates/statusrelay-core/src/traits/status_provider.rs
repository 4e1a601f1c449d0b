// # Status Provider Trait
//
// Defines the interface for fetching the monitored service's status document.
//
// ## Implementations
//
// - HTTP/JSON endpoint: `statusrelay-provider-http` crate
//
// ## Document Format
//
// ```json
// {
//   "is_maintenance": true,
//   "updated_at": "2025-01-09T12:00:00Z",
//   "last_maintenance": {
//     "duration_minutes": 42.5,
//     "started_at": "2025-01-09T11:15:00Z"
//   }
// }
// ```
//
// Only `is_maintenance` matters to the monitor. When it is absent the
// document reads as "in maintenance".

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Details about the most recent maintenance window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastMaintenance {
    /// Length of the window in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,

    /// Start of the window, as reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl LastMaintenance {
    /// Duration in minutes, `0.0` when not reported
    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes.unwrap_or(0.0)
    }

    /// Parsed start time, if the reported value is a recognisable timestamp
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        self.started_at.as_deref().and_then(parse_timestamp)
    }

    fn is_empty(&self) -> bool {
        self.duration_minutes.is_none() && self.started_at.is_none()
    }
}

/// A status document as returned by the status endpoint
///
/// Produced fresh on every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_maintenance: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_maintenance: Option<LastMaintenance>,
}

impl StatusDocument {
    /// Create a document with an explicit maintenance flag
    pub fn new(is_maintenance: bool, updated_at: impl Into<String>) -> Self {
        Self {
            is_maintenance: Some(is_maintenance),
            updated_at: Some(updated_at.into()),
            last_maintenance: None,
        }
    }

    /// Attach last-maintenance details
    pub fn with_last_maintenance(
        mut self,
        duration_minutes: f64,
        started_at: impl Into<String>,
    ) -> Self {
        self.last_maintenance = Some(LastMaintenance {
            duration_minutes: Some(duration_minutes),
            started_at: Some(started_at.into()),
        });
        self
    }

    /// Decode a document from a JSON body
    pub fn from_json(body: &[u8]) -> Result<Self, crate::Error> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Whether the service is in maintenance
    ///
    /// Defaults to `true` when the payload omits the flag.
    pub fn is_maintenance(&self) -> bool {
        self.is_maintenance.unwrap_or(true)
    }

    /// Whether the payload actually carried `is_maintenance`
    pub fn maintenance_flag_present(&self) -> bool {
        self.is_maintenance.is_some()
    }

    /// Raw `updated_at` value, if present
    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Parsed `updated_at`, if it is a recognisable timestamp
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }

    /// Last maintenance details; an empty object counts as absent
    pub fn last_maintenance(&self) -> Option<&LastMaintenance> {
        self.last_maintenance.as_ref().filter(|m| !m.is_empty())
    }
}

/// Parse an ISO-8601 timestamp into UTC
///
/// Accepts RFC 3339 (`Z` or numeric offset) and naive date-times, which are
/// read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Trait for status provider implementations
///
/// A provider performs exactly one fetch per call. It does not retry, cache
/// or schedule; pacing and retry-on-next-cycle belong to `StatusMonitor`.
///
/// # Errors
///
/// Network errors, non-200 responses and undecodable bodies are all reported
/// as `Err`. The monitor treats every error as transient.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    /// Fetch the current status document
    async fn fetch(&self) -> Result<StatusDocument, crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
