// ⏳ Freshness Metadata - what the last successful run produced, and when

use super::institution::{CanonicalRecord, DataSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version of the persisted artifact layout
pub const FORMAT_VERSION: &str = "1.0";

/// Sentinel written when no run has ever completed
pub const NEVER: &str = "never";

// ============================================================================
// LAST UPDATE
// ============================================================================

/// Either an RFC 3339 timestamp or the "never" sentinel on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LastUpdate {
    Never,
    At(DateTime<Utc>),
}

impl LastUpdate {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LastUpdate::Never => None,
            LastUpdate::At(at) => Some(*at),
        }
    }

    /// Human freshness text, e.g. "3 hour(s) ago"
    pub fn freshness(&self, now: DateTime<Utc>) -> String {
        let Some(at) = self.timestamp() else {
            return "never updated".to_string();
        };

        let elapsed = now.signed_duration_since(at);
        if elapsed.num_days() > 0 {
            format!("{} day(s) ago", elapsed.num_days())
        } else if elapsed.num_hours() > 0 {
            format!("{} hour(s) ago", elapsed.num_hours())
        } else {
            format!("{} minute(s) ago", elapsed.num_minutes().max(0))
        }
    }
}

impl From<LastUpdate> for String {
    fn from(value: LastUpdate) -> Self {
        match value {
            LastUpdate::Never => NEVER.to_string(),
            LastUpdate::At(at) => at.to_rfc3339(),
        }
    }
}

impl TryFrom<String> for LastUpdate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case(NEVER) {
            return Ok(LastUpdate::Never);
        }

        DateTime::parse_from_rfc3339(&value)
            .map(|at| LastUpdate::At(at.with_timezone(&Utc)))
            .map_err(|e| format!("invalid last_update '{}': {}", value, e))
    }
}

// ============================================================================
// FRESHNESS METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessMetadata {
    pub last_update: LastUpdate,
    pub total_institutions: usize,
    pub sources: Vec<DataSource>,
    pub format_version: String,

    /// SHA-256 of the record file, lets readers skip reloads of identical data
    #[serde(default)]
    pub records_sha256: String,
}

impl FreshnessMetadata {
    /// Metadata for a store that has never been written
    pub fn never() -> Self {
        FreshnessMetadata {
            last_update: LastUpdate::Never,
            total_institutions: 0,
            sources: Vec::new(),
            format_version: FORMAT_VERSION.to_string(),
            records_sha256: String::new(),
        }
    }

    /// Compute metadata for a record set about to be persisted
    pub fn for_records(
        records: &[CanonicalRecord],
        now: DateTime<Utc>,
        records_sha256: String,
    ) -> Self {
        let sources: BTreeSet<DataSource> = records.iter().map(|r| r.data_source).collect();

        FreshnessMetadata {
            last_update: LastUpdate::At(now),
            total_institutions: records.len(),
            sources: sources.into_iter().collect(),
            format_version: FORMAT_VERSION.to_string(),
            records_sha256,
        }
    }
}
