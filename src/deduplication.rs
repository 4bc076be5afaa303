// 🔍 Deduplication Engine - one record per ISPB within a feed
//
// A feed occasionally lists the same institution twice (e.g. two
// participation modalities). The first occurrence wins; later ones are
// reported and discarded.

use crate::entities::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub ispb: String,

    /// Index (in the input) of the record that was kept
    pub kept_index: usize,

    /// Index (in the input) of the record that was dropped
    pub dropped_index: usize,

    /// Human-readable reason
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct DeduplicationResult {
    pub records: Vec<CanonicalRecord>,
    pub duplicates: Vec<DuplicateMatch>,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine
    }

    /// Keep the first record per ISPB, preserving input order
    pub fn dedupe(&self, records: Vec<CanonicalRecord>) -> DeduplicationResult {
        // ISPB → (index, display name) of the record that was kept
        let mut first_seen: HashMap<String, (usize, String)> = HashMap::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            if let Some((kept_index, kept_name)) = first_seen.get(&record.ispb) {
                let kept_index = *kept_index;
                debug!(ispb = %record.ispb, kept_index, dropped_index = index, "duplicate ISPB dropped");
                duplicates.push(DuplicateMatch {
                    reason: format!(
                        "ISPB {} already listed as '{}'",
                        record.ispb, kept_name
                    ),
                    ispb: record.ispb,
                    kept_index,
                    dropped_index: index,
                });
                continue;
            }

            first_seen.insert(record.ispb.clone(), (index, record.display_name().to_string()));
            kept.push(record);
        }

        DeduplicationResult {
            records: kept,
            duplicates,
        }
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
