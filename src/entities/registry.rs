// 📚 Institution Registry - read-only snapshot served to queries
//
// Built once from what the persister wrote. Nothing here mutates after
// construction: a reload builds a brand new registry and the caller swaps it.

use super::institution::CanonicalRecord;
use super::metadata::{FreshnessMetadata, LastUpdate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label used in aggregate counts when a record leaves the grouped field empty
pub const NOT_INFORMED: &str = "Not informed";

/// Records plus the metadata written alongside them
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<CanonicalRecord>,
    pub metadata: FreshnessMetadata,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            records: Vec::new(),
            metadata: FreshnessMetadata::never(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_institutions: usize,
    pub last_update: LastUpdate,
    pub sources: BTreeMap<String, usize>,
    pub institution_types: BTreeMap<String, usize>,
    pub status_distribution: BTreeMap<String, usize>,
    pub data_freshness: String,
}

/// Immutable lookup structure over one snapshot
#[derive(Debug, Clone)]
pub struct InstitutionRegistry {
    records: Vec<CanonicalRecord>,
    metadata: FreshnessMetadata,
    by_ispb: HashMap<String, usize>,
}

impl InstitutionRegistry {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let by_ispb = snapshot
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (record.ispb.clone(), index))
            .collect();

        InstitutionRegistry {
            records: snapshot.records,
            metadata: snapshot.metadata,
            by_ispb,
        }
    }

    pub fn empty() -> Self {
        Self::from_snapshot(Snapshot::empty())
    }

    /// Exact-match lookup. Input is trimmed and left-padded with zeros,
    /// so "0" finds "00000000"; anything non-numeric or too long misses.
    pub fn lookup(&self, ispb: &str) -> Option<&CanonicalRecord> {
        let key = normalize_query_key(ispb)?;
        self.by_ispb.get(&key).map(|&index| &self.records[index])
    }

    pub fn all(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn metadata(&self) -> &FreshnessMetadata {
        &self.metadata
    }

    pub fn stats(&self, now: DateTime<Utc>) -> RegistryStats {
        let mut sources = BTreeMap::new();
        let mut institution_types = BTreeMap::new();
        let mut status_distribution = BTreeMap::new();

        for record in &self.records {
            bump(&mut sources, record.data_source.as_str());
            bump(&mut institution_types, &record.institution_type);
            bump(&mut status_distribution, &record.operational_status);
        }

        RegistryStats {
            total_institutions: self.records.len(),
            last_update: self.metadata.last_update.clone(),
            sources,
            institution_types,
            status_distribution,
            data_freshness: self.metadata.last_update.freshness(now),
        }
    }
}

impl Default for InstitutionRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, value: &str) {
    let label = if value.is_empty() { NOT_INFORMED } else { value };
    *counts.entry(label.to_string()).or_insert(0) += 1;
}

fn normalize_query_key(ispb: &str) -> Option<String> {
    let trimmed = ispb.trim();
    if trimmed.is_empty() || trimmed.len() > 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>8}", trimmed))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::institution::DataSource;

    fn record(ispb: &str, kind: &str, status: &str, source: DataSource) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(source);
        record.ispb = ispb.to_string();
        record.legal_name = format!("Institution {}", ispb);
        record.institution_type = kind.to_string();
        record.operational_status = status.to_string();
        record
    }

    fn registry() -> InstitutionRegistry {
        InstitutionRegistry::from_snapshot(Snapshot {
            records: vec![
                record("00000000", "Banco Múltiplo", "", DataSource::PixAndStr),
                record("00038166", "", "Active", DataSource::Str),
                record("60746948", "Banco Múltiplo", "Active", DataSource::Pix),
            ],
            metadata: FreshnessMetadata::never(),
        })
    }

    #[test]
    fn test_lookup_pads_short_input() {
        let registry = registry();

        assert_eq!(registry.lookup("0").unwrap().ispb, "00000000");
        assert_eq!(registry.lookup("38166").unwrap().ispb, "00038166");
        assert_eq!(registry.lookup(" 60746948 ").unwrap().ispb, "60746948");
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let registry = registry();

        assert!(registry.lookup("").is_none());
        assert!(registry.lookup("abc").is_none());
        assert!(registry.lookup("123456789").is_none());
        assert!(registry.lookup("12345678").is_none());
    }

    #[test]
    fn test_every_key_resolves_to_its_record() {
        let registry = registry();

        for record in registry.all() {
            let found = registry.lookup(&record.ispb).unwrap();
            assert_eq!(found.ispb, record.ispb);
        }
    }

    #[test]
    fn test_stats_group_counts() {
        let stats = registry().stats(Utc::now());

        assert_eq!(stats.total_institutions, 3);
        assert_eq!(stats.sources["PIX+STR"], 1);
        assert_eq!(stats.sources["STR"], 1);
        assert_eq!(stats.sources["PIX"], 1);
        assert_eq!(stats.institution_types["Banco Múltiplo"], 2);
        assert_eq!(stats.institution_types[NOT_INFORMED], 1);
        assert_eq!(stats.status_distribution["Active"], 2);
        assert_eq!(stats.status_distribution[NOT_INFORMED], 1);
        assert_eq!(stats.data_freshness, "never updated");
    }

    #[test]
    fn test_empty_registry() {
        let registry = InstitutionRegistry::empty();
        assert_eq!(registry.count(), 0);
        assert!(registry.lookup("0").is_none());
    }
}
