// ⚖️ Reconciliation Engine - merge the PIX and STR lists by ISPB
//
// Precedence:
//   - PIX is the base record; STR only fills gaps in common fields
//   - settlement fields always come from STR (PIX never carries them)
//   - records present in both are tagged PIX+STR
//
// Both inputs must already be validated and deduplicated per feed.

use crate::entities::institution::YES;
use crate::entities::{CanonicalRecord, DataSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Merged records, sorted ascending by ISPB
    pub records: Vec<CanonicalRecord>,
    pub pix_only_count: usize,
    pub str_only_count: usize,
    pub merged_count: usize,
    pub reconciled_at: chrono::DateTime<chrono::Utc>,
}

impl ReconciliationReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation: {} institutions ({} PIX only, {} STR only, {} in both)",
            self.records.len(),
            self.pix_only_count,
            self.str_only_count,
            self.merged_count
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Merge both feeds. `None` means the feed failed this run.
    ///
    /// Example:
    /// ```
    /// use ispb_registry::{CanonicalRecord, DataSource, ReconciliationEngine};
    ///
    /// let mut pix = CanonicalRecord::new(DataSource::Pix);
    /// pix.ispb = "12345678".to_string();
    /// pix.legal_name = "Banco X".to_string();
    ///
    /// let mut str_record = CanonicalRecord::new(DataSource::Str);
    /// str_record.ispb = "12345678".to_string();
    /// str_record.legal_name = "Banco X STR".to_string();
    /// str_record.participates_in_settlement_system = "Yes".to_string();
    ///
    /// let report = ReconciliationEngine::new().reconcile(Some(vec![pix]), Some(vec![str_record]));
    /// assert_eq!(report.records[0].legal_name, "Banco X");
    /// assert_eq!(report.records[0].data_source, DataSource::PixAndStr);
    /// ```
    pub fn reconcile(
        &self,
        pix: Option<Vec<CanonicalRecord>>,
        str_records: Option<Vec<CanonicalRecord>>,
    ) -> ReconciliationReport {
        let mut by_ispb: BTreeMap<String, CanonicalRecord> = BTreeMap::new();

        for record in pix.unwrap_or_default() {
            by_ispb.entry(record.ispb.clone()).or_insert(record);
        }
        let pix_count = by_ispb.len();

        let mut str_only_count = 0;
        let mut merged_count = 0;

        for record in str_records.unwrap_or_default() {
            match by_ispb.get_mut(&record.ispb) {
                Some(existing) if existing.data_source == DataSource::Pix => {
                    self.merge_into(existing, record);
                    merged_count += 1;
                }
                Some(_) => {
                    // Repeated STR ISPB: the first occurrence already landed
                }
                None => {
                    by_ispb.insert(record.ispb.clone(), record);
                    str_only_count += 1;
                }
            }
        }

        ReconciliationReport {
            records: by_ispb.into_values().collect(),
            pix_only_count: pix_count - merged_count,
            str_only_count,
            merged_count,
            reconciled_at: chrono::Utc::now(),
        }
    }

    /// Fold one STR record into the PIX record with the same ISPB
    fn merge_into(&self, base: &mut CanonicalRecord, other: CanonicalRecord) {
        let other_generic = other.has_generic_type();

        // Names and tax id: PIX wins whenever it has a value
        if base.legal_name.is_empty() {
            base.legal_name = other.legal_name;
        }
        if base.short_name.is_empty() {
            base.short_name = other.short_name;
        }
        if base.tax_id.is_empty() {
            base.tax_id = other.tax_id;
        }

        // Type: PIX wins unless it is missing or generic and STR is more specific
        let replace_type = base.institution_type.is_empty()
            || (base.has_generic_type() && !other_generic);
        if replace_type && !other.institution_type.is_empty() {
            base.institution_type = other.institution_type;
        }

        // Settlement fields: STR only
        base.participates_in_settlement_system = YES.to_string();
        base.operation_start_date = other.operation_start_date;
        base.settlement_access_type = other.settlement_access_type;
        base.participates_in_clearing = other.participates_in_clearing;
        base.bank_code = other.bank_code;

        base.data_source = DataSource::PixAndStr;
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GENERIC_INSTITUTION_TYPE;

    fn pix_record(ispb: &str, name: &str, kind: &str) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(DataSource::Pix);
        record.ispb = ispb.to_string();
        record.legal_name = name.to_string();
        record.short_name = name.to_string();
        record.institution_type = kind.to_string();
        record.participates_in_fast_payment_system = YES.to_string();
        record
    }

    fn str_record(ispb: &str, name: &str) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(DataSource::Str);
        record.ispb = ispb.to_string();
        record.legal_name = name.to_string();
        record.short_name = name.to_string();
        record.institution_type = GENERIC_INSTITUTION_TYPE.to_string();
        record.participates_in_settlement_system = YES.to_string();
        record.operation_start_date = "22/04/2002".to_string();
        record.settlement_access_type = "RSFN".to_string();
        record.participates_in_clearing = YES.to_string();
        record.bank_code = "001".to_string();
        record
    }

    #[test]
    fn test_overlap_is_merged_with_pix_precedence() {
        let engine = ReconciliationEngine::new();
        let report = engine.reconcile(
            Some(vec![pix_record("12345678", "Banco X", "Banco Múltiplo")]),
            Some(vec![str_record("12345678", "Banco X STR")]),
        );

        assert_eq!(report.records.len(), 1);
        let merged = &report.records[0];
        assert_eq!(merged.legal_name, "Banco X");
        assert_eq!(merged.institution_type, "Banco Múltiplo");
        assert_eq!(merged.participates_in_settlement_system, "Yes");
        assert_eq!(merged.participates_in_fast_payment_system, "Yes");
        assert_eq!(merged.operation_start_date, "22/04/2002");
        assert_eq!(merged.settlement_access_type, "RSFN");
        assert_eq!(merged.participates_in_clearing, "Yes");
        assert_eq!(merged.bank_code, "001");
        assert_eq!(merged.data_source, DataSource::PixAndStr);
        assert_eq!(report.merged_count, 1);
        assert_eq!(report.pix_only_count, 0);
    }

    #[test]
    fn test_empty_pix_name_filled_from_str() {
        let engine = ReconciliationEngine::new();
        let mut pix = pix_record("12345678", "", "");
        pix.short_name = "BCO X".to_string();

        let report = engine.reconcile(Some(vec![pix]), Some(vec![str_record("12345678", "Banco X S.A.")]));
        assert_eq!(report.records[0].legal_name, "Banco X S.A.");
        assert_eq!(report.records[0].short_name, "BCO X");
    }

    #[test]
    fn test_generic_pix_type_replaced_by_specific_str_type() {
        let engine = ReconciliationEngine::new();
        let mut other = str_record("12345678", "Banco X");
        other.institution_type = "Banco Comercial".to_string();

        let report = engine.reconcile(
            Some(vec![pix_record("12345678", "Banco X", GENERIC_INSTITUTION_TYPE)]),
            Some(vec![other]),
        );
        assert_eq!(report.records[0].institution_type, "Banco Comercial");
    }

    #[test]
    fn test_tax_id_and_specific_type_both_filled_from_str() {
        let engine = ReconciliationEngine::new();
        let mut other = str_record("12345678", "Banco X");
        other.tax_id = "12345678000100".to_string();
        other.institution_type = "Cooperativa de Crédito".to_string();

        let report = engine.reconcile(
            Some(vec![pix_record("12345678", "Banco X", GENERIC_INSTITUTION_TYPE)]),
            Some(vec![other]),
        );

        let merged = &report.records[0];
        assert_eq!(merged.tax_id, "12345678000100");
        assert_eq!(merged.institution_type, "Cooperativa de Crédito");
    }

    #[test]
    fn test_empty_pix_type_takes_generic_str_type() {
        let engine = ReconciliationEngine::new();
        let report = engine.reconcile(
            Some(vec![pix_record("12345678", "Banco X", "")]),
            Some(vec![str_record("12345678", "Banco X")]),
        );
        assert_eq!(report.records[0].institution_type, GENERIC_INSTITUTION_TYPE);
    }

    #[test]
    fn test_disjoint_sets_are_unioned_and_sorted() {
        let engine = ReconciliationEngine::new();
        let report = engine.reconcile(
            Some(vec![
                pix_record("90000000", "Z", "Banco"),
                pix_record("00000001", "A", "Banco"),
            ]),
            Some(vec![str_record("50000000", "M")]),
        );

        let ispbs: Vec<&str> = report.records.iter().map(|r| r.ispb.as_str()).collect();
        assert_eq!(ispbs, vec!["00000001", "50000000", "90000000"]);
        assert_eq!(report.pix_only_count, 2);
        assert_eq!(report.str_only_count, 1);
        assert_eq!(report.records[1].data_source, DataSource::Str);
    }

    #[test]
    fn test_single_source_runs() {
        let engine = ReconciliationEngine::new();

        let only_str = engine.reconcile(None, Some(vec![str_record("00000000", "BB")]));
        assert_eq!(only_str.records.len(), 1);
        assert_eq!(only_str.records[0].data_source, DataSource::Str);

        let only_pix = engine.reconcile(Some(vec![pix_record("00000000", "BB", "")]), None);
        assert_eq!(only_pix.records[0].data_source, DataSource::Pix);

        assert!(engine.reconcile(None, None).is_empty());
    }

    #[test]
    fn test_no_duplicate_ispbs_in_output() {
        let engine = ReconciliationEngine::new();
        let report = engine.reconcile(
            Some(vec![pix_record("00000000", "A", ""), pix_record("11111111", "B", "")]),
            Some(vec![str_record("00000000", "A"), str_record("22222222", "C")]),
        );

        let mut ispbs: Vec<&str> = report.records.iter().map(|r| r.ispb.as_str()).collect();
        let before = ispbs.len();
        ispbs.dedup();
        assert_eq!(before, ispbs.len());
        println!("{}", report.summary());
    }
}
