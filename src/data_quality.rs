// ✅ Data Quality Engine - field-level validation and cleanup
//
// Runs on normalized records of a single feed. Defects are repaired by
// substitution (empty string) or the row is excluded; nothing here aborts
// a run.

use crate::entities::{CanonicalRecord, Field};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spellings of "missing" left behind by spreadsheet exports
pub const PLACEHOLDERS: [&str; 5] = ["nan", "none", "null", "<na>", "nat"];

pub const ISPB_LEN: usize = 8;

/// Case-insensitive placeholder check on the trimmed value
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ============================================================================
// REJECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// ISPB is not exactly 8 digits once non-digits are stripped
    InvalidIspb,
    /// Both names empty (or placeholders) after cleaning
    MissingName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// ISPB as it arrived, before digit stripping
    pub raw_ispb: String,
    pub name: String,
}

// ============================================================================
// BATCH SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub kept_count: usize,
    pub invalid_ispb_count: usize,
    pub missing_name_count: usize,
    /// Placeholder values replaced with empty strings
    pub placeholders_cleared: usize,
}

impl BatchSummary {
    pub fn rejected_count(&self) -> usize {
        self.invalid_ispb_count + self.missing_name_count
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records: {} kept, {} invalid ISPB, {} missing name, {} placeholders cleared",
            self.total_records,
            self.kept_count,
            self.invalid_ispb_count,
            self.missing_name_count,
            self.placeholders_cleared
        )
    }
}

#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub records: Vec<CanonicalRecord>,
    pub summary: BatchSummary,
    pub rejections: Vec<Rejection>,
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    ispb_len: usize,
}

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine { ispb_len: ISPB_LEN }
    }

    /// Clean every record and keep only the valid ones, in input order
    pub fn clean(&self, records: Vec<CanonicalRecord>) -> CleaningOutcome {
        let mut summary = BatchSummary {
            total_records: records.len(),
            ..BatchSummary::default()
        };
        let mut kept = Vec::with_capacity(records.len());
        let mut rejections = Vec::new();

        for mut record in records {
            let raw_ispb = record.ispb.clone();
            summary.placeholders_cleared += self.scrub_placeholders(&mut record);

            record.ispb = digits_only(&record.ispb);
            record.tax_id = digits_only(&record.tax_id);

            let reason = if !self.is_valid_ispb(&record.ispb) {
                Some(RejectionReason::InvalidIspb)
            } else if record.display_name().is_empty() {
                Some(RejectionReason::MissingName)
            } else {
                None
            };

            match reason {
                None => kept.push(record),
                Some(reason) => {
                    match reason {
                        RejectionReason::InvalidIspb => summary.invalid_ispb_count += 1,
                        RejectionReason::MissingName => summary.missing_name_count += 1,
                    }
                    debug!(
                        reason = ?reason,
                        raw_ispb = %raw_ispb,
                        name = %record.display_name(),
                        source = %record.data_source,
                        "rejected record"
                    );
                    rejections.push(Rejection {
                        reason,
                        raw_ispb,
                        name: record.display_name().to_string(),
                    });
                }
            }
        }

        summary.kept_count = kept.len();
        CleaningOutcome {
            records: kept,
            summary,
            rejections,
        }
    }

    pub fn is_valid_ispb(&self, ispb: &str) -> bool {
        ispb.len() == self.ispb_len && ispb.bytes().all(|b| b.is_ascii_digit())
    }

    /// Trim every field and blank out placeholders; returns how many were cleared
    fn scrub_placeholders(&self, record: &mut CanonicalRecord) -> usize {
        let mut cleared = 0;

        for field in Field::ALL {
            let value = record.get_mut(field);
            if is_placeholder(value) {
                value.clear();
                cleared += 1;
            } else {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }

        // Flags never go empty
        for field in Field::ALL.iter().filter(|f| f.is_flag()) {
            let value = record.get_mut(*field);
            if value.is_empty() {
                value.push_str(crate::entities::institution::NO);
            }
        }

        cleared
    }
}

impl Default for DataQualityEngine {
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
    use crate::entities::DataSource;

    fn create_record(ispb: &str, legal: &str, short: &str) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(DataSource::Pix);
        record.ispb = ispb.to_string();
        record.legal_name = legal.to_string();
        record.short_name = short.to_string();
        record
    }

    #[test]
    fn test_valid_record_passes() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![create_record("00000000", "Banco do Brasil", "BB")]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.summary.kept_count, 1);
        assert_eq!(outcome.summary.rejected_count(), 0);
    }

    #[test]
    fn test_ispb_noise_is_stripped() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![create_record(" -12345678- ", "Banco X", "")]);

        assert_eq!(outcome.records[0].ispb, "12345678");
    }

    #[test]
    fn test_seven_digit_ispb_is_dropped() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![create_record("1234567", "Banco X", "X")]);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.invalid_ispb_count, 1);
        assert_eq!(outcome.rejections[0].reason, RejectionReason::InvalidIspb);
        assert_eq!(outcome.rejections[0].raw_ispb, "1234567");
    }

    #[test]
    fn test_nine_digit_and_empty_ispb_dropped() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![
            create_record("123456789", "Banco X", ""),
            create_record("", "Banco Y", ""),
            create_record("abc", "Banco Z", ""),
        ]);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.invalid_ispb_count, 3);
    }

    #[test]
    fn test_tax_id_keeps_digits_only() {
        let engine = DataQualityEngine::new();
        let mut record = create_record("00000000", "Banco do Brasil", "");
        record.tax_id = "00.000.000/0001-91".to_string();

        let outcome = engine.clean(vec![record]);
        assert_eq!(outcome.records[0].tax_id, "00000000000191");
    }

    #[test]
    fn test_nan_name_is_dropped_case_insensitive() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![
            create_record("00000000", "NaN", "nan"),
            create_record("00000001", "  ", ""),
        ]);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.missing_name_count, 2);
    }

    #[test]
    fn test_short_name_alone_is_enough() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![create_record("00000000", "", "BB")]);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_placeholders_become_empty_without_dropping() {
        let engine = DataQualityEngine::new();
        let mut record = create_record("00000000", "Banco do Brasil", "BB");
        record.institution_type = "NULL".to_string();
        record.pix_modality = "nan".to_string();
        record.participates_in_settlement_system = "None".to_string();

        let outcome = engine.clean(vec![record]);
        let cleaned = &outcome.records[0];

        assert_eq!(cleaned.institution_type, "");
        assert_eq!(cleaned.pix_modality, "");
        assert_eq!(cleaned.participates_in_settlement_system, "No");
        assert_eq!(outcome.summary.placeholders_cleared, 3);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![create_record("00000000", "  Banco do Brasil ", " BB")]);

        assert_eq!(outcome.records[0].legal_name, "Banco do Brasil");
        assert_eq!(outcome.records[0].short_name, "BB");
    }

    #[test]
    fn test_order_is_preserved() {
        let engine = DataQualityEngine::new();
        let outcome = engine.clean(vec![
            create_record("00000002", "B", ""),
            create_record("bad", "X", ""),
            create_record("00000001", "A", ""),
        ]);

        let ispbs: Vec<&str> = outcome.records.iter().map(|r| r.ispb.as_str()).collect();
        assert_eq!(ispbs, vec!["00000002", "00000001"]);
        println!("{}", outcome.summary.summary());
    }
}
