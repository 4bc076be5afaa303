// 🏦 Institution Entity - one canonical record per ISPB
//
// "The ISPB is IDENTITY (never changes), every other column is a VALUE
//  that whichever feed we read last may describe differently."
//
// Both feeds collapse into this single, fixed shape. Every field is a
// string so the persisted file has uniform keys across all records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when no feed says what kind of institution this is
pub const GENERIC_INSTITUTION_TYPE: &str = "Financial Institution";

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Operational status assigned to every STR participant
pub const ACTIVE: &str = "Active";

// ============================================================================
// DATA SOURCE (provenance tag)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// PIX participants list (dated feed)
    #[serde(rename = "PIX")]
    Pix,

    /// STR participants list (fixed feed)
    #[serde(rename = "STR")]
    Str,

    /// Present in both feeds, merged by the reconciler
    #[serde(rename = "PIX+STR")]
    PixAndStr,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Pix => "PIX",
            DataSource::Str => "STR",
            DataSource::PixAndStr => "PIX+STR",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CANONICAL FIELDS
// ============================================================================

/// Every writable canonical field except `data_source`.
///
/// The normalizer's mapping tables point raw columns at these, and the
/// cleaner walks them to scrub placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ispb,
    LegalName,
    ShortName,
    TaxId,
    InstitutionType,
    AuthorizedByRegulator,
    ParticipatesInFastPaymentSystem,
    ParticipatesInSettlementSystem,
    OperationalStatus,
    SpiParticipationType,
    PixParticipationType,
    PixModality,
    PaymentInitiation,
    WithdrawalFacilitator,
    BankCode,
    ParticipatesInClearing,
    SettlementAccessType,
    OperationStartDate,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Ispb,
        Field::LegalName,
        Field::ShortName,
        Field::TaxId,
        Field::InstitutionType,
        Field::AuthorizedByRegulator,
        Field::ParticipatesInFastPaymentSystem,
        Field::ParticipatesInSettlementSystem,
        Field::OperationalStatus,
        Field::SpiParticipationType,
        Field::PixParticipationType,
        Field::PixModality,
        Field::PaymentInitiation,
        Field::WithdrawalFacilitator,
        Field::BankCode,
        Field::ParticipatesInClearing,
        Field::SettlementAccessType,
        Field::OperationStartDate,
    ];

    /// JSON key used in the persisted record file
    pub fn key(&self) -> &'static str {
        match self {
            Field::Ispb => "ispb",
            Field::LegalName => "legal_name",
            Field::ShortName => "short_name",
            Field::TaxId => "tax_id",
            Field::InstitutionType => "institution_type",
            Field::AuthorizedByRegulator => "authorized_by_regulator",
            Field::ParticipatesInFastPaymentSystem => "participates_in_fast_payment_system",
            Field::ParticipatesInSettlementSystem => "participates_in_settlement_system",
            Field::OperationalStatus => "operational_status",
            Field::SpiParticipationType => "spi_participation_type",
            Field::PixParticipationType => "pix_participation_type",
            Field::PixModality => "pix_modality",
            Field::PaymentInitiation => "payment_initiation",
            Field::WithdrawalFacilitator => "withdrawal_facilitator",
            Field::BankCode => "bank_code",
            Field::ParticipatesInClearing => "participates_in_clearing",
            Field::SettlementAccessType => "settlement_access_type",
            Field::OperationStartDate => "operation_start_date",
        }
    }

    /// Boolean-as-string flags that default to "No" instead of ""
    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            Field::ParticipatesInFastPaymentSystem | Field::ParticipatesInSettlementSystem
        )
    }

    /// Yes/No columns the normalizer canonicalizes
    pub fn is_yes_no(&self) -> bool {
        matches!(
            self,
            Field::AuthorizedByRegulator
                | Field::ParticipatesInFastPaymentSystem
                | Field::ParticipatesInSettlementSystem
                | Field::PaymentInitiation
                | Field::WithdrawalFacilitator
                | Field::ParticipatesInClearing
        )
    }
}

// ============================================================================
// CANONICAL RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    pub ispb: String,

    // ========================================================================
    // COMMON VALUES
    // ========================================================================
    pub legal_name: String,
    pub short_name: String,
    pub tax_id: String,
    pub institution_type: String,
    pub authorized_by_regulator: String,
    pub participates_in_fast_payment_system: String,
    pub participates_in_settlement_system: String,
    pub operational_status: String,

    // ========================================================================
    // PIX-ONLY VALUES
    // ========================================================================
    pub spi_participation_type: String,
    pub pix_participation_type: String,
    pub pix_modality: String,
    pub payment_initiation: String,
    pub withdrawal_facilitator: String,

    // ========================================================================
    // STR-ONLY VALUES (settlement)
    // ========================================================================
    pub bank_code: String,
    pub participates_in_clearing: String,
    pub settlement_access_type: String,
    pub operation_start_date: String,

    // ========================================================================
    // PROVENANCE
    // ========================================================================
    pub data_source: DataSource,
}

impl CanonicalRecord {
    /// Empty record tagged with its source; flags start at "No"
    pub fn new(data_source: DataSource) -> Self {
        CanonicalRecord {
            ispb: String::new(),
            legal_name: String::new(),
            short_name: String::new(),
            tax_id: String::new(),
            institution_type: String::new(),
            authorized_by_regulator: String::new(),
            participates_in_fast_payment_system: NO.to_string(),
            participates_in_settlement_system: NO.to_string(),
            operational_status: String::new(),
            spi_participation_type: String::new(),
            pix_participation_type: String::new(),
            pix_modality: String::new(),
            payment_initiation: String::new(),
            withdrawal_facilitator: String::new(),
            bank_code: String::new(),
            participates_in_clearing: String::new(),
            settlement_access_type: String::new(),
            operation_start_date: String::new(),
            data_source,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Ispb => &self.ispb,
            Field::LegalName => &self.legal_name,
            Field::ShortName => &self.short_name,
            Field::TaxId => &self.tax_id,
            Field::InstitutionType => &self.institution_type,
            Field::AuthorizedByRegulator => &self.authorized_by_regulator,
            Field::ParticipatesInFastPaymentSystem => &self.participates_in_fast_payment_system,
            Field::ParticipatesInSettlementSystem => &self.participates_in_settlement_system,
            Field::OperationalStatus => &self.operational_status,
            Field::SpiParticipationType => &self.spi_participation_type,
            Field::PixParticipationType => &self.pix_participation_type,
            Field::PixModality => &self.pix_modality,
            Field::PaymentInitiation => &self.payment_initiation,
            Field::WithdrawalFacilitator => &self.withdrawal_facilitator,
            Field::BankCode => &self.bank_code,
            Field::ParticipatesInClearing => &self.participates_in_clearing,
            Field::SettlementAccessType => &self.settlement_access_type,
            Field::OperationStartDate => &self.operation_start_date,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Ispb => &mut self.ispb,
            Field::LegalName => &mut self.legal_name,
            Field::ShortName => &mut self.short_name,
            Field::TaxId => &mut self.tax_id,
            Field::InstitutionType => &mut self.institution_type,
            Field::AuthorizedByRegulator => &mut self.authorized_by_regulator,
            Field::ParticipatesInFastPaymentSystem => &mut self.participates_in_fast_payment_system,
            Field::ParticipatesInSettlementSystem => &mut self.participates_in_settlement_system,
            Field::OperationalStatus => &mut self.operational_status,
            Field::SpiParticipationType => &mut self.spi_participation_type,
            Field::PixParticipationType => &mut self.pix_participation_type,
            Field::PixModality => &mut self.pix_modality,
            Field::PaymentInitiation => &mut self.payment_initiation,
            Field::WithdrawalFacilitator => &mut self.withdrawal_facilitator,
            Field::BankCode => &mut self.bank_code,
            Field::ParticipatesInClearing => &mut self.participates_in_clearing,
            Field::SettlementAccessType => &mut self.settlement_access_type,
            Field::OperationStartDate => &mut self.operation_start_date,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Name shown to users: legal name, or short name when the legal one is missing
    pub fn display_name(&self) -> &str {
        if self.legal_name.is_empty() {
            &self.short_name
        } else {
            &self.legal_name
        }
    }

    pub fn has_generic_type(&self) -> bool {
        self.institution_type.is_empty() || self.institution_type == GENERIC_INSTITUTION_TYPE
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = CanonicalRecord::new(DataSource::Pix);

        assert_eq!(record.participates_in_fast_payment_system, "No");
        assert_eq!(record.participates_in_settlement_system, "No");
        assert_eq!(record.authorized_by_regulator, "");
        assert_eq!(record.data_source, DataSource::Pix);
    }

    #[test]
    fn test_field_access_roundtrips_through_every_field() {
        let mut record = CanonicalRecord::new(DataSource::Str);

        for field in Field::ALL {
            record.set(field, field.key());
        }

        for field in Field::ALL {
            assert_eq!(record.get(field), field.key());
        }
    }

    #[test]
    fn test_serialized_keys_match_field_keys() {
        let record = CanonicalRecord::new(DataSource::PixAndStr);
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        for field in Field::ALL {
            assert!(object.contains_key(field.key()), "missing {}", field.key());
        }
        assert_eq!(object["data_source"], "PIX+STR");
        assert_eq!(object.len(), Field::ALL.len() + 1);
    }

    #[test]
    fn test_display_name_falls_back_to_short_name() {
        let mut record = CanonicalRecord::new(DataSource::Str);
        record.short_name = "BCO X".to_string();
        assert_eq!(record.display_name(), "BCO X");

        record.legal_name = "Banco X S.A.".to_string();
        assert_eq!(record.display_name(), "Banco X S.A.");
    }

    #[test]
    fn test_generic_type_detection() {
        let mut record = CanonicalRecord::new(DataSource::Str);
        assert!(record.has_generic_type());

        record.institution_type = GENERIC_INSTITUTION_TYPE.to_string();
        assert!(record.has_generic_type());

        record.institution_type = "Banco Múltiplo".to_string();
        assert!(!record.has_generic_type());
    }
}
