// 🧭 Normalizer - raw feed columns into the canonical record
//
// Each feed has a fixed mapping table from the column names it has been
// seen to publish to canonical fields. Header names are folded before the
// lookup so "Nome_Reduzido", "NomeReduzido" and "Nome Reduzido" all match.

use crate::data_quality::is_placeholder;
use crate::entities::institution::{ACTIVE, GENERIC_INSTITUTION_TYPE, NO, YES};
use crate::entities::{CanonicalRecord, Field};
use crate::error::SourceError;
use crate::parser::{RawRow, SourceType};
use tracing::debug;

// ============================================================================
// MAPPING TABLES (folded column names)
// ============================================================================

type ColumnMap = &'static [(Field, &'static [&'static str])];

const PIX_COLUMNS: ColumnMap = &[
    (Field::Ispb, &["ispb"]),
    (Field::LegalName, &["nome", "nomeextenso", "razaosocial"]),
    (Field::ShortName, &["nomereduzido"]),
    (Field::TaxId, &["cnpj", "cnpjprincipal"]),
    (Field::InstitutionType, &["tipodeinstituicao", "tipoinstituicao"]),
    (Field::AuthorizedByRegulator, &["autorizadapelobcb"]),
    (Field::SpiParticipationType, &["tipodeparticipacaonospi"]),
    (Field::PixParticipationType, &["tipodeparticipacaonopix"]),
    (Field::PixModality, &["modalidadedeparticipacaonopix"]),
    (Field::PaymentInitiation, &["iniciacaodetransacaodepagamento"]),
    (Field::WithdrawalFacilitator, &["facilitadordeservicodesaqueetrocofss", "fss"]),
    (Field::OperationalStatus, &["statusemproducao", "situacao"]),
];

const STR_COLUMNS: ColumnMap = &[
    (Field::Ispb, &["ispb"]),
    (Field::LegalName, &["nomeextenso"]),
    (Field::ShortName, &["nomereduzido", "nome"]),
    (Field::TaxId, &["cnpj", "cnpjprincipal"]),
    (Field::InstitutionType, &["tipoinstituicao", "tipodeinstituicao"]),
    (Field::BankCode, &["numerocodigo", "codigo"]),
    (Field::ParticipatesInClearing, &["participadacompe"]),
    (Field::SettlementAccessType, &["acessoprincipal"]),
    (Field::OperationStartDate, &["iniciodaoperacao"]),
    (Field::OperationalStatus, &["situacao"]),
];

fn column_map(source_type: SourceType) -> ColumnMap {
    match source_type {
        SourceType::PixParticipants => PIX_COLUMNS,
        SourceType::StrParticipants => STR_COLUMNS,
    }
}

/// Lowercase, drop Portuguese accents, keep only letters and digits
pub fn fold_column_name(name: &str) -> String {
    name.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Canonical Yes/No for Portuguese and English spellings
pub fn canonical_yes_no(value: &str) -> Option<&'static str> {
    match fold_column_name(value).as_str() {
        "sim" | "s" | "yes" | "y" | "true" | "1" => Some(YES),
        "nao" | "n" | "no" | "false" | "0" => Some(NO),
        _ => None,
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty() || is_placeholder(value)
}

// ============================================================================
// NORMALIZER
// ============================================================================

pub struct Normalizer {
    source_type: SourceType,
}

impl Normalizer {
    pub fn new(source_type: SourceType) -> Self {
        Normalizer { source_type }
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Resolve which raw column feeds each canonical field (first alias present wins)
    fn plan(&self, columns: &[&str]) -> Vec<(Field, String)> {
        let folded: Vec<(String, &str)> = columns
            .iter()
            .map(|c| (fold_column_name(c), *c))
            .collect();

        column_map(self.source_type)
            .iter()
            .filter_map(|(field, aliases)| {
                aliases.iter().find_map(|alias| {
                    folded
                        .iter()
                        .find(|(f, _)| f == alias)
                        .map(|(_, original)| (*field, original.to_string()))
                })
            })
            .collect()
    }

    /// Map raw rows to canonical records (not yet validated)
    pub fn normalize(&self, rows: &[RawRow]) -> Result<Vec<CanonicalRecord>, SourceError> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };

        let columns: Vec<&str> = first.columns().collect();
        let plan = self.plan(&columns);

        if !plan.iter().any(|(field, _)| *field == Field::Ispb) {
            return Err(SourceError::MissingIspbColumn {
                source_type: self.source_type,
                columns: columns.iter().map(|c| c.to_string()).collect(),
            });
        }

        debug!(
            source = %self.source_type,
            mapped = ?plan.iter().map(|(f, c)| (f.key(), c.as_str())).collect::<Vec<_>>(),
            "column mapping resolved"
        );

        Ok(rows.iter().map(|row| self.normalize_row(row, &plan)).collect())
    }

    fn normalize_row(&self, row: &RawRow, plan: &[(Field, String)]) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(self.source_type.data_source());

        for (field, column) in plan {
            let raw = row.get(column).unwrap_or("").trim();
            let value = if field.is_yes_no() {
                match canonical_yes_no(raw) {
                    Some(canonical) => canonical.to_string(),
                    None if *field == Field::AuthorizedByRegulator => String::new(),
                    None => raw.to_string(),
                }
            } else {
                raw.to_string()
            };
            record.set(*field, value);
        }

        if is_blank(&record.legal_name) {
            record.legal_name = record.short_name.clone();
        }

        self.apply_source_defaults(&mut record);
        record
    }

    /// Facts implied by being listed in a feed at all
    fn apply_source_defaults(&self, record: &mut CanonicalRecord) {
        match self.source_type {
            SourceType::PixParticipants => {
                record.participates_in_fast_payment_system = YES.to_string();
            }
            SourceType::StrParticipants => {
                record.participates_in_settlement_system = YES.to_string();
                if is_blank(&record.authorized_by_regulator) {
                    record.authorized_by_regulator = YES.to_string();
                }
                if is_blank(&record.operational_status) {
                    record.operational_status = ACTIVE.to_string();
                }
                if is_blank(&record.institution_type) {
                    record.institution_type = GENERIC_INSTITUTION_TYPE.to_string();
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::DataSource;

    fn row(fields: &[(&str, &str)]) -> RawRow {
        RawRow {
            line_number: 2,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_fold_column_name() {
        assert_eq!(fold_column_name("Tipo de Instituição"), "tipodeinstituicao");
        assert_eq!(fold_column_name("Nome_Reduzido"), "nomereduzido");
        assert_eq!(fold_column_name("Início_da_Operação"), "iniciodaoperacao");
        assert_eq!(
            fold_column_name("Facilitador de serviço de Saque e Troco (FSS)"),
            "facilitadordeservicodesaqueetrocofss"
        );
    }

    #[test]
    fn test_canonical_yes_no() {
        assert_eq!(canonical_yes_no("Sim"), Some("Yes"));
        assert_eq!(canonical_yes_no("NÃO"), Some("No"));
        assert_eq!(canonical_yes_no("Nao"), Some("No"));
        assert_eq!(canonical_yes_no("talvez"), None);
    }

    #[test]
    fn test_pix_row_mapping() {
        let rows = vec![row(&[
            ("Nome Reduzido", "BCO DO BRASIL S.A."),
            ("ISPB", "00000000"),
            ("CNPJ", "00.000.000/0001-91"),
            ("Tipo de Instituição", "Banco Múltiplo"),
            ("Autorizada pelo BCB", "Sim"),
            ("Modalidade de Participação no Pix", "Provedor de Conta Transacional"),
            ("Facilitador de serviço de Saque e Troco (FSS)", "Não"),
            ("Coluna Nova", "ignored"),
        ])];

        let records = Normalizer::new(SourceType::PixParticipants).normalize(&rows).unwrap();
        let record = &records[0];

        assert_eq!(record.ispb, "00000000");
        assert_eq!(record.short_name, "BCO DO BRASIL S.A.");
        assert_eq!(record.legal_name, "BCO DO BRASIL S.A.");
        assert_eq!(record.tax_id, "00.000.000/0001-91");
        assert_eq!(record.institution_type, "Banco Múltiplo");
        assert_eq!(record.authorized_by_regulator, "Yes");
        assert_eq!(record.pix_modality, "Provedor de Conta Transacional");
        assert_eq!(record.withdrawal_facilitator, "No");
        assert_eq!(record.participates_in_fast_payment_system, "Yes");
        assert_eq!(record.participates_in_settlement_system, "No");
        assert_eq!(record.bank_code, "");
        assert_eq!(record.data_source, DataSource::Pix);
    }

    #[test]
    fn test_unknown_authorization_stays_empty() {
        let rows = vec![row(&[("ISPB", "00000000"), ("Autorizada pelo BCB", "?")])];
        let records = Normalizer::new(SourceType::PixParticipants).normalize(&rows).unwrap();
        assert_eq!(records[0].authorized_by_regulator, "");
    }

    #[test]
    fn test_str_row_mapping_and_defaults() {
        let rows = vec![row(&[
            ("ISPB", "00000000"),
            ("Nome_Reduzido", "BCO DO BRASIL S.A."),
            ("Número_Código", "001"),
            ("Participa_da_Compe", "Sim"),
            ("Acesso_Principal", "RSFN"),
            ("Nome_Extenso", "Banco do Brasil S.A."),
            ("Início_da_Operação", "22/04/2002"),
        ])];

        let records = Normalizer::new(SourceType::StrParticipants).normalize(&rows).unwrap();
        let record = &records[0];

        assert_eq!(record.legal_name, "Banco do Brasil S.A.");
        assert_eq!(record.short_name, "BCO DO BRASIL S.A.");
        assert_eq!(record.bank_code, "001");
        assert_eq!(record.participates_in_clearing, "Yes");
        assert_eq!(record.settlement_access_type, "RSFN");
        assert_eq!(record.operation_start_date, "22/04/2002");
        assert_eq!(record.participates_in_settlement_system, "Yes");
        assert_eq!(record.participates_in_fast_payment_system, "No");
        assert_eq!(record.authorized_by_regulator, "Yes");
        assert_eq!(record.operational_status, "Active");
        assert_eq!(record.institution_type, GENERIC_INSTITUTION_TYPE);
        assert_eq!(record.data_source, DataSource::Str);
    }

    #[test]
    fn test_str_blank_extended_name_falls_back_to_short_name() {
        let rows = vec![row(&[
            ("ISPB", " 12345678 "),
            ("Nome_Reduzido", "Banco X STR"),
            ("Nome_Extenso", ""),
        ])];

        let records = Normalizer::new(SourceType::StrParticipants).normalize(&rows).unwrap();
        assert_eq!(records[0].legal_name, "Banco X STR");
    }

    #[test]
    fn test_str_type_from_feed_beats_generic_default() {
        let rows = vec![row(&[("ISPB", "00000000"), ("TipoInstituicao", "Banco Comercial")])];
        let records = Normalizer::new(SourceType::StrParticipants).normalize(&rows).unwrap();
        assert_eq!(records[0].institution_type, "Banco Comercial");
    }

    #[test]
    fn test_missing_ispb_column_is_source_error() {
        let rows = vec![row(&[("Codigo", "1"), ("Nome", "X")])];
        let err = Normalizer::new(SourceType::PixParticipants).normalize(&rows).unwrap_err();
        assert!(matches!(err, SourceError::MissingIspbColumn { .. }));
    }

    #[test]
    fn test_no_rows_is_empty_not_error() {
        let records = Normalizer::new(SourceType::StrParticipants).normalize(&[]).unwrap();
        assert!(records.is_empty());
    }
}
