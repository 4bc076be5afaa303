// 🏗️ Parser Framework - one parser per Banco Central feed
// Polymorphic parser system for the PIX and STR participant lists

use crate::entities::DataSource;
use crate::error::SourceError;
use crate::fallback::first_success;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceType - which feed a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Published under a URL that embeds the publication date
    PixParticipants,
    /// Published under a fixed URL
    StrParticipants,
}

impl SourceType {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceType::PixParticipants => "PIX participants",
            SourceType::StrParticipants => "STR participants",
        }
    }

    /// Short code for internal use
    pub fn code(&self) -> &str {
        match self {
            SourceType::PixParticipants => "PIX",
            SourceType::StrParticipants => "STR",
        }
    }

    /// Provenance tag for records coming only from this feed
    pub fn data_source(&self) -> DataSource {
        match self {
            SourceType::PixParticipants => DataSource::Pix,
            SourceType::StrParticipants => DataSource::Str,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// RawRow - one CSV line as (column, value) pairs, in column order
///
/// The schema genuinely varies per feed and per revision, so rows stay
/// untyped until the normalizer maps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub line_number: usize,
    pub fields: Vec<(String, String)>,
}

impl RawRow {
    /// First value under `column` (exact header match)
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// FeedParser - decoded text in, raw rows out
pub trait FeedParser: Send + Sync {
    /// Parse decoded feed text into rows.
    ///
    /// Returns `SourceError::Parse` when the payload has no usable table.
    fn parse(&self, text: &str) -> Result<Vec<RawRow>, SourceError>;

    /// Get the source type this parser handles
    fn source_type(&self) -> SourceType;

    /// Get parser version (for provenance tracking)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// Get appropriate parser for a source type
pub fn get_parser(source_type: SourceType) -> Box<dyn FeedParser> {
    match source_type {
        SourceType::PixParticipants => Box::new(PixParser::new()),
        SourceType::StrParticipants => Box::new(StrParser::new()),
    }
}

// ============================================================================
// TABLE (shared tokenizing + cleanup)
// ============================================================================

#[derive(Debug, Clone)]
struct Table {
    headers: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    /// `skipped_lines` counts lines removed above `text`, so row numbers
    /// still point at the original payload
    fn read(text: &str, delimiter: u8, skipped_lines: usize) -> Result<Table, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 2)
                + skipped_lines;
            let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            cells.resize(headers.len(), String::new());
            rows.push((line, cells));
        }

        Ok(Table { headers, rows })
    }

    fn drop_column(&mut self, index: usize) {
        self.headers.remove(index);
        for (_, cells) in &mut self.rows {
            cells.remove(index);
        }
    }

    /// Trim header names and drop columns that are blank in every row
    fn tidy(&mut self) {
        for header in &mut self.headers {
            *header = header.trim().to_string();
        }

        let mut index = self.headers.len();
        while index > 0 {
            index -= 1;
            let all_empty = self.rows.iter().all(|(_, cells)| cells[index].trim().is_empty());
            if all_empty {
                self.drop_column(index);
            }
        }
    }

    fn into_rows(self) -> Vec<RawRow> {
        let headers = self.headers;
        self.rows
            .into_iter()
            .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
            .map(|(line_number, cells)| RawRow {
                line_number,
                fields: headers.iter().cloned().zip(cells).collect(),
            })
            .collect()
    }
}

// ============================================================================
// PIX PARSER (dated feed)
// ============================================================================

/// Title line the Banco Central sometimes puts above the header row
pub const PIX_BANNER: &str = "lista de participantes";

pub struct PixParser;

impl PixParser {
    pub fn new() -> Self {
        PixParser
    }
}

impl Default for PixParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser for PixParser {
    fn parse(&self, text: &str) -> Result<Vec<RawRow>, SourceError> {
        let parse_error = |message: String| SourceError::Parse {
            source_type: SourceType::PixParticipants,
            message,
        };

        // Banner: "Lista de participantes do Pix ..." above the real header
        let first_line = text.lines().next().unwrap_or("");
        let (body, skipped_lines) = if first_line.to_lowercase().contains(PIX_BANNER) {
            debug!("dropping PIX banner line");
            (text.split_once('\n').map(|(_, rest)| rest).unwrap_or(""), 1)
        } else {
            (text, 0)
        };

        let mut table = Table::read(body, b';', skipped_lines).map_err(|e| parse_error(e.to_string()))?;
        if table.headers.is_empty() {
            return Err(parse_error("payload has no header row".to_string()));
        }

        // Row-number column with no header
        if table.headers[0].trim().is_empty() {
            table.drop_column(0);
        }

        table.tidy();
        Ok(table.into_rows())
    }

    fn source_type(&self) -> SourceType {
        SourceType::PixParticipants
    }
}

// ============================================================================
// STR PARSER (fixed feed)
// ============================================================================

/// Delimiters tried, in order, until the header splits into several columns
pub const STR_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

pub struct StrParser;

impl StrParser {
    pub fn new() -> Self {
        StrParser
    }
}

impl Default for StrParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser for StrParser {
    fn parse(&self, text: &str) -> Result<Vec<RawRow>, SourceError> {
        let detected = first_success(STR_DELIMITERS, |delimiter| {
            let table = Table::read(text, *delimiter, 0).map_err(|e| e.to_string())?;
            if table.headers.len() > 1 {
                Ok(table)
            } else {
                Err(format!("{} column(s)", table.headers.len()))
            }
        });

        let (delimiter, mut table) = detected.map_err(|failures| SourceError::Parse {
            source_type: SourceType::StrParticipants,
            message: format!(
                "no delimiter split the header: {}",
                failures
                    .iter()
                    .map(|f| format!("{:?} -> {}", f.candidate as char, f.error))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })?;

        debug!(delimiter = ?(delimiter as char), "detected STR delimiter");
        table.tidy();
        Ok(table.into_rows())
    }

    fn source_type(&self) -> SourceType {
        SourceType::StrParticipants
    }
}

// ============================================================================
// TESTS
// ============================================================================
