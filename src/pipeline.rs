// 🔄 Pipeline - one ingestion run, end to end
//
// Per feed (both feeds run concurrently):
//   fetch → decode → parse → normalize → clean → dedupe
// Then:
//   reconcile → persist
//
// A failing feed is logged and skipped. The run only fails when neither
// feed produced records, or the merged set is empty, or persisting fails.

use crate::config::PipelineConfig;
use crate::data_quality::{BatchSummary, DataQualityEngine};
use crate::decoder::{self, Encoding};
use crate::deduplication::DeduplicationEngine;
use crate::entities::{CanonicalRecord, FreshnessMetadata};
use crate::error::{PipelineError, Result, SourceError};
use crate::fetcher::{self, FetchedPayload, HttpClient, SourceDescriptor};
use crate::normalizer::Normalizer;
use crate::parser::{get_parser, SourceType};
use crate::reconciliation::{ReconciliationEngine, ReconciliationReport};
use crate::storage::SnapshotStore;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

// ============================================================================
// RESULTS
// ============================================================================

/// Validated, deduplicated records from one feed
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source_type: SourceType,
    pub records: Vec<CanonicalRecord>,
    pub encoding: Encoding,
    pub degraded_encoding: bool,
    pub raw_rows: usize,
    pub quality: BatchSummary,
    pub duplicates_dropped: usize,
    pub url: Option<String>,
}

impl SourceBatch {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, {} kept ({} rejected, {} duplicates), encoding {}{}",
            self.source_type.code(),
            self.raw_rows,
            self.records.len(),
            self.quality.rejected_count(),
            self.duplicates_dropped,
            self.encoding.name(),
            if self.degraded_encoding { " (degraded)" } else { "" }
        )
    }
}

/// Outcome of one feed: its batch, or why it was skipped
#[derive(Debug)]
pub enum SourceOutcome {
    Ingested(SourceBatch),
    Failed(SourceError),
}

impl SourceOutcome {
    fn into_records(self) -> (Option<Vec<CanonicalRecord>>, SourceOutcomeSummary) {
        match self {
            SourceOutcome::Ingested(batch) => {
                let summary = SourceOutcomeSummary::Ingested(batch.summary());
                // A feed that yielded nothing counts as absent
                let records = Some(batch.records).filter(|r| !r.is_empty());
                (records, summary)
            }
            SourceOutcome::Failed(e) => (None, SourceOutcomeSummary::Failed(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcomeSummary {
    Ingested(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub pix: SourceOutcomeSummary,
    pub str_participants: SourceOutcomeSummary,
    pub pix_only_count: usize,
    pub str_only_count: usize,
    pub merged_count: usize,
    pub metadata: FreshnessMetadata,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.metadata.total_institutions
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline<C: HttpClient> {
    config: PipelineConfig,
    client: C,
    store: SnapshotStore,
}

impl<C: HttpClient> Pipeline<C> {
    pub fn new(config: PipelineConfig, client: C) -> Self {
        let store = SnapshotStore::new(config.storage.data_dir.clone());
        Pipeline {
            config,
            client,
            store,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run against the current clock, probing from today's date in Brasília
    pub async fn run(&self) -> Result<RunReport> {
        let now = Utc::now();
        self.run_at(fetcher::publisher_today(now), now).await
    }

    /// Run with an explicit probing anchor and persistence timestamp
    pub async fn run_at(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<RunReport> {
        info!(data_dir = %self.store.data_dir().display(), "starting ingestion run");

        let pix_descriptor = SourceDescriptor::pix(&self.config);
        let str_descriptor = SourceDescriptor::str_participants(&self.config);

        let (pix, str_participants) = tokio::join!(
            self.ingest(&pix_descriptor, today),
            self.ingest(&str_descriptor, today),
        );

        let (pix_records, pix_summary) = pix.into_records();
        let (str_records, str_summary) = str_participants.into_records();

        if pix_records.is_none() && str_records.is_none() {
            warn!("no feed produced records; keeping previous snapshot");
            return Err(PipelineError::NoSourceAvailable);
        }

        let report = reconcile(pix_records, str_records);
        info!("{}", report.summary());
        if report.is_empty() {
            return Err(PipelineError::NoValidRecords);
        }

        let metadata = self.store.write(&report.records, now)?;

        Ok(RunReport {
            pix: pix_summary,
            str_participants: str_summary,
            pix_only_count: report.pix_only_count,
            str_only_count: report.str_only_count,
            merged_count: report.merged_count,
            metadata,
        })
    }

    async fn ingest(&self, descriptor: &SourceDescriptor, today: NaiveDate) -> SourceOutcome {
        let result = fetcher::fetch(&self.client, descriptor, today)
            .await
            .and_then(|payload| process_fetched(&payload));

        match result {
            Ok(batch) => {
                info!("{}", batch.summary());
                SourceOutcome::Ingested(batch)
            }
            Err(e) => {
                warn!(source = %e.source_type(), error = %e, "feed skipped");
                SourceOutcome::Failed(e)
            }
        }
    }
}

/// Everything after the download for one feed: decode, parse, normalize,
/// clean, dedupe. Pure apart from logging.
pub fn process_payload(source_type: SourceType, bytes: &[u8]) -> std::result::Result<SourceBatch, SourceError> {
    let decoded = decoder::decode(bytes);

    let rows = get_parser(source_type).parse(&decoded.text)?;
    let normalized = Normalizer::new(source_type).normalize(&rows)?;

    let cleaned = DataQualityEngine::new().clean(normalized);
    info!(source = %source_type, "{}", cleaned.summary.summary());

    let deduped = DeduplicationEngine::new().dedupe(cleaned.records);

    Ok(SourceBatch {
        source_type,
        records: deduped.records,
        encoding: decoded.encoding,
        degraded_encoding: decoded.degraded,
        raw_rows: rows.len(),
        quality: cleaned.summary,
        duplicates_dropped: deduped.duplicates.len(),
        url: None,
    })
}

/// Process an already downloaded payload
pub fn process_fetched(payload: &FetchedPayload) -> std::result::Result<SourceBatch, SourceError> {
    let mut batch = process_payload(payload.source_type, &payload.bytes)?;
    batch.url = Some(payload.url.clone());
    Ok(batch)
}

pub fn reconcile(
    pix: Option<Vec<CanonicalRecord>>,
    str_records: Option<Vec<CanonicalRecord>>,
) -> ReconciliationReport {
    ReconciliationEngine::new().reconcile(pix, str_records)
}

// ============================================================================
// TESTS
// ============================================================================
