// ISPB Registry - Core Library
// Ingests the Banco Central PIX and STR participant lists, reconciles them
// by ISPB and exposes the persisted snapshot for lookups.

pub mod config;
pub mod data_quality;   // Field cleanup + row rejection
pub mod decoder;        // Encoding fallback chain
pub mod deduplication;  // First ISPB wins within a feed
pub mod entities;       // Canonical record, metadata, registry snapshot
pub mod error;
pub mod fallback;
pub mod fetcher;        // URL resolution + date probing
pub mod logging;
pub mod normalizer;     // Feed columns → canonical fields
pub mod parser;         // Feed text → raw rows
pub mod pipeline;
pub mod reconciliation; // PIX + STR merge
pub mod storage;        // ispbs.json + last_update.json

// Re-export commonly used types
pub use config::PipelineConfig;
pub use data_quality::{BatchSummary, CleaningOutcome, DataQualityEngine, Rejection, RejectionReason};
pub use decoder::{decode, DecodedText, Encoding};
pub use deduplication::{DeduplicationEngine, DeduplicationResult, DuplicateMatch};
pub use entities::{
    CanonicalRecord, DataSource, Field, FreshnessMetadata, InstitutionRegistry, LastUpdate,
    RegistryStats, Snapshot, GENERIC_INSTITUTION_TYPE,
};
pub use error::{PipelineError, SourceError};
pub use fetcher::{FetchedPayload, HttpClient, HttpFailure, ReqwestClient, SourceDescriptor, SourceKind};
pub use normalizer::Normalizer;
pub use parser::{get_parser, FeedParser, PixParser, RawRow, SourceType, StrParser};
pub use pipeline::{Pipeline, RunReport, SourceBatch, SourceOutcomeSummary};
pub use reconciliation::{ReconciliationEngine, ReconciliationReport};
pub use storage::SnapshotStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
