use crate::parser::SourceType;
use thiserror::Error;

/// A failure confined to one feed. The run carries on with the other one.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{source_type}: HTTP request to {url} failed: {message}")]
    Http {
        source_type: SourceType,
        url: String,
        message: String,
    },

    #[error("{source_type}: {url} answered with status {status}")]
    Status {
        source_type: SourceType,
        url: String,
        status: u16,
    },

    #[error("{source_type}: no candidate URL succeeded after {attempts} attempt(s)")]
    Unavailable {
        source_type: SourceType,
        attempts: usize,
    },

    #[error("{source_type}: could not parse payload: {message}")]
    Parse {
        source_type: SourceType,
        message: String,
    },

    #[error("{source_type}: no ISPB column among {columns:?}")]
    MissingIspbColumn {
        source_type: SourceType,
        columns: Vec<String>,
    },
}

impl SourceError {
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceError::Http { source_type, .. }
            | SourceError::Status { source_type, .. }
            | SourceError::Unavailable { source_type, .. }
            | SourceError::Parse { source_type, .. }
            | SourceError::MissingIspbColumn { source_type, .. } => *source_type,
        }
    }
}

/// A failure that aborts the whole run and leaves the last snapshot untouched
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no source could be fetched and parsed")]
    NoSourceAvailable,

    #[error("reconciliation produced zero valid records")]
    NoValidRecords,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("persisting snapshot failed: {0:#}")]
    Persist(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
