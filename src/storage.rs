// 💾 Snapshot Store - the two JSON artifacts the query side reads
//
// ispbs.json        full record list
// last_update.json  freshness metadata
//
// A new run fully replaces both. Files are staged next to their targets and
// renamed in place, records first, so readers never see a half-written file.

use crate::entities::{CanonicalRecord, FreshnessMetadata, Snapshot};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RECORDS_FILE: &str = "ispbs.json";
pub const METADATA_FILE: &str = "last_update.json";

pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILE)
    }

    /// Persist records and freshly computed metadata
    pub fn write(&self, records: &[CanonicalRecord], now: DateTime<Utc>) -> Result<FreshnessMetadata> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        let records_json =
            serde_json::to_vec_pretty(records).context("Failed to serialize records")?;
        let metadata = FreshnessMetadata::for_records(records, now, sha256_hex(&records_json));
        let metadata_json =
            serde_json::to_vec_pretty(&metadata).context("Failed to serialize metadata")?;

        let records_path = self.records_path();
        let metadata_path = self.metadata_path();
        let records_staged = staging_path(&records_path);
        let metadata_staged = staging_path(&metadata_path);

        // Stage both; nothing visible has changed if this fails
        write_file(&records_staged, &records_json)?;
        if let Err(e) = write_file(&metadata_staged, &metadata_json) {
            let _ = fs::remove_file(&records_staged);
            return Err(e);
        }

        if let Err(e) = fs::rename(&records_staged, &records_path) {
            let _ = fs::remove_file(&records_staged);
            let _ = fs::remove_file(&metadata_staged);
            return Err(e).with_context(|| {
                format!("Failed to move records into place: {}", records_path.display())
            });
        }

        fs::rename(&metadata_staged, &metadata_path).with_context(|| {
            format!(
                "Records were replaced but metadata was not; {} is stale",
                metadata_path.display()
            )
        })?;

        info!(
            records = records.len(),
            path = %records_path.display(),
            "snapshot written"
        );
        Ok(metadata)
    }

    /// Read back the last snapshot; an empty store yields an empty snapshot
    pub fn load(&self) -> Result<Snapshot> {
        let records_path = self.records_path();
        if !records_path.exists() {
            return Ok(Snapshot::empty());
        }

        let records_json = fs::read(&records_path)
            .with_context(|| format!("Failed to read {}", records_path.display()))?;
        let records: Vec<CanonicalRecord> = serde_json::from_slice(&records_json)
            .with_context(|| format!("Failed to parse {}", records_path.display()))?;

        let metadata_path = self.metadata_path();
        let metadata = if metadata_path.exists() {
            let content = fs::read(&metadata_path)
                .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
            serde_json::from_slice(&content)
                .with_context(|| format!("Failed to parse {}", metadata_path.display()))?
        } else {
            FreshnessMetadata::never()
        };

        Ok(Snapshot { records, metadata })
    }

    /// Checksum recorded by the last write, if any
    pub fn current_checksum(&self) -> Result<Option<String>> {
        let metadata_path = self.metadata_path();
        if !metadata_path.exists() {
            return Ok(None);
        }
        let content = fs::read(&metadata_path)
            .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
        let metadata: FreshnessMetadata = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse {}", metadata_path.display()))?;
        Ok(Some(metadata.records_sha256).filter(|s| !s.is_empty()))
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    target.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
