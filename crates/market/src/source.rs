use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::record::{AssetRecord, Snapshot, SnapshotError};

/// Supplies a validated snapshot on demand.
pub trait SnapshotSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Snapshot, SnapshotError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<AssetRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<AssetRecord>) -> Self {
        Self { records }
    }
}

impl SnapshotSource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} records)", self.records.len())
    }

    fn load(&self) -> Result<Snapshot, SnapshotError> {
        Snapshot::new(self.records.clone())
    }
}

/// Reads a JSON array of camelCase asset records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Snapshot, SnapshotError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        let snapshot = parse_snapshot(&raw)?;
        info!(path = %self.path.display(), records = snapshot.len(), "snapshot loaded");
        Ok(snapshot)
    }
}

pub fn parse_snapshot(raw: &str) -> Result<Snapshot, SnapshotError> {
    let records: Vec<AssetRecord> = serde_json::from_str(raw)?;
    Snapshot::new(records)
}
