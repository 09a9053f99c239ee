//! Folds JSON snapshots from several runs into one document.
//!
//! Each repository keeps the block from the most recent capture it appears in, tagged with that
//! capture's `time_t`. The merged document has the same outer shape as a snapshot, so merging it
//! again returns it unchanged.

use crate::snapshot::Snapshot;
use eyre::{
    eyre,
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const MERGED_FILE_NAME: &str = "data_plugins_merged.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntry {
    #[serde(rename = "time_t")]
    pub captured_at: i64,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedSnapshot {
    #[serde(flatten)]
    pub repositories: BTreeMap<String, MergedEntry>,
    /// Latest capture time among the merged snapshots.
    #[serde(rename = "time_t")]
    pub captured_at: i64,
}

impl MergedSnapshot {
    fn absorb(&mut self, snapshot: Snapshot, source: &Path) -> Result<()> {
        self.captured_at = self.captured_at.max(snapshot.captured_at);
        for (name, block) in snapshot.blocks {
            let serde_json::Value::Object(mut data) = block else {
                return Err(eyre!("{}: entry {name:?} is not an object", source.display()));
            };
            // Entries of an already merged document carry their own capture time.
            let captured_at = match data.remove("time_t") {
                Some(value) => value
                    .as_i64()
                    .ok_or_else(|| eyre!("{}: entry {name:?} has a non-integer time_t", source.display()))?,
                None => snapshot.captured_at,
            };
            match self.repositories.get(&name) {
                Some(existing) if existing.captured_at > captured_at => {
                    trace!(repository = %name, kept = existing.captured_at, skipped = captured_at, "older block");
                }
                _ => {
                    self.repositories.insert(name, MergedEntry { captured_at, data });
                }
            }
        }
        Ok(())
    }

    /// Pretty JSON with a trailing newline, byte-for-byte stable for equal documents.
    pub fn to_json_string(&self) -> Result<String> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?).wrap_err_with(|| format!("Failed to write {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    NothingToMerge,
    Merged(MergedSnapshot),
}

/// Merges the snapshot files at `paths`. Later files win ties on capture time.
pub fn merge(paths: &[PathBuf]) -> Result<MergeOutcome> {
    if paths.is_empty() {
        return Ok(MergeOutcome::NothingToMerge);
    }

    let mut merged = MergedSnapshot::default();
    for path in paths {
        let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .wrap_err_with(|| format!("{} is not a traffic snapshot", path.display()))?;
        debug!(path = %path.display(), repositories = snapshot.blocks.len(), "merging snapshot");
        merged.absorb(snapshot, path)?;
    }
    Ok(MergeOutcome::Merged(merged))
}

/// Snapshot files written by the JSON sink in `dir`, oldest capture first.
pub fn discover_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).wrap_err_with(|| format!("Failed to list {}", dir.display()))?;
    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(captured_at) = name.to_str().and_then(Snapshot::parse_file_name) {
            snapshots.push((captured_at, entry.path()));
        }
    }
    snapshots.sort();
    Ok(snapshots.into_iter().map(|(_, path)| path).collect())
}
