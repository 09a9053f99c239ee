use plugin_traffic_collector::{
    Error,
    RepositoryBlock,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeMap,
    fs::OpenOptions,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};

/// One run's data as written by the JSON sink:
/// `{ "<display name>": { "<category>": ... }, ..., "time_t": <unix timestamp> }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub blocks: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "time_t")]
    pub captured_at: i64,
}

impl Snapshot {
    pub const FILE_PREFIX: &'static str = "data_plugins_";

    pub fn new(captured_at: i64) -> Self {
        Self {
            blocks: BTreeMap::new(),
            captured_at,
        }
    }

    pub fn file_name(captured_at: i64) -> String {
        format!("{}{captured_at}.json", Self::FILE_PREFIX)
    }

    /// The capture time embedded in a snapshot file name, if `name` is one.
    pub fn parse_file_name(name: &str) -> Option<i64> {
        let digits = name.strip_prefix(Self::FILE_PREFIX)?.strip_suffix(".json")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn insert(&mut self, block: &RepositoryBlock) {
        self.blocks
            .insert(block.repository.display_name.clone(), block.to_json());
    }

    /// Writes the snapshot into `dir`. An existing file with the same name is never replaced.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(Self::file_name(self.captured_at));
        let target = path.display().to_string();
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::sink_write(target.clone(), e))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::sink_write(target.clone(), e))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .and_then(|()| file.sync_all())
            .map_err(|e| Error::sink_write(target, e))?;
        Ok(path)
    }
}
