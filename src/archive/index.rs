use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexFile {
    pub statuses: BTreeMap<String, IndexEntry>,
}

/// Per-run accumulator for the status index. One entry per root status,
/// keyed by id; the map is rebuilt whole every run and written exactly once
/// after the paginated walk completes, never merged with a previous index.
#[derive(Debug, Default)]
pub struct IndexStore {
    entries: BTreeMap<String, IndexEntry>,
}

impl IndexStore {
    pub fn record(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to `<status_root>/index.json`. Written through a tempfile
    /// in the same directory and renamed into place, so a crash mid-write
    /// never leaves a truncated index.
    pub fn write(self, status_root: &Path) -> Result<PathBuf> {
        fs::create_dir_all(status_root)
            .with_context(|| format!("creating {}", status_root.display()))?;

        let file = IndexFile {
            statuses: self.entries,
        };
        let bytes = serde_json::to_vec_pretty(&file).context("serializing index")?;

        let index_path = status_root.join("index.json");
        let mut tmp = tempfile::NamedTempFile::new_in(status_root)
            .with_context(|| format!("creating tempfile in {}", status_root.display()))?;
        tmp.write_all(&bytes)
            .with_context(|| format!("writing {}", index_path.display()))?;
        tmp.persist(&index_path)
            .with_context(|| format!("replacing {}", index_path.display()))?;
        Ok(index_path)
    }
}

pub fn read_index(path: &Path) -> Result<IndexFile> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
