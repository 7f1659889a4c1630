use chrono::{DateTime, Datelike, Utc};
use std::env;
use std::path::{Path, PathBuf};

/// The two output roots. Statuses and media mirror each other: a record at
/// `<status_root>/REL/status.json` keeps its assets under `<media_root>/REL/`.
#[derive(Debug, Clone)]
pub struct ArchivePaths {
    pub status_root: PathBuf,
    pub media_root: PathBuf,
}

fn env_or_default_path(var: &str, fallback: &str) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => PathBuf::from(fallback),
    }
}

pub fn resolve_paths() -> ArchivePaths {
    ArchivePaths {
        status_root: env_or_default_path("STATUS_OUTPUT_DIR", "statuses"),
        media_root: env_or_default_path("MEDIA_OUTPUT_DIR", "media"),
    }
}

impl ArchivePaths {
    pub fn status_path(&self, rel: &Path) -> PathBuf {
        self.status_root.join(rel)
    }

    pub fn media_path(&self, rel: &Path) -> PathBuf {
        self.media_root.join(rel)
    }

    pub fn index_path(&self) -> PathBuf {
        self.status_root.join("index.json")
    }
}

/// Base path for a root status: `YYYY/MM/DD/<id>`, relative to either root.
/// Pure function of the creation date and id, so reruns land on the same
/// directory and overwrite in place.
pub fn status_base_path(created_at: DateTime<Utc>, id: &str) -> PathBuf {
    PathBuf::from(format!(
        "{:04}/{:02}/{:02}/{id}",
        created_at.year(),
        created_at.month(),
        created_at.day()
    ))
}

/// Base path for a reply, one `replies/<id>` segment below its parent.
pub fn reply_base_path(parent_base: &Path, child_id: &str) -> PathBuf {
    parent_base.join("replies").join(child_id)
}

/// The serialized record inside a base directory.
pub fn status_file_path(base: &Path) -> PathBuf {
    base.join("status.json")
}
