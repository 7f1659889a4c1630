use anyhow::Result;

use crate::archive::index::read_index;
use crate::archive::paths::{ArchivePaths, resolve_paths};
use crate::commands::CommandReport;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths();
    Ok(check(&paths))
}

/// Confirm every index entry points at an existing serialized status. Does
/// not touch the network; a run interrupted before its index write shows up
/// here as a missing or stale index.
fn check(paths: &ArchivePaths) -> CommandReport {
    let mut report = CommandReport::new("verify");

    let index_path = paths.index_path();
    let index = match read_index(&index_path) {
        Ok(index) => index,
        Err(err) => {
            report.issue(format!("index unreadable: {err:#}"));
            return report;
        }
    };

    let mut missing = 0usize;
    for (id, entry) in &index.statuses {
        let record = paths.status_path(std::path::Path::new(&entry.path));
        if !record.is_file() {
            missing += 1;
            report.issue(format!("{id}: missing record {}", record.display()));
        }
    }

    report.detail(format!(
        "checked {} entries in {}, {missing} missing",
        index.statuses.len(),
        index_path.display()
    ));
    report
}
