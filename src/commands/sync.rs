use anyhow::Result;

use crate::archive::paths::resolve_paths;
use crate::archive::sync::run_sync;
use crate::commands::CommandReport;
use crate::mastodon::client::{MastodonClient, MastodonConfig};

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("sync");

    let paths = resolve_paths();
    let client = MastodonClient::new(MastodonConfig::from_env()?)?;

    let outcome = run_sync(&client, &paths)?;

    report.detail(format!("archived {} statuses", outcome.statuses));
    report.detail(format!(
        "wrote {} index entries to {}",
        outcome.index_entries,
        outcome.index_path.display()
    ));
    Ok(report)
}
