use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::archive::index::{IndexEntry, IndexStore};
use crate::archive::media::MediaCache;
use crate::archive::paths::{ArchivePaths, status_base_path, status_file_path};
use crate::archive::store::StatusStore;
use crate::archive::tree::place_descendants;
use crate::logging;
use crate::mastodon::models::{Account, Status};

/// Fixed page size for the backward walk over the account's statuses.
pub const PAGE_SIZE: u32 = 40;

/// The slice of the source API the sync needs. Any error from these calls
/// is fatal to the run.
pub trait StatusSource {
    fn current_account(&self) -> Result<Account>;
    fn account_statuses(
        &self,
        account_id: &str,
        max_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Status>>;
    fn status_context(&self, status_id: &str) -> Result<Vec<Status>>;
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub statuses: usize,
    pub index_entries: usize,
    pub index_path: PathBuf,
}

/// Page backward through the account's statuses until an empty page, fully
/// processing each root (record, reply tree, media) before moving on. The
/// index accumulates in memory and is written once, after the walk ends
/// without a fatal error.
pub fn run_sync(source: &dyn StatusSource, paths: &ArchivePaths) -> Result<SyncOutcome> {
    let account = source
        .current_account()
        .context("resolving acting account")?;
    logging::info(&format!(
        "starting sync for account {} into {}",
        account.id,
        paths.status_root.display()
    ));

    let media = MediaCache::new()?;
    let store = StatusStore::new(paths, &media);
    let mut index = IndexStore::default();

    let mut max_id: Option<String> = None;
    let mut running_total = 0usize;
    loop {
        let page = source
            .account_statuses(&account.id, max_id.as_deref(), PAGE_SIZE)
            .context("listing account statuses")?;
        if page.is_empty() {
            break;
        }
        running_total += page.len();
        logging::info(&format!(
            "processing {} statuses ({running_total} so far)",
            page.len()
        ));
        max_id = page.last().map(|status| status.id.clone());

        for mut status in page {
            let id = status.id.clone();
            let created_at = status.created_at;
            let replies_count = status.replies_count;
            let base = status_base_path(created_at, &id);

            store
                .save(&mut status, &base)
                .with_context(|| format!("saving status {id}"))?;

            if replies_count > 0 {
                let descendants = source
                    .status_context(&id)
                    .with_context(|| format!("fetching context for status {id}"))?;
                place_descendants(&id, &base, descendants, |mut reply, reply_base| {
                    let reply_id = reply.id.clone();
                    store
                        .save(&mut reply, reply_base)
                        .with_context(|| format!("saving reply {reply_id}"))
                })?;
            }

            index.record(IndexEntry {
                id,
                path: status_file_path(&base).display().to_string(),
                created_at,
            });
        }
    }

    let index_entries = index.len();
    let index_path = index.write(&paths.status_root)?;
    logging::info(&format!(
        "finished sync, {running_total} statuses, {index_entries} index entries"
    ));

    Ok(SyncOutcome {
        statuses: running_total,
        index_entries,
        index_path,
    })
}
