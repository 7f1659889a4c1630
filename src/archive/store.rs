use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::archive::media::{MediaCache, url_extension};
use crate::archive::paths::{ArchivePaths, status_file_path};
use crate::logging;
use crate::mastodon::models::Status;

/// Persists one status (root or reply) at a computed base path, pulling its
/// media through the cache first. Media references that resolve are
/// rewritten in memory to archive-relative paths before the record is
/// serialized; references that fail stay remote and the failure is logged.
pub struct StatusStore<'a> {
    paths: &'a ArchivePaths,
    media: &'a MediaCache,
}

impl<'a> StatusStore<'a> {
    pub fn new(paths: &'a ArchivePaths, media: &'a MediaCache) -> Self {
        Self { paths, media }
    }

    pub fn save(&self, status: &mut Status, base: &Path) -> Result<()> {
        let status_dir = self.paths.status_path(base);
        fs::create_dir_all(&status_dir)
            .with_context(|| format!("creating {}", status_dir.display()))?;
        let media_dir = self.paths.media_path(base);
        fs::create_dir_all(&media_dir)
            .with_context(|| format!("creating {}", media_dir.display()))?;

        self.resolve_card(status, base);
        self.resolve_attachments(status, base);

        let record = serde_json::to_vec_pretty(status)
            .with_context(|| format!("serializing status {}", status.id))?;
        let record_path = self.paths.status_path(&status_file_path(base));
        fs::write(&record_path, record)
            .with_context(|| format!("writing {}", record_path.display()))?;
        Ok(())
    }

    fn resolve_card(&self, status: &mut Status, base: &Path) {
        let Some(card) = status.card.as_mut() else {
            return;
        };
        let Some(image) = card.image.clone().filter(|url| !url.is_empty()) else {
            return;
        };

        let rel = base.join(format!("card_image{}", url_extension(&image)));
        match self.media.resolve(&image, &self.paths.media_path(&rel)) {
            Ok(()) => card.image = Some(rel.display().to_string()),
            Err(err) => {
                logging::warn("MEDIA_FETCH_FAILED", &status.id, "card_image", &err.to_string());
            }
        }
    }

    fn resolve_attachments(&self, status: &mut Status, base: &Path) {
        let status_id = status.id.clone();
        for attachment in &mut status.media_attachments {
            // Prefer the origin server's copy when the status was federated in.
            let url = attachment
                .remote_url
                .clone()
                .filter(|u| !u.is_empty())
                .or_else(|| attachment.url.clone().filter(|u| !u.is_empty()));
            let Some(url) = url else {
                continue;
            };

            let rel = base.join(format!(
                "media_attachment_{}{}",
                attachment.id,
                url_extension(&url)
            ));
            match self.media.resolve(&url, &self.paths.media_path(&rel)) {
                Ok(()) => {
                    attachment.remote_url = Some(url);
                    attachment.url = Some(rel.display().to_string());
                }
                Err(err) => {
                    logging::warn(
                        "MEDIA_FETCH_FAILED",
                        &status_id,
                        &attachment.id,
                        &err.to_string(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatusStore;
    use crate::archive::media::MediaCache;
    use crate::archive::paths::ArchivePaths;
    use crate::mastodon::models::{Card, MediaAttachment, Status};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn roots(tmp: &Path) -> ArchivePaths {
        ArchivePaths {
            status_root: tmp.join("statuses"),
            media_root: tmp.join("media"),
        }
    }

    fn status(id: &str) -> Status {
        let mut rest = serde_json::Map::new();
        rest.insert("content".to_string(), serde_json::json!("<p>hi</p>"));
        Status {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            in_reply_to_id: None,
            replies_count: 0,
            media_attachments: Vec::new(),
            card: None,
            rest,
        }
    }

    fn attachment(id: &str, url: &str) -> MediaAttachment {
        MediaAttachment {
            id: id.to_string(),
            url: Some(url.to_string()),
            remote_url: None,
            rest: serde_json::Map::new(),
        }
    }

    #[test]
    fn save_writes_record_with_payload_intact() {
        let tmp = tempdir().expect("tempdir");
        let paths = roots(tmp.path());
        let media = MediaCache::new().expect("cache");
        let store = StatusStore::new(&paths, &media);

        let mut root = status("R1");
        store
            .save(&mut root, Path::new("2024/03/05/R1"))
            .expect("save");

        let raw = fs::read_to_string(tmp.path().join("statuses/2024/03/05/R1/status.json"))
            .expect("record exists");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["id"], "R1");
        assert_eq!(value["content"], "<p>hi</p>");
        // The parallel media directory exists even when nothing was fetched.
        assert!(tmp.path().join("media/2024/03/05/R1").is_dir());
    }

    #[test]
    fn already_cached_attachment_is_rewritten_without_a_fetch() {
        let tmp = tempdir().expect("tempdir");
        let paths = roots(tmp.path());
        let media = MediaCache::new().expect("cache");
        let store = StatusStore::new(&paths, &media);

        // Seed the asset a previous run would have left; the URL's host does
        // not resolve, so a fetch attempt would fail loudly.
        let asset = tmp.path().join("media/2024/03/05/R1/media_attachment_A1.png");
        fs::create_dir_all(asset.parent().expect("parent")).expect("mkdir");
        fs::write(&asset, b"cached bytes").expect("seed asset");

        let mut root = status("R1");
        root.media_attachments
            .push(attachment("A1", "http://unreachable.invalid/pic.png"));
        store
            .save(&mut root, Path::new("2024/03/05/R1"))
            .expect("save");

        let saved = root.media_attachments.first().expect("attachment");
        assert_eq!(saved.url.as_deref(), Some("2024/03/05/R1/media_attachment_A1.png"));
        assert_eq!(
            saved.remote_url.as_deref(),
            Some("http://unreachable.invalid/pic.png")
        );
        assert_eq!(fs::read(&asset).expect("asset intact"), b"cached bytes");
    }

    #[test]
    fn failed_media_leaves_reference_remote_and_status_persisted() {
        let tmp = tempdir().expect("tempdir");
        let paths = roots(tmp.path());
        let media = MediaCache::new().expect("cache");
        let store = StatusStore::new(&paths, &media);

        // A2 resolves from the pre-seeded cache, A3's fetch fails.
        let cached = tmp.path().join("media/2024/03/05/R1/media_attachment_A2.jpg");
        fs::create_dir_all(cached.parent().expect("parent")).expect("mkdir");
        fs::write(&cached, b"ok").expect("seed asset");

        let mut root = status("R1");
        root.media_attachments
            .push(attachment("A2", "http://unreachable.invalid/a.jpg"));
        root.media_attachments
            .push(attachment("A3", "http://127.0.0.1:9/b.jpg"));
        store
            .save(&mut root, Path::new("2024/03/05/R1"))
            .expect("one failed download must not abort the save");

        let raw = fs::read_to_string(tmp.path().join("statuses/2024/03/05/R1/status.json"))
            .expect("record exists");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(
            value["media_attachments"][0]["url"],
            "2024/03/05/R1/media_attachment_A2.jpg"
        );
        assert_eq!(value["media_attachments"][1]["url"], "http://127.0.0.1:9/b.jpg");
        assert!(value["media_attachments"][1]["remote_url"].is_null());
    }

    #[test]
    fn card_image_is_cached_under_its_own_name() {
        let tmp = tempdir().expect("tempdir");
        let paths = roots(tmp.path());
        let media = MediaCache::new().expect("cache");
        let store = StatusStore::new(&paths, &media);

        let seeded = tmp.path().join("media/2024/03/05/R1/card_image.png");
        fs::create_dir_all(seeded.parent().expect("parent")).expect("mkdir");
        fs::write(&seeded, b"card").expect("seed asset");

        let mut root = status("R1");
        root.card = Some(Card {
            image: Some("http://unreachable.invalid/preview.png".to_string()),
            rest: serde_json::Map::new(),
        });
        store
            .save(&mut root, Path::new("2024/03/05/R1"))
            .expect("save");

        let card = root.card.expect("card kept");
        assert_eq!(card.image.as_deref(), Some("2024/03/05/R1/card_image.png"));
    }
}
