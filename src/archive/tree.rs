use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::archive::paths::reply_base_path;
use crate::logging;
use crate::mastodon::models::Status;

/// Rebuild the direct-reply tree from the flat descendant list and hand
/// every reachable node to `sink` along with its base path, parent always
/// before child.
///
/// Single pass in source order: a descendant replying to the root or to an
/// already-placed node is placed; anything else is an orphan and is skipped
/// with a diagnostic. Because an orphan never enters the placement map, its
/// own descendants fail the lookup too and are skipped the same way. This
/// assumes the source lists parents before children; a child arriving first
/// is treated as an orphan, there is no re-ordering or second pass.
pub fn place_descendants<F>(
    root_id: &str,
    root_base: &Path,
    descendants: Vec<Status>,
    mut sink: F,
) -> Result<()>
where
    F: FnMut(Status, &Path) -> Result<()>,
{
    let mut placed: BTreeMap<String, PathBuf> = BTreeMap::new();

    for descendant in descendants {
        let base = match descendant.in_reply_to_id.as_deref() {
            Some(parent) if parent == root_id => reply_base_path(root_base, &descendant.id),
            Some(parent) => match placed.get(parent) {
                Some(parent_base) => reply_base_path(parent_base, &descendant.id),
                None => {
                    logging::warn("ORPHAN_REPLY", &descendant.id, parent, "parent not placed");
                    continue;
                }
            },
            None => {
                logging::warn("ORPHAN_REPLY", &descendant.id, "none", "descendant has no parent id");
                continue;
            }
        };

        placed.insert(descendant.id.clone(), base.clone());
        sink(descendant, &base)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::place_descendants;
    use crate::mastodon::models::Status;
    use chrono::{TimeZone, Utc};
    use std::path::{Path, PathBuf};

    fn reply(id: &str, parent: Option<&str>) -> Status {
        Status {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            in_reply_to_id: parent.map(str::to_string),
            replies_count: 0,
            media_attachments: Vec::new(),
            card: None,
            rest: serde_json::Map::new(),
        }
    }

    fn collect(root_id: &str, root_base: &Path, descendants: Vec<Status>) -> Vec<(String, PathBuf)> {
        let mut out = Vec::new();
        place_descendants(root_id, root_base, descendants, |status, base| {
            out.push((status.id, base.to_path_buf()));
            Ok(())
        })
        .expect("placement should not fail");
        out
    }

    #[test]
    fn chains_nest_and_unknown_parents_are_excluded() {
        let placed = collect(
            "R1",
            Path::new("2024/03/05/R1"),
            vec![
                reply("C1", Some("R1")),
                reply("C2", Some("C1")),
                reply("C3", Some("unknown")),
            ],
        );

        assert_eq!(
            placed,
            vec![
                ("C1".to_string(), PathBuf::from("2024/03/05/R1/replies/C1")),
                (
                    "C2".to_string(),
                    PathBuf::from("2024/03/05/R1/replies/C1/replies/C2")
                ),
            ]
        );
    }

    #[test]
    fn orphan_subtrees_are_dropped_whole() {
        // X replies to a status outside this thread; Y replies to X. Neither
        // may be placed, even though Y's parent appears in the input.
        let placed = collect(
            "R1",
            Path::new("2024/03/05/R1"),
            vec![
                reply("X", Some("elsewhere")),
                reply("Y", Some("X")),
                reply("C1", Some("R1")),
            ],
        );

        assert_eq!(
            placed,
            vec![("C1".to_string(), PathBuf::from("2024/03/05/R1/replies/C1"))]
        );
    }

    #[test]
    fn child_arriving_before_parent_is_an_orphan() {
        let placed = collect(
            "R1",
            Path::new("2024/03/05/R1"),
            vec![reply("C2", Some("C1")), reply("C1", Some("R1"))],
        );

        assert_eq!(
            placed,
            vec![("C1".to_string(), PathBuf::from("2024/03/05/R1/replies/C1"))]
        );
    }

    #[test]
    fn parentless_descendant_is_skipped() {
        let placed = collect("R1", Path::new("2024/03/05/R1"), vec![reply("C1", None)]);
        assert!(placed.is_empty());
    }

    #[test]
    fn sink_error_propagates() {
        let err = place_descendants(
            "R1",
            Path::new("2024/03/05/R1"),
            vec![reply("C1", Some("R1"))],
            |_, _| anyhow::bail!("disk full"),
        )
        .expect_err("sink failure should bubble");
        assert!(err.to_string().contains("disk full"));
    }
}
