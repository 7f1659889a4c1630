use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The acting account, as returned by `verify_credentials`. Only the id is
/// consumed; everything else rides along untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// One status, root or reply. The fields the archiver acts on are typed;
/// every other field the server sent is preserved verbatim through the
/// flattened map so the archived record loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub card: Option<Card>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Thread context for one status. Only descendants matter here; the
/// ancestors list is accepted so the payload parses, then ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub descendants: Vec<Status>,
}
