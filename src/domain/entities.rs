//! Domain entities mirrored from the upstream content API.

use serde::{Deserialize, Serialize};

/// A content item fetched from the upstream content API.
///
/// Records are immutable once fetched; the fetch layer owns them and they live
/// until evicted from the cache or the process exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(rename = "userId")]
    pub owner_id: i64,
    pub title: String,
    pub body: String,
}

impl Record {
    pub fn new(id: i64, owner_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            title: title.into(),
            body: body.into(),
        }
    }
}
