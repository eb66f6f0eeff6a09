use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Forum post identifier. NodeBB hands these out as numbers, but some
/// endpoints (and older installs) serialize them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(u64),
    Text(String),
}

impl PostId {
    /// `0` and `""` are what the API sends for "no reply target".
    pub fn is_unset(&self) -> bool {
        match self {
            PostId::Number(n) => *n == 0,
            PostId::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{n}"),
            PostId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadIdentity {
    pub id: String,
    pub title: String,
    /// API root, i.e. the page URL truncated before `/topic/`.
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub username: Option<String>,
}

/// A post record as returned by `GET /api/topic/{tid}?page={n}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(default)]
    pub pid: Option<PostId>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub deleted: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub to_pid: Option<PostId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub pid: PostId,
    pub author: String,
    pub content: String,
    pub reply_to_pid: Option<PostId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadExport {
    pub title: String,
    pub posts: Vec<NormalizedPost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(rename = "pageCount")]
    pub page_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaginationResponse {
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopicPage {
    #[serde(default)]
    pub posts: Vec<Option<RawPost>>,
}

// `deleted` shows up as `true`/`false`, `0`/`1` or `"0"`/`"1"` depending on the
// NodeBB version.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Int(value)) => value != 0,
        Some(Flag::Text(value)) => matches!(value.trim(), "1" | "true"),
        None => false,
    })
}
