//! Posts and the stores that keep them.
//!
//! A [`PostStore`] is the post-creation collaborator the composer hands its
//! payload to. It mirrors a document collection: posts are created whole,
//! listed (optionally by author email), patched field by field, and deleted
//! by id.
//!
//! Documents serialize with the field names the web client uses
//! (`_id`, `userEmail`, `imageUrl`, `createdAt`), so a store file can be
//! exported to or imported from the original collection as-is.
//!
//! | Store | Backing |
//! |---|---|
//! | [`MemoryStore`] | process memory, for tests and one-shot runs |
//! | [`JsonFileStore`] | one JSON file, rewritten after every mutation |

mod collection;
pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Post not found: {0}")]
    NotFound(PostId),
    #[error("Unsupported store version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Document identifier: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    /// Seconds since the epoch followed by a per-store sequence number,
    /// laid out like a document-database object id.
    pub fn generate(created_at: DateTime<Utc>, seq: u64) -> Self {
        Self(format!("{:08x}{:016x}", created_at.timestamp() as u32, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    #[serde(default)]
    pub content: String,
    pub user_email: String,
    /// Embedded image as a `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Set every field present in `update`, leaving the rest alone.
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(image_url) = update.image_url {
            self.image_url = Some(image_url);
        }
    }
}

/// Payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub content: String,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial update: only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.image_url.is_none()
    }
}

/// The post-creation collaborator.
pub trait PostStore: Send + Sync {
    /// Insert a post, assigning its id and creation time.
    fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    /// All posts in insertion order, or only those by `user_email`.
    fn list(&self, user_email: Option<&str>) -> Result<Vec<Post>, StoreError>;

    fn get(&self, id: &PostId) -> Result<Post, StoreError>;

    /// Apply a partial update and return the updated post.
    fn update(&self, id: &PostId, update: PostUpdate) -> Result<Post, StoreError>;

    /// Remove a post and return it.
    fn delete(&self, id: &PostId) -> Result<Post, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_post() -> Post {
        Post {
            id: PostId::from("65f000000000000000000001"),
            content: "hello".into(),
            user_email: "ada@example.com".into(),
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 12, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn generated_id_is_24_hex_chars() {
        let created = Utc.with_ymd_and_hms(2024, 3, 12, 9, 30, 0).unwrap();
        let id = PostId::generate(created, 7);
        assert_eq!(id.as_str().len(), 24);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(id.as_str().ends_with("0007"));
    }

    #[test]
    fn generated_ids_differ_by_sequence() {
        let created = Utc::now();
        assert_ne!(PostId::generate(created, 1), PostId::generate(created, 2));
    }

    #[test]
    fn post_serializes_with_document_field_names() {
        let json = serde_json::to_value(sample_post()).unwrap();
        assert_eq!(json["_id"], "65f000000000000000000001");
        assert_eq!(json["userEmail"], "ada@example.com");
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn new_post_parses_client_payload() {
        let post: NewPost = serde_json::from_str(
            r#"{"content":"hi","userEmail":"ada@example.com","imageUrl":"data:image/jpeg;base64,AA=="}"#,
        )
        .unwrap();
        assert_eq!(post.user_email, "ada@example.com");
        assert_eq!(post.image_url.as_deref(), Some("data:image/jpeg;base64,AA=="));
    }

    #[test]
    fn new_post_content_defaults_to_empty() {
        let post: NewPost = serde_json::from_str(r#"{"userEmail":"ada@example.com"}"#).unwrap();
        assert_eq!(post.content, "");
    }

    #[test]
    fn apply_sets_only_present_fields() {
        let mut post = sample_post();
        post.apply(PostUpdate {
            content: Some("edited".into()),
            image_url: None,
        });
        assert_eq!(post.content, "edited");
        assert_eq!(post.image_url, None);
        assert_eq!(post.user_email, "ada@example.com");

        post.apply(PostUpdate {
            content: None,
            image_url: Some("data:image/jpeg;base64,AA==".into()),
        });
        assert_eq!(post.content, "edited");
        assert!(post.image_url.is_some());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(PostUpdate::default().is_empty());
        assert!(
            !PostUpdate {
                content: Some(String::new()),
                image_url: None
            }
            .is_empty()
        );
    }
}
