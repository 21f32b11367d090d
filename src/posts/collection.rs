//! In-memory document collection shared by every store.
//!
//! Stores wrap a [`PostCollection`] in a mutex and decide what happens around
//! each mutation (nothing for memory, a file rewrite for JSON).

use super::{NewPost, Post, PostId, PostUpdate, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Version of the serialized collection. Bump when the layout changes.
pub(crate) const COLLECTION_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PostCollection {
    pub version: u32,
    /// Sequence number for the next generated id.
    pub next_seq: u64,
    pub posts: Vec<Post>,
}

impl PostCollection {
    pub fn empty() -> Self {
        Self {
            version: COLLECTION_VERSION,
            next_seq: 1,
            posts: Vec::new(),
        }
    }

    pub fn insert(&mut self, post: NewPost) -> Post {
        let created_at = Utc::now();
        let post = Post {
            id: PostId::generate(created_at, self.next_seq),
            content: post.content,
            user_email: post.user_email,
            image_url: post.image_url,
            created_at,
        };
        self.next_seq += 1;
        self.posts.push(post.clone());
        post
    }

    pub fn filter(&self, user_email: Option<&str>) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|post| user_email.is_none_or(|email| post.user_email == email))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &PostId) -> Result<Post, StoreError> {
        self.posts
            .iter()
            .find(|post| post.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub fn update(&mut self, id: &PostId, update: PostUpdate) -> Result<Post, StoreError> {
        let post = self
            .posts
            .iter_mut()
            .find(|post| post.id == *id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        post.apply(update);
        Ok(post.clone())
    }

    pub fn remove(&mut self, id: &PostId) -> Result<Post, StoreError> {
        let index = self
            .posts
            .iter()
            .position(|post| post.id == *id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(self.posts.remove(index))
    }
}
