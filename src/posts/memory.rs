//! Post store held entirely in memory.

use super::collection::PostCollection;
use super::{NewPost, Post, PostId, PostStore, PostUpdate, StoreError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Volatile store; contents vanish with the process.
pub struct MemoryStore {
    collection: Mutex<PostCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collection: Mutex::new(PostCollection::empty()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PostCollection> {
        self.collection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStore for MemoryStore {
    fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = self.lock().insert(post);
        info!(id = %post.id, author = %post.user_email, "post created");
        Ok(post)
    }

    fn list(&self, user_email: Option<&str>) -> Result<Vec<Post>, StoreError> {
        Ok(self.lock().filter(user_email))
    }

    fn get(&self, id: &PostId) -> Result<Post, StoreError> {
        self.lock().get(id)
    }

    fn update(&self, id: &PostId, update: PostUpdate) -> Result<Post, StoreError> {
        let post = self.lock().update(id, update)?;
        info!(%id, "post updated");
        Ok(post)
    }

    fn delete(&self, id: &PostId) -> Result<Post, StoreError> {
        let post = self.lock().remove(id)?;
        info!(%id, "post deleted");
        Ok(post)
    }
}
