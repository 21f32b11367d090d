//! Post store persisted to a single JSON file.
//!
//! The whole collection is loaded on open and rewritten after every
//! mutation. Posts are small apart from their embedded images, which are
//! already bounded to a few tens of kilobytes each, so a full rewrite stays
//! cheap for the volumes a single user produces.
//!
//! ## File layout
//!
//! ```json
//! {
//!   "version": 1,
//!   "next_seq": 3,
//!   "posts": [
//!     { "_id": "65f0...0001", "content": "...", "userEmail": "...", "createdAt": "..." }
//!   ]
//! }
//! ```
//!
//! Unlike a cache, this file is the data: a file that fails to parse or
//! carries a different version is an error, never silently replaced.

use super::collection::{COLLECTION_VERSION, PostCollection};
use super::{NewPost, Post, PostId, PostStore, PostUpdate, StoreError};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Store backed by one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    collection: Mutex<PostCollection>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collection = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let collection: PostCollection = serde_json::from_str(&content)?;
            if collection.version != COLLECTION_VERSION {
                return Err(StoreError::UnsupportedVersion {
                    found: collection.version,
                    expected: COLLECTION_VERSION,
                });
            }
            debug!(path = %path.display(), posts = collection.posts.len(), "opened post store");
            collection
        } else {
            debug!(path = %path.display(), "post store does not exist yet");
            PostCollection::empty()
        };

        Ok(Self {
            path,
            collection: Mutex::new(collection),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, PostCollection> {
        self.collection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the collection through a sibling temp file so a crash mid-write
    /// leaves the previous file intact.
    fn save(&self, collection: &PostCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(collection)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `mutate` and persist; the in-memory copy only changes if the
    /// write succeeds.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut PostCollection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let result = mutate(&mut next)?;
        self.save(&next)?;
        *guard = next;
        Ok(result)
    }
}

impl PostStore for JsonFileStore {
    fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = self.mutate(|collection| Ok(collection.insert(post)))?;
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
        let post = self.mutate(|collection| collection.update(id, update))?;
        info!(%id, "post updated");
        Ok(post)
    }

    fn delete(&self, id: &PostId) -> Result<Post, StoreError> {
        let post = self.mutate(|collection| collection.remove(id))?;
        info!(%id, "post deleted");
        Ok(post)
    }
}
