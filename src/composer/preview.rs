//! Preview handles for attached images.
//!
//! A rendering layer shows the attached image through a [`PreviewHandle`],
//! the equivalent of a browser object URL. Handles stay resolvable until
//! revoked; the composer revokes the old one whenever its attachment changes,
//! so at most one handle per composer is live.

use crate::imaging::EncodedImage;
use std::collections::HashMap;
use std::sync::Arc;

/// Displayable reference to an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    pub id: u64,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    live: HashMap<u64, Arc<EncodedImage>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, image: Arc<EncodedImage>) -> PreviewHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, image);
        PreviewHandle {
            id,
            url: format!("blob:postbox/{id}"),
        }
    }

    /// Release a handle. Returns `false` if it was already released.
    pub fn revoke(&mut self, handle: &PreviewHandle) -> bool {
        self.live.remove(&handle.id).is_some()
    }

    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<EncodedImage>> {
        self.live.get(&handle.id).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
