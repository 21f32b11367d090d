//! Post composer: the attachment slot between image selection and submit.
//!
//! ```text
//! Empty ──select──▶ Processing ──ok──▶ Ready ──submit/remove──▶ Empty
//!   ▲                   │  ▲              │
//!   └──────fail─────────┘  └───select─────┘
//! ```
//!
//! Every selection (file pick or paste) takes a [`SelectionTicket`] carrying
//! a monotonically increasing sequence number. A pipeline result is only
//! committed if its ticket is still the latest one; anything older is
//! dropped and reported as [`AttachOutcome::Superseded`]. Selections are
//! therefore last-writer-wins no matter which run finishes first.
//!
//! A failed selection rolls back to whatever was attached before it started.
//!
//! The internal lock is never held while the pipeline runs or while the
//! post store is called.

mod preview;
mod validation;

pub use preview::{PreviewHandle, PreviewRegistry};
pub use validation::{CONTENT, FieldError, ValidationReport, validate_content, validate_draft};

use crate::imaging::{
    ClipboardItem, DecodeError, EncodedImage, ImageBackend, ImageProcessingFailed,
    NormalizeSettings, RawImage, clipboard_images, normalize_image,
};
use crate::posts::{NewPost, Post, PostStore, StoreError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Authenticated author. Submission is refused without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Proof that a selection was started; handed back to [`Composer::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket(u64);

/// An image held for the next submit.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub image: Arc<EncodedImage>,
    pub preview: PreviewHandle,
    pub selection: u64,
}

#[derive(Debug, Clone)]
pub enum ComposerState {
    Empty,
    Processing { selection: u64 },
    Ready(Attachment),
}

impl ComposerState {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Ready(attachment) => Some(attachment),
            _ => None,
        }
    }
}

/// What happened to a finished selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The image is now attached and previewable through the handle.
    Committed(PreviewHandle),
    /// A later selection (or a removal) started meanwhile; result dropped.
    Superseded,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("sign in to post")]
    NotAuthenticated,
    #[error("image is still being processed")]
    ImagePending,
    #[error("invalid post: {0}")]
    Invalid(ValidationReport),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
struct Inner {
    state: ComposerState,
    latest: u64,
    /// Attachment shown before the in-flight selection began; restored if
    /// that selection fails. Only set while `Processing`.
    fallback: Option<Attachment>,
    previews: PreviewRegistry,
}

impl Inner {
    fn release(&mut self, attachment: &Attachment) {
        self.previews.revoke(&attachment.preview);
    }
}

pub struct Composer<B: ImageBackend + 'static> {
    backend: Arc<B>,
    settings: NormalizeSettings,
    max_content_chars: usize,
    inner: Mutex<Inner>,
}

impl<B: ImageBackend + 'static> Composer<B> {
    pub fn new(backend: B, settings: NormalizeSettings, max_content_chars: usize) -> Self {
        Self {
            backend: Arc::new(backend),
            settings,
            max_content_chars,
            inner: Mutex::new(Inner {
                state: ComposerState::Empty,
                latest: 0,
                fallback: None,
                previews: PreviewRegistry::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ComposerState {
        self.lock().state.clone()
    }

    /// Resolve a preview handle to its image while the handle is live.
    pub fn preview_image(&self, handle: &PreviewHandle) -> Option<Arc<EncodedImage>> {
        self.lock().previews.resolve(handle)
    }

    pub fn live_previews(&self) -> usize {
        self.lock().previews.live_count()
    }

    /// Enter `Processing` for a new selection, superseding any in flight.
    pub fn begin_selection(&self) -> SelectionTicket {
        let mut inner = self.lock();
        inner.latest += 1;
        let selection = inner.latest;
        let previous = std::mem::replace(
            &mut inner.state,
            ComposerState::Processing { selection },
        );
        match previous {
            ComposerState::Ready(attachment) => inner.fallback = Some(attachment),
            ComposerState::Empty => inner.fallback = None,
            // Keep the fallback of the superseded selection
            ComposerState::Processing { .. } => {}
        }
        debug!(selection, "selection started");
        SelectionTicket(selection)
    }

    /// Commit or roll back a selection's pipeline result.
    ///
    /// Stale tickets are discarded whatever their result. For the latest
    /// ticket a success becomes the attachment and a failure restores the
    /// attachment held before the selection (or `Empty`).
    pub fn finish(
        &self,
        ticket: SelectionTicket,
        result: Result<EncodedImage, ImageProcessingFailed>,
    ) -> Result<AttachOutcome, ImageProcessingFailed> {
        let mut inner = self.lock();
        if ticket.0 != inner.latest {
            debug!(
                selection = ticket.0,
                latest = inner.latest,
                ok = result.is_ok(),
                "discarding superseded selection"
            );
            return Ok(AttachOutcome::Superseded);
        }

        match result {
            Ok(image) => {
                if let Some(previous) = inner.fallback.take() {
                    inner.release(&previous);
                }
                let image = Arc::new(image);
                let preview = inner.previews.create(Arc::clone(&image));
                info!(
                    selection = ticket.0,
                    dimensions = %image.dimensions,
                    bytes = image.len(),
                    "image attached"
                );
                inner.state = ComposerState::Ready(Attachment {
                    image,
                    preview: preview.clone(),
                    selection: ticket.0,
                });
                Ok(AttachOutcome::Committed(preview))
            }
            Err(error) => {
                warn!(selection = ticket.0, "image processing failed: {error}");
                inner.state = match inner.fallback.take() {
                    Some(previous) => ComposerState::Ready(previous),
                    None => ComposerState::Empty,
                };
                Err(error)
            }
        }
    }

    /// Normalize a selected image on the blocking pool and commit it.
    pub async fn attach(&self, raw: RawImage) -> Result<AttachOutcome, ImageProcessingFailed> {
        let ticket = self.begin_selection();
        let backend = Arc::clone(&self.backend);
        let settings = self.settings;
        let result =
            tokio::task::spawn_blocking(move || normalize_image(backend.as_ref(), &raw, &settings))
                .await
                .unwrap_or_else(|e| Err(ImageProcessingFailed::Interrupted(e.to_string())));
        self.finish(ticket, result)
    }

    /// Attach the first clipboard image that normalizes.
    ///
    /// Returns `Ok(None)` when the clipboard holds no image, leaving the
    /// composer untouched.
    pub async fn paste(
        &self,
        items: Vec<ClipboardItem>,
    ) -> Result<Option<AttachOutcome>, ImageProcessingFailed> {
        let images = clipboard_images(items);
        if images.is_empty() {
            debug!("paste without image data ignored");
            return Ok(None);
        }

        let ticket = self.begin_selection();
        let backend = Arc::clone(&self.backend);
        let settings = self.settings;
        let result = tokio::task::spawn_blocking(move || {
            normalize_first(backend.as_ref(), &images, &settings)
        })
        .await
        .unwrap_or_else(|e| Err(ImageProcessingFailed::Interrupted(e.to_string())));
        self.finish(ticket, result).map(Some)
    }

    /// Drop the attachment and cancel any selection in flight.
    pub fn remove_image(&self) {
        let mut inner = self.lock();
        inner.latest += 1;
        let previous = std::mem::replace(&mut inner.state, ComposerState::Empty);
        if let ComposerState::Ready(attachment) = previous {
            inner.release(&attachment);
        }
        if let Some(fallback) = inner.fallback.take() {
            inner.release(&fallback);
        }
        debug!("attachment removed");
    }

    /// Validate the draft and hand it to the store.
    ///
    /// On success the composer resets to `Empty`, unless a new selection
    /// replaced the submitted image while the store call was running. On
    /// any failure the composer is left as it was.
    pub fn submit(
        &self,
        content: &str,
        identity: Option<&Identity>,
        store: &dyn PostStore,
    ) -> Result<Post, SubmitError> {
        let identity = identity.ok_or(SubmitError::NotAuthenticated)?;

        let (post, submitted_selection) = {
            let inner = self.lock();
            let attachment = match &inner.state {
                ComposerState::Processing { .. } => return Err(SubmitError::ImagePending),
                ComposerState::Ready(attachment) => Some(attachment),
                ComposerState::Empty => None,
            };

            let report = validate_draft(content, attachment.is_some(), self.max_content_chars);
            if !report.is_valid() {
                return Err(SubmitError::Invalid(report));
            }

            let post = NewPost {
                content: content.to_string(),
                user_email: identity.email.clone(),
                image_url: attachment.map(|a| a.image.to_data_uri()),
            };
            (post, attachment.map(|a| a.selection))
        };

        let created = store.create(post)?;

        if let Some(selection) = submitted_selection {
            self.discard_submitted(selection);
        }
        Ok(created)
    }

    /// Drop a posted attachment wherever it is still held: as the current
    /// attachment, or stashed as the rollback target of a newer selection.
    fn discard_submitted(&self, selection: u64) {
        let mut inner = self.lock();
        let attached = matches!(
            &inner.state,
            ComposerState::Ready(attachment) if attachment.selection == selection
        );
        if attached
            && let ComposerState::Ready(attachment) =
                std::mem::replace(&mut inner.state, ComposerState::Empty)
        {
            inner.release(&attachment);
        }

        let stashed = inner
            .fallback
            .as_ref()
            .is_some_and(|attachment| attachment.selection == selection);
        if stashed && let Some(attachment) = inner.fallback.take() {
            inner.release(&attachment);
        }
    }
}

/// Try each candidate in order; the first success wins, otherwise the last
/// failure is returned.
fn normalize_first(
    backend: &impl ImageBackend,
    images: &[RawImage],
    settings: &NormalizeSettings,
) -> Result<EncodedImage, ImageProcessingFailed> {
    let mut last_error = None;
    for raw in images {
        match normalize_image(backend, raw, settings) {
            Ok(image) => return Ok(image),
            Err(error) => {
                debug!(input = raw.label(), "clipboard item rejected: {error}");
                last_error = Some(error);
            }
        }
    }
    Err(last_error.unwrap_or(ImageProcessingFailed::Decode(DecodeError::Empty)))
}
