//! # Postbox
//!
//! The posting core of a small social app: text posts with an optional
//! image, where every attached image is normalized before it is stored.
//!
//! # Architecture: Select → Normalize → Submit
//!
//! ```text
//! 1. Select      file / clipboard  →  RawImage          (bytes + declared MIME)
//! 2. Normalize   RawImage          →  EncodedImage      (decode, bound to 800x600, JPEG q70)
//! 3. Submit      draft + image     →  Post              (image embedded as a data URI)
//! ```
//!
//! The [`composer::Composer`] owns the state between steps 1 and 3. Each
//! selection runs the normalization pipeline on tokio's blocking pool and
//! only the most recently started selection may commit its result, so rapid
//! re-selection or pasting cannot leave a stale image attached.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend trait, pure-Rust codec backend, bounded-resize math, the normalize pipeline |
//! | [`composer`] | Attachment state machine, preview handles, draft validation, submit |
//! | [`posts`] | `Post` documents and the `PostStore` trait with memory and JSON-file stores |
//! | [`config`] | `postbox.toml` loading over stock defaults, with validation |
//! | [`output`] | CLI output formatting for normalize results and post listings |
//!
//! # Design Decisions
//!
//! ## Dominant-Axis Bounding
//!
//! Only the longer side is checked against its limit (width for landscape,
//! height for portrait and square). A landscape image narrower than 800 but
//! taller than 600 is therefore kept as is. This matches how the stored
//! feed has always looked, and keeps the resize a single proportional scale
//! that never enlarges.
//!
//! ## Data URIs Instead of Blob Storage
//!
//! Posts carry their image inline as `data:image/jpeg;base64,...`. With
//! images bounded to 800x600 at quality 70 a payload stays in the tens of
//! kilobytes, so a post remains a single self-contained document and the
//! store needs no second storage system.
//!
//! ## Backend Trait
//!
//! Codec work goes through [`imaging::ImageBackend`]. The production
//! [`imaging::RustBackend`] uses the `image` crate; tests swap in a recording
//! mock so pipeline and composer logic run without real codecs.

pub mod composer;
pub mod config;
pub mod imaging;
pub mod output;
pub mod posts;

#[cfg(test)]
pub(crate) mod test_helpers;
