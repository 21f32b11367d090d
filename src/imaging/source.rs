//! Raw image inputs.
//!
//! A file picked from disk and an image pasted from the clipboard end up as
//! the same [`RawImage`] before decoding. The declared MIME type travels with
//! the bytes for logging and clipboard filtering; the decoder itself sniffs
//! the content.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extensions mapped to the MIME type a browser would report for them.
const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// Undecoded image bytes plus the MIME type the source declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    /// Original file name, when the source had one.
    pub name: Option<String>,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a file, deriving the declared MIME type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime = mime_for_path(path).unwrap_or("application/octet-stream");
        let raw = Self::new(bytes, mime);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => raw.with_name(name),
            None => raw,
        })
    }

    /// Short label for log lines.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.mime)
    }
}

/// MIME type for a path based on its extension, if it is a known image type.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    MIME_BY_EXTENSION
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// One entry of a clipboard paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ClipboardItem {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.contains("image")
    }
}

/// Image items of a paste, in clipboard order, as raw images.
pub fn clipboard_images(items: Vec<ClipboardItem>) -> Vec<RawImage> {
    items
        .into_iter()
        .filter(ClipboardItem::is_image)
        .map(|item| RawImage::new(item.bytes, item.mime).with_name("pasted image"))
        .collect()
}

/// `<stem>.jpg` output names for a batch, one per input, all distinct.
///
/// Inputs sharing a stem (`a.png`, `a.gif`) get `-2`, `-3`, ... suffixes in
/// input order instead of overwriting each other.
pub fn jpeg_file_names(inputs: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let mut name = format!("{stem}.jpg");
            let mut n = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{stem}-{n}.jpg");
                n += 1;
            }
            name
        })
        .collect()
}
