//! Draft validation.
//!
//! Returns every problem at once as `(field, message)` pairs instead of
//! stopping at the first, so a form can mark all offending inputs.

use std::fmt;

/// Field name used for messages about the post body.
pub const CONTENT: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Outcome of validating a draft. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Check a post body on its own (used for edits).
pub fn validate_content(content: &str, max_chars: usize, report: &mut ValidationReport) {
    let chars = content.chars().count();
    if chars > max_chars {
        report.push(
            CONTENT,
            format!("Post cannot exceed {max_chars} characters"),
        );
    }
}

/// Check a draft about to be submitted.
///
/// A post needs text or an image; whitespace-only text counts as none.
pub fn validate_draft(content: &str, has_image: bool, max_chars: usize) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_content(content, max_chars, &mut report);
    if content.trim().is_empty() && !has_image {
        report.push(CONTENT, "Post content or an image is required.");
    }
    report
}
