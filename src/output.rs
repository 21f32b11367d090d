//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions are pure so the
//! layout is tested without capturing stdout.
//!
//! # Output Format
//!
//! ## Normalize
//!
//! ```text
//! 001 beach.png
//!     1600x1200 → 800x600 (48211 bytes, q70)
//!     Output: out/beach.jpg
//! 002 broken.jpg
//!     Failed: Failed to process image.
//!
//! Normalized 1 image, 1 failed
//! ```
//!
//! ## Post list
//!
//! ```text
//! 001 66f1c0de0000000000000001 ada@example.com
//!     2026-10-19 09:30 UTC
//!     First post from the beach
//!     Image: image/jpeg, 48211 bytes
//!
//! 1 post
//! ```

use crate::imaging::{EncodedImage, ImageProcessingFailed, data_uri};
use crate::posts::Post;
use std::path::Path;

/// Longest content excerpt shown in list views.
const EXCERPT_CHARS: usize = 60;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_pos, _)) => format!("{}...", &text[..byte_pos]),
        None => text.to_string(),
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Describe an embedded image URL without dumping its payload.
fn image_summary(image_url: &str) -> String {
    match data_uri::decode(image_url) {
        Ok((mime, bytes)) => format!("{mime}, {} bytes", bytes.len()),
        Err(_) => "unreadable image data".to_string(),
    }
}

// ============================================================================
// Normalize
// ============================================================================

/// Outcome of normalizing one input file.
pub struct NormalizeReport<'a> {
    pub input: &'a str,
    pub result: &'a Result<EncodedImage, ImageProcessingFailed>,
    pub output: Option<&'a Path>,
}

pub fn format_normalize_entry(index: usize, report: &NormalizeReport<'_>) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), report.input)];
    match report.result {
        Ok(image) => {
            lines.push(format!(
                "{}{} \u{2192} {} ({} bytes, q{})",
                indent(1),
                image.source_dimensions,
                image.dimensions,
                image.len(),
                image.quality.value()
            ));
            if let Some(path) = report.output {
                lines.push(format!("{}Output: {}", indent(1), path.display()));
            }
        }
        Err(error) => {
            lines.push(format!("{}Failed: {}", indent(1), error.user_message()));
            lines.push(format!("{}Reason: {}", indent(1), error));
        }
    }
    lines
}

pub fn format_normalize_output(reports: &[NormalizeReport<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, report) in reports.iter().enumerate() {
        lines.extend(format_normalize_entry(i + 1, report));
    }

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    let ok = reports.len() - failed;
    lines.push(String::new());
    if failed == 0 {
        lines.push(format!("Normalized {}", plural(ok, "image")));
    } else {
        lines.push(format!("Normalized {}, {} failed", plural(ok, "image"), failed));
    }
    lines
}

pub fn print_normalize_output(reports: &[NormalizeReport<'_>]) {
    for line in format_normalize_output(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Posts
// ============================================================================

fn post_header(index: usize, post: &Post) -> String {
    format!("{} {} {}", format_index(index), post.id, post.user_email)
}

fn timestamp(post: &Post) -> String {
    post.created_at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// One post as it appears in a list: header plus indented context lines.
pub fn format_post_entry(index: usize, post: &Post) -> Vec<String> {
    let mut lines = vec![post_header(index, post)];
    lines.push(format!("{}{}", indent(1), timestamp(post)));
    if !post.content.is_empty() {
        let first_line = post.content.lines().next().unwrap_or_default();
        lines.push(format!(
            "{}{}",
            indent(1),
            truncate_chars(first_line, EXCERPT_CHARS)
        ));
    }
    if let Some(url) = &post.image_url {
        lines.push(format!("{}Image: {}", indent(1), image_summary(url)));
    }
    lines
}

pub fn format_post_list(posts: &[Post]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        lines.extend(format_post_entry(i + 1, post));
    }
    if !posts.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(posts.len(), "post"));
    lines
}

pub fn print_post_list(posts: &[Post]) {
    for line in format_post_list(posts) {
        println!("{}", line);
    }
}

/// Full view of a single post, with the complete content.
pub fn format_post_detail(post: &Post) -> Vec<String> {
    let mut lines = vec![
        format!("Id: {}", post.id),
        format!("Author: {}", post.user_email),
        format!("Created: {}", timestamp(post)),
    ];
    if let Some(url) = &post.image_url {
        lines.push(format!("Image: {}", image_summary(url)));
    }
    if !post.content.is_empty() {
        lines.push(String::new());
        lines.extend(post.content.lines().map(str::to_string));
    }
    lines
}

pub fn print_post_detail(post: &Post) {
    for line in format_post_detail(post) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{DecodeError, Dimensions, JPEG_MIME, Quality};
    use crate::posts::PostId;
    use chrono::{TimeZone, Utc};

    fn post(content: &str, image_url: Option<String>) -> Post {
        Post {
            id: PostId::from("66f1c0de0000000000000001"),
            content: content.to_string(),
            user_email: "ada@example.com".to_string(),
            image_url,
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap(),
        }
    }

    fn encoded() -> EncodedImage {
        EncodedImage {
            bytes: vec![0; 1234],
            mime: JPEG_MIME,
            quality: Quality::new(70),
            dimensions: Dimensions::new(800, 600),
            source_dimensions: Dimensions::new(1600, 1200),
        }
    }

    #[test]
    fn truncate_chars_short() {
        assert_eq!(truncate_chars("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_chars_exact() {
        let text = "a".repeat(40);
        assert_eq!(truncate_chars(&text, 40), text);
    }

    #[test]
    fn truncate_chars_multibyte() {
        let text = "é".repeat(50);
        assert_eq!(truncate_chars(&text, 3), "ééé...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn normalize_success_entry() {
        let result = Ok(encoded());
        let report = NormalizeReport {
            input: "beach.png",
            result: &result,
            output: Some(Path::new("out/beach.jpg")),
        };
        assert_eq!(
            format_normalize_entry(1, &report),
            vec![
                "001 beach.png",
                "    1600x1200 \u{2192} 800x600 (1234 bytes, q70)",
                "    Output: out/beach.jpg",
            ]
        );
    }

    #[test]
    fn normalize_summary_counts_failures() {
        let ok = Ok(encoded());
        let failed = Err(ImageProcessingFailed::Decode(DecodeError::Empty));
        let reports = [
            NormalizeReport {
                input: "a.jpg",
                result: &ok,
                output: None,
            },
            NormalizeReport {
                input: "b.jpg",
                result: &failed,
                output: None,
            },
        ];
        let lines = format_normalize_output(&reports);
        assert!(lines.contains(&"    Failed: Failed to process image.".to_string()));
        assert_eq!(lines.last().unwrap(), "Normalized 1 image, 1 failed");
    }

    #[test]
    fn post_entry_shows_excerpt_and_image() {
        let url = data_uri::encode("image/jpeg", &[1, 2, 3, 4]);
        let long = format!("{}\nsecond line", "x".repeat(80));
        let lines = format_post_entry(2, &post(&long, Some(url)));

        assert_eq!(lines[0], "002 66f1c0de0000000000000001 ada@example.com");
        assert_eq!(lines[1], "    2026-10-19 09:30 UTC");
        assert_eq!(lines[2], format!("    {}...", "x".repeat(60)));
        assert_eq!(lines[3], "    Image: image/jpeg, 4 bytes");
    }

    #[test]
    fn empty_list_reports_zero_posts() {
        assert_eq!(format_post_list(&[]), vec!["0 posts"]);
    }

    #[test]
    fn detail_includes_full_content() {
        let lines = format_post_detail(&post("line one\nline two", None));
        assert_eq!(lines[0], "Id: 66f1c0de0000000000000001");
        assert_eq!(&lines[lines.len() - 2..], ["line one", "line two"]);
    }
}
