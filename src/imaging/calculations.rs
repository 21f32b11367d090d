//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output dimensions for an attached image.
///
/// Only the dominant axis is clamped: landscape images (`width > height`)
/// are scaled so the width fits `max.0`, everything else (portrait and
/// square) is scaled so the height fits `max.1`. The other axis follows the
/// same ratio and may still exceed its own maximum.
///
/// Scaled values are rounded to the nearest integer and never drop below 1.
///
/// # Arguments
/// * `source` - Natural image dimensions (width, height)
/// * `max` - Bounds as (max_width, max_height)
///
/// # Examples
/// ```
/// # use postbox::imaging::calculate_bounded_dimensions;
/// // 1600x1200 landscape → width clamped to 800
/// assert_eq!(calculate_bounded_dimensions((1600, 1200), (800, 600)), (800, 600));
///
/// // 300x1000 portrait → height clamped to 600
/// assert_eq!(calculate_bounded_dimensions((300, 1000), (800, 600)), (180, 600));
/// ```
pub fn calculate_bounded_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;

    if src_w > src_h {
        // Landscape: only the width is checked
        if src_w > max_w {
            let ratio = max_w as f64 / src_w as f64;
            return (max_w, scale_edge(src_h, ratio));
        }
    } else if src_h > max_h {
        // Portrait or square: only the height is checked
        let ratio = max_h as f64 / src_h as f64;
        return (scale_edge(src_w, ratio), max_h);
    }

    (src_w, src_h)
}

/// Whether [`calculate_bounded_dimensions`] would leave `source` untouched.
pub(crate) fn fits_within(source: (u32, u32), max: (u32, u32)) -> bool {
    calculate_bounded_dimensions(source, max) == source
}

fn scale_edge(edge: u32, ratio: f64) -> u32 {
    ((edge as f64 * ratio).round() as u32).max(1)
}
