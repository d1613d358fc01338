//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit a source inside a preset box, preserving aspect ratio.
///
/// Aspect-fit, not fill: the whole source is visible and the result never
/// exceeds the box. The binding dimension matches the box exactly, the other
/// is scaled and rounded to the nearest pixel (never below 1). Sources
/// smaller than the box are scaled up.
///
/// Zero-sized inputs are treated as 1 so the math stays finite.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Preset box (width, height)
///
/// # Examples
/// ```
/// # use imgbatch::imaging::fit;
/// // 2:1 landscape into a square box → width binds
/// assert_eq!(fit((4000, 2000), (800, 800)), (800, 400));
///
/// // Same source into a 16:9 banner → width still binds
/// assert_eq!(fit((4000, 2000), (1920, 1080)), (1920, 960));
/// ```
pub fn fit(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is relatively wider: width binds
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.clamp(1, tgt_h))
    } else {
        // Source is relatively taller (or equal): height binds
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.clamp(1, tgt_w), tgt_h)
    }
}
