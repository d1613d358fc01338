//! Output base names and archive file names.
//!
//! Every derivative is written as `{output_name}.{ext}`. The output name
//! starts as the source file name without its last extension and can be
//! edited per source before the batch runs.
//!
//! ## Collision suffixes
//!
//! When two derivatives land on the same file name inside one preset folder,
//! later ones get a numeric suffix: `shoe.webp`, `shoe-2.webp`, `shoe-3.webp`.
//! [`suffixed_file_name`] builds those names; the policy that picks `n`
//! lives in [`archive`](crate::archive).

/// Derive the default output base name from a file name.
///
/// Strips everything from the last `.` onward. If that leaves nothing
/// (a dotfile like `.hidden`) or there is no dot, the full name is kept.
///
/// - `"shoe.png"` → `"shoe"`
/// - `"shoe.side.jpg"` → `"shoe.side"`
/// - `"README"` → `"README"`
/// - `".hidden"` → `".hidden"`
pub fn default_output_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name[..pos].to_string(),
        _ => file_name.to_string(),
    }
}

/// Clean a user-edited output name.
///
/// Path separators are replaced with `-` so a name can never escape its
/// preset folder, and surrounding whitespace is trimmed. Returns `None`
/// when nothing usable is left.
pub fn sanitize_output_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// Used when a name has nothing usable left after sanitizing.
pub const FALLBACK_OUTPUT_NAME: &str = "image";

/// [`sanitize_output_name`], falling back to [`FALLBACK_OUTPUT_NAME`].
///
/// The result is always a single path component.
pub fn safe_output_name(name: &str) -> String {
    sanitize_output_name(name).unwrap_or_else(|| FALLBACK_OUTPUT_NAME.to_string())
}

/// `{name}.{ext}`, or `{name}-{n}.{ext}` when a suffix is given.
pub fn suffixed_file_name(name: &str, suffix: Option<u32>, ext: &str) -> String {
    match suffix {
        Some(n) => format!("{name}-{n}.{ext}"),
        None => format!("{name}.{ext}"),
    }
}
