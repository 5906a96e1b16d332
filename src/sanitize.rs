//! Text Sanitizer: converts raw multi-line text into markup-safe rich text.
//!
//! Long-form descriptive fields (protocol description, overview, comments)
//! are displayed by rich-text widgets that collapse literal whitespace, so
//! newlines, tabs, and spaces are encoded as HTML entities.

/// Encode a descriptive text field for rich-text display.
///
/// Substitutions run in this exact order; later passes must not re-touch
/// earlier output (the markers contain no whitespace):
///
/// 1. newline -> `<br>`
/// 2. tab -> four `&nbsp;` entities
/// 3. space -> `&nbsp;`
///
/// The function is pure but NOT idempotent: sanitizing already-sanitized
/// text double-escapes it. Callers sanitize exactly once, directly after
/// decoding from the container.
pub fn sanitize_richtext(raw: &str) -> String {
    raw.replace('\n', "<br>")
        .replace('\t', "&nbsp;&nbsp;&nbsp;&nbsp;")
        .replace(' ', "&nbsp;")
}
