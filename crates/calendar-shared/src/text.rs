//! Free-text cleanup applied to user supplied event fields.

/// Longest string `sanitize_string` will return, in characters.
pub const MAX_SANITIZED_LEN: usize = 1000;

/// Strip angle brackets, trim, and cap the length of a free-text field.
///
/// Returns `None` for absent input and for input that is empty once cleaned,
/// so applying it twice gives the same result as applying it once.
pub fn sanitize_string(input: Option<&str>) -> Option<String> {
    let input = input?;
    if input.is_empty() {
        return None;
    }

    let stripped: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let truncated: String = stripped.trim().chars().take(MAX_SANITIZED_LEN).collect();
    let cleaned = truncated.trim_end();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
