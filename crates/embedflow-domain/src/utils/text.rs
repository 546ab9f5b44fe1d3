//! Text preprocessing applied before embedding.

/// Normalize a micro-chunk before embedding: strip NUL bytes, collapse
/// whitespace runs to single spaces, trim.
#[must_use]
pub fn preprocess(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch == '\0' {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}
