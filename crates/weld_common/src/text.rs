//! Text utilities for plugin output data and serve paths.

/// Converts CRLF and bare CR line endings to LF.
///
/// All plugin-supplied text (code, stylesheets, document fragments) is
/// normalized before hashing so that the same logical content produces the
/// same content hash on every platform.
pub fn normalize_line_endings(input: &str) -> String {
    if !input.contains('\r') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// Replaces colons in a serve path with underscores.
///
/// Package names may contain colons (`user:package`), which are not safe in
/// every serving context, so every derived serve path is converted.
pub fn convert_colons(path: &str) -> String {
    path.replace(':', "_")
}
