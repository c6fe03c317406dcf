/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Byte offset reached after advancing `n_chars` characters from `start`,
/// clamped to the end of `text`. `start` must be a char boundary.
pub(crate) fn advance_chars(text: &str, start: usize, n_chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(n_chars)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len())
}

/// Byte offset of the character at position `char_idx` (clamped).
pub(crate) fn char_offset(text: &str, char_idx: usize) -> usize {
    advance_chars(text, 0, char_idx)
}

/// Byte offset of the end of the line containing `pos` (the `\n` itself, or
/// the end of the text).
pub(crate) fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

/// The first `n_chars` characters of `text`.
pub(crate) fn head_chars(text: &str, n_chars: usize) -> &str {
    &text[..advance_chars(text, 0, n_chars)]
}
