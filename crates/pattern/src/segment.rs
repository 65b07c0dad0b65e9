//! Segment tokenization.
//!
//! A value is split into alternating content and separator runs, e.g.
//! `1.9.1-beta-_1` becomes `["1", ".", "9", ".", "1", "-", "beta", "-_", "1"]`.
//! Segment counts address content runs, so `N` segments span `2N - 1` tokens.

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '-' | '_' | ',' | ':' | '/' | '@')
}

pub(crate) fn split(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_separator = false;
    for (i, c) in value.char_indices() {
        let separator = is_separator(c);
        if separator != in_separator && i > start {
            tokens.push(&value[start..i]);
            start = i;
        }
        in_separator = separator;
    }
    if start < value.len() {
        tokens.push(&value[start..]);
    }
    tokens
}

/// Tokens spanned by `count` segments.
fn span(count: usize) -> usize {
    count.saturating_mul(2).saturating_sub(1)
}

/// The first `count` segments, or the whole value if it has fewer.
pub(crate) fn prefix(value: &str, count: usize) -> String {
    let tokens = split(value);
    let wanted = span(count);
    if tokens.len() < wanted {
        return value.to_string();
    }
    tokens[..wanted].concat()
}

/// The last `count` segments, or the whole value if it has fewer.
pub(crate) fn suffix(value: &str, count: usize) -> String {
    let tokens = split(value);
    let wanted = span(count);
    if tokens.len() < wanted {
        return value.to_string();
    }
    tokens[tokens.len() - wanted..].concat()
}

/// Segments `start..=end` (1-based), clamped to what exists.
pub(crate) fn range(value: &str, start: usize, end: usize) -> String {
    let tokens = split(value);
    let first = start.saturating_sub(1).saturating_mul(2);
    let last = span(end).min(tokens.len());
    match tokens.len() {
        0 => String::new(),
        len if first > len => String::new(),
        len if first == len => tokens[len - 1].to_string(),
        _ => tokens[first..last].concat(),
    }
}
