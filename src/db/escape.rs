//! Quoting utilities for identifiers and inlined string literals.

/// Wrap an identifier in `quote_char`, doubling any embedded occurrence.
///
/// # Arguments
/// * `name` - The identifier to quote
/// * `quote_char` - The engine's identifier quote ('"' for PostgreSQL)
pub fn quote_identifier(name: &str, quote_char: char) -> String {
    let mut result = String::with_capacity(name.len() + 2);
    result.push(quote_char);
    for c in name.chars() {
        if c == quote_char {
            result.push(quote_char);
        }
        result.push(c);
    }
    result.push(quote_char);
    result
}

/// Render a string as a single-quoted SQL literal.
#[inline]
pub fn quote_literal(s: &str) -> String {
    quote_identifier(s, '\'')
}

/// A piece of statement text, either code or a single-quoted literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Code(&'a str),
    /// Includes its quotes.
    Literal(&'a str),
}

/// Split `text` into alternating code and single-quoted literal segments.
///
/// A doubled quote inside a literal does not terminate it. Empty code
/// segments are skipped.
pub fn split_literals(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut in_literal = false;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if in_literal {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                segments.push(Segment::Literal(&text[start..=i]));
                start = i + 1;
                in_literal = false;
            } else {
                if start < i {
                    segments.push(Segment::Code(&text[start..i]));
                }
                start = i;
                in_literal = true;
            }
        }
        i += 1;
    }

    let rest = &text[start..];
    if in_literal {
        segments.push(Segment::Literal(rest));
    } else if !rest.is_empty() {
        segments.push(Segment::Code(rest));
    }
    segments
}
