//! Byte-level scanning helpers for C source text.
//!
//! Only ASCII bytes are ever used as cut points, so every range produced here
//! slices a `&str` on a character boundary.

use std::ops::Range;

pub(crate) fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

pub(crate) fn is_ident_continue(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// End of a string or character literal opening at `start`.
///
/// An unterminated literal stops before the newline, as a C lexer would.
pub(crate) fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// If a comment or literal opens at `i`, the index just past it.
///
/// Line comments end before their newline.
pub(crate) fn skip_trivia(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let body = i + 2;
            let end = bytes[body.min(bytes.len())..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| body + p + 2);
            Some(end)
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p),
        ),
        b'"' | b'\'' => Some(skip_quoted(bytes, i)),
        _ => None,
    }
}

/// True if only blanks precede `i` on its line.
pub(crate) fn at_line_start(bytes: &[u8], i: usize) -> bool {
    bytes[..i]
        .iter()
        .rev()
        .take_while(|&&b| b != b'\n')
        .all(|&b| b == b' ' || b == b'\t')
}

/// End of the preprocessor directive starting at `i`, honoring backslash
/// line continuations. The terminating newline is not included.
pub(crate) fn directive_end(bytes: &[u8], i: usize) -> usize {
    let mut j = i;
    while j < bytes.len() {
        if bytes[j] == b'\n' {
            let continued = match j {
                0 => false,
                _ if bytes[j - 1] == b'\\' => true,
                _ => j >= 2 && bytes[j - 1] == b'\r' && bytes[j - 2] == b'\\',
            };
            if !continued {
                return j;
            }
        }
        j += 1;
    }
    bytes.len()
}

/// End of a preprocessing number starting at `i`.
///
/// A `'` between two alphanumerics is a digit separator (`1'000`, `0xFF'FF`),
/// not the start of a character literal.
pub(crate) fn skip_number(bytes: &[u8], i: usize) -> usize {
    let mut j = i;
    while j < bytes.len() {
        let b = bytes[j];
        let separator = b == b'\''
            && j > i
            && bytes[j - 1].is_ascii_alphanumeric()
            && bytes.get(j + 1).is_some_and(u8::is_ascii_alphanumeric);
        if !(is_ident_continue(b) || b == b'.' || separator) {
            break;
        }
        j += 1;
    }
    j
}

/// True if a number, not the tail of an identifier, begins at `i`.
fn starts_number(bytes: &[u8], i: usize) -> bool {
    i == 0 || !is_ident_continue(bytes[i - 1])
}

/// Index of the first preprocessor directive inside `range`, if any.
pub(crate) fn find_directive(bytes: &[u8], range: Range<usize>) -> Option<usize> {
    let mut i = range.start;
    while i < range.end {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'#' && at_line_start(bytes, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub(crate) fn skip_whitespace(bytes: &[u8], i: usize) -> usize {
    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    j
}

/// Split the argument list whose `(` is at `open`.
///
/// Returns the raw argument ranges (untrimmed) and the index of the matching
/// `)`, or `None` if the list is unterminated. An empty list yields no
/// arguments.
pub(crate) fn split_args(bytes: &[u8], open: usize) -> Option<(Vec<Range<usize>>, usize)> {
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut start = open + 1;
    let mut i = open + 1;
    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' if depth == 0 => {
                args.push(start..i);
                if args.len() == 1 && bytes[start..i].iter().all(u8::is_ascii_whitespace) {
                    args.clear();
                }
                return Some((args, i));
            }
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                args.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Collapse `text` onto one line: comments and line breaks become spaces.
pub(crate) fn flatten(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if matches!(bytes.get(i + 1), Some(b'*' | b'/')) => {
                out.push_str(&text[copied..i]);
                out.push(' ');
                i = skip_trivia(bytes, i).unwrap_or(bytes.len());
                copied = i;
            }
            b'0'..=b'9' if starts_number(bytes, i) => i = skip_number(bytes, i),
            b'"' | b'\'' => i = skip_quoted(bytes, i),
            b'\\' if matches!(bytes.get(i + 1), Some(b'\n' | b'\r')) => {
                out.push_str(&text[copied..i]);
                out.push(' ');
                i += 1;
                copied = i;
            }
            b'\n' | b'\r' => {
                out.push_str(&text[copied..i]);
                out.push(' ');
                i += 1;
                copied = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&text[copied.min(text.len())..]);
    out
}

/// Replace each `//` comment with a space, keeping its newline.
pub(crate) fn drop_line_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&text[copied..i]);
                out.push(' ');
                i = skip_trivia(bytes, i).unwrap_or(bytes.len());
                copied = i;
            }
            b'0'..=b'9' if starts_number(bytes, i) => i = skip_number(bytes, i),
            b'/' | b'"' | b'\'' => i = skip_trivia(bytes, i).unwrap_or(i + 1),
            _ => i += 1,
        }
    }
    out.push_str(&text[copied..]);
    out
}

pub(crate) fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
