//! Structural verification of rewritten artifacts
//!
//! A rewrite that produces a structurally broken artifact must fail the
//! build, so every rewritten artifact is checked before it is written back:
//! all bracket delimiters must balance, counting only code (string, char,
//! and raw-string literals and both comment forms are skipped).

use std::ops::Range;

/// A structural violation, positioned for the build diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    pub line: usize,
    pub column: usize,
    pub reason: String,
}

/// Byte ranges covered by comments and string/char literals, in order.
///
/// The scanner masks its matches against these ranges so that builder text
/// quoted in host data or comments is never treated as a construction site.
/// Unterminated literals extend to the end of the source; the balance check
/// reports those separately.
pub(crate) fn non_code_spans(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
                spans.push(start..i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                spans.push(start..i);
            }
            b'"' => {
                i = skip_string(source, i).unwrap_or(bytes.len());
                spans.push(start..i);
            }
            b'r' | b'b' if is_raw_string_start(source, i) => {
                i = skip_raw_string(source, i).unwrap_or(bytes.len());
                spans.push(start..i);
            }
            b'\'' => {
                i = skip_char_or_lifetime(source, i);
                // A lifetime quote advances by one byte and is still code.
                if i > start + 1 {
                    spans.push(start..i);
                }
            }
            _ => i += 1,
        }
    }
    spans
}

/// Check that `(`/`)`, `[`/`]`, and `{`/`}` balance outside literals and
/// comments.
pub fn check_delimiters(source: &str) -> Result<(), StructuralError> {
    let bytes = source.as_bytes();
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
            }
            b'"' => match skip_string(source, i) {
                Some(next) => i = next,
                None => return Err(error_at(source, i, "Unterminated string literal")),
            },
            b'r' | b'b' if is_raw_string_start(source, i) => {
                match skip_raw_string(source, i) {
                    Some(next) => i = next,
                    None => return Err(error_at(source, i, "Unterminated raw string literal")),
                }
            }
            b'\'' => {
                i = skip_char_or_lifetime(source, i);
            }
            open @ (b'(' | b'[' | b'{') => {
                stack.push((open, i));
                i += 1;
            }
            close @ (b')' | b']' | b'}') => {
                match stack.pop() {
                    Some((open, _)) if matching(open) == close => {}
                    _ => {
                        return Err(error_at(
                            source,
                            i,
                            &format!("Unbalanced '{}'", close as char),
                        ))
                    }
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    if let Some((open, at)) = stack.pop() {
        return Err(error_at(source, at, &format!("Unclosed '{}'", open as char)));
    }
    Ok(())
}

fn matching(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn error_at(source: &str, offset: usize, reason: &str) -> StructuralError {
    let before = &source[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    StructuralError {
        line: before.matches('\n').count() + 1,
        column: source[line_start..offset].chars().count() + 1,
        reason: reason.to_string(),
    }
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    i
}

/// Skip a `"..."` literal with escape handling. Returns the index past the
/// closing quote, or None if unterminated.
fn skip_string(source: &str, open: usize) -> Option<usize> {
    let mut chars = source[open + 1..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(open + 1 + offset + 1),
            _ => {}
        }
    }
    None
}

/// True at the `r`/`b` of `r"`, `r#"`, `b"`, or `br#"` when it is not part
/// of an identifier.
fn is_raw_string_start(source: &str, at: usize) -> bool {
    if source[..at]
        .chars()
        .next_back()
        .is_some_and(|c| c == '_' || c.is_alphanumeric())
    {
        return false;
    }
    let rest = &source.as_bytes()[at..];
    let mut i = 1;
    if rest[0] == b'b' && rest.get(1) == Some(&b'r') {
        i = 2;
    } else if rest[0] == b'b' {
        // b"..." byte string, handled as a plain string below.
        return rest.get(1) == Some(&b'"');
    }
    while rest.get(i) == Some(&b'#') {
        i += 1;
    }
    rest.get(i) == Some(&b'"')
}

/// Skip a raw (or byte, or raw-byte) string literal. Returns the index past
/// the closing delimiter.
fn skip_raw_string(source: &str, at: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = at + 1;
    if bytes[at] == b'b' {
        if bytes.get(i) == Some(&b'r') {
            i += 1;
        } else {
            // Plain byte string: same escape rules as "...".
            return skip_string(source, i);
        }
    }
    let mut hashes = 0;
    while bytes.get(i) == Some(&b'#') {
        hashes += 1;
        i += 1;
    }
    debug_assert_eq!(bytes.get(i), Some(&b'"'));
    i += 1;

    let closer: String = std::iter::once('"')
        .chain(std::iter::repeat('#').take(hashes))
        .collect();
    source[i..]
        .find(&closer)
        .map(|found| i + found + closer.len())
}

/// Skip a char literal, or just the quote of a lifetime.
fn skip_char_or_lifetime(source: &str, at: usize) -> usize {
    let mut chars = source[at + 1..].char_indices();
    match chars.next() {
        Some((_, '\\')) => {
            // Escaped char: consume it, then scan to the closing quote.
            chars.next();
            while let Some((offset, c)) = chars.next() {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '\'' => return at + 1 + offset + 1,
                    _ => {}
                }
            }
            source.len()
        }
        Some(_) => match chars.next() {
            // 'x' with a single (possibly multi-byte) char inside.
            Some((close_offset, '\'')) => at + 1 + close_offset + 1,
            // A lifetime such as 'a or 'static: consume the quote only.
            _ => at + 1,
        },
        None => source.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_code_passes() {
        let source = r#"
            fn make(input: &[u8]) -> Vec<u8> {
                let mapped = input.iter().map(|b| b + 1).collect::<Vec<_>>();
                mapped
            }
        "#;
        assert!(check_delimiters(source).is_ok());
    }

    #[test]
    fn delimiters_in_strings_and_comments_are_ignored() {
        let source = "fn f() {\n    // unmatched ) here\n    /* and ( here */\n    let s = \"((([\"; let c = '{';\n}\n";
        assert!(check_delimiters(source).is_ok());
    }

    #[test]
    fn raw_strings_are_ignored() {
        let source = "fn f() { let s = r#\"((({\"#; }\n";
        assert!(check_delimiters(source).is_ok());
    }

    #[test]
    fn lifetimes_do_not_confuse_the_scanner() {
        let source = "fn f<'a>(x: &'a str) -> &'a str { x }\n";
        assert!(check_delimiters(source).is_ok());
    }

    #[test]
    fn escaped_quote_char_literal_is_handled() {
        let source = "fn f() { let q = '\\''; let n = '\\n'; }\n";
        assert!(check_delimiters(source).is_ok());
    }

    #[test]
    fn non_code_spans_cover_literals_and_comments() {
        let source = "let a = \"text\"; // note\nlet b = 'c';\n";
        let spans = non_code_spans(source);

        assert_eq!(spans.len(), 3);
        assert_eq!(&source[spans[0].clone()], "\"text\"");
        assert_eq!(&source[spans[1].clone()], "// note");
        assert_eq!(&source[spans[2].clone()], "'c'");
    }

    #[test]
    fn non_code_spans_skip_lifetimes() {
        let source = "fn f<'a>(x: &'a str) -> &'a str { x }\n";
        assert!(non_code_spans(source).is_empty());
    }

    #[test]
    fn unclosed_delimiter_is_reported_with_position() {
        let source = "fn f() {\n    let x = (1 + 2;\n}\n";
        let err = check_delimiters(source).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.reason.contains('}'));
    }

    #[test]
    fn stray_closer_is_reported() {
        let source = "fn f() { }\n)\n";
        let err = check_delimiters(source).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
        assert!(err.reason.contains(')'));
    }
}
