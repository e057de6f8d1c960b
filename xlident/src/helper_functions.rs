use std::num::{IntErrorKind, ParseIntError};

use context_error::*;
use xlcore::{XlError, csv::CsvLine};

/// Find the enclosed text by the given symbols, assumes a single open is already read just before the start, guarantees to only pick full characters
pub(crate) fn end_of_enclosure(text: &str, start: usize, open: u8, close: u8) -> Option<usize> {
    let mut state = 1;
    for (i, ch) in text.as_bytes()[start..].iter().enumerate() {
        // Check if this byte is a full character (is_char_boundary also works on index==len)
        if text.is_char_boundary(start + i) && text.is_char_boundary(start + i + 1) {
            if *ch == open {
                state += 1;
            } else if *ch == close {
                state -= 1;
                if state == 0 {
                    return Some(start + i);
                }
            }
        }
    }
    None
}

/// Split the given text based on the separator, ignoring separators within brackets. Empty
/// fields are removed.
pub(crate) fn split_with_brackets(text: &str, separator: u8, open: u8, close: u8) -> Vec<&str> {
    let mut state: usize = 0;
    let mut last_field = 0;
    let mut fields = Vec::new();
    for (index, ch) in text.bytes().enumerate() {
        if ch == open {
            state += 1;
        } else if ch == close {
            state = state.saturating_sub(1);
        } else if ch == separator && state == 0 {
            fields.push(&text[last_field..index]);
            last_field = index + 1;
        }
    }
    fields.push(&text[last_field..]);
    fields
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// To be used as `The xx number ` + the explanation from here (does not have a dot).
pub(crate) const fn explain_number_error(error: &ParseIntError) -> &'static str {
    match error.kind() {
        IntErrorKind::Empty => "is empty",
        IntErrorKind::InvalidDigit => "contains an invalid character",
        IntErrorKind::NegOverflow => "is too small to fit in the internal representation",
        IntErrorKind::PosOverflow => "is too big to fit in the internal representation",
        IntErrorKind::Zero => "is zero, which is not allowed here",
        _ => "is not a valid number",
    }
}

/// Create an error pointing to the full line
pub(crate) fn line_error(
    line: &CsvLine,
    short: impl Into<String>,
    long: impl Into<String>,
) -> XlError {
    BoxedError::new(BasicKind::Error, short.into(), long.into(), line.full_context())
}

/// Parse a 1-based position where `-1`, `0`, `-`, and empty text mean that there is no position
pub(crate) fn optional_position(text: &str) -> Result<Option<usize>, String> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text == "-1" || text == "0" {
        return Ok(None);
    }
    text.parse::<usize>().map(Some).map_err(|err| {
        format!(
            "The position number '{text}' {}",
            explain_number_error(&err)
        )
    })
}

/// Parse a charge as `3`, `3+`, or `+3`
pub(crate) fn parse_charge(text: &str) -> Option<usize> {
    text.trim().trim_matches('+').parse().ok()
}

#[test]
fn test_split_with_brackets() {
    assert_eq!(
        split_with_brackets("GeneA(42);GeneB(7);", b';', b'(', b')'),
        vec!["GeneA(42)", "GeneB(7)"]
    );
    assert_eq!(
        split_with_brackets("sp|P1|X(a;b)(3)/P2(4)/", b'/', b'(', b')'),
        vec!["sp|P1|X(a;b)(3)", "P2(4)"]
    );
    assert_eq!(optional_position("-1"), Ok(None));
    assert_eq!(optional_position("12"), Ok(Some(12)));
    assert!(optional_position("x").is_err());
    assert_eq!(parse_charge("3+"), Some(3));
}
