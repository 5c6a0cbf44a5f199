//! Quote and parenthesis scanning primitives.
//!
//! All scanners work on ASCII delimiters only, so every index they return is
//! a valid `str` slice boundary.

/// Index of the `"` closing a string literal.
///
/// `start` points just past the opening quote. A quote preceded by a
/// backslash does not close the literal; deeper escape analysis is not done,
/// so `\\"` is treated the same as `\"`.
///
/// Returns `None` when the literal never closes.
pub fn end_of_quoted_string(text: &str, start: usize) -> Option<usize> {
    end_of_literal(text.as_bytes(), start, b'"')
}

fn end_of_literal(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    (start..bytes.len()).find(|&idx| bytes[idx] == quote && (idx == 0 || bytes[idx - 1] != b'\\'))
}

/// Index of the `)` balancing the `(` at the start of `text`.
///
/// Parentheses inside string literals are counted too, so `("a )" + b)`
/// closes early. Returns `None` when the group never balances.
pub fn end_of_balanced_parens(text: &str) -> Option<usize> {
    if !text.starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    for (idx, byte) in text.bytes().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the first `target` byte that sits outside string and character
/// literals and outside any parenthesized group opened within `text`.
///
/// A `)` with no matching `(` in `text` does not nest, so scanning the tail
/// of a call (`b), c);`) still finds the delimiters that follow it. Returns
/// `None` when there is no such byte or a literal never closes.
pub fn find_top_level(text: &str, target: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if byte == target && depth == 0 {
            return Some(idx);
        }
        match byte {
            b'"' | b'\'' => idx = end_of_literal(bytes, idx + 1, byte)?,
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        idx += 1;
    }
    None
}
