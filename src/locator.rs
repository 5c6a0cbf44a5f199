//! Recovery of a full, possibly multi-line, statement around a trigger line.

use crate::buffer::TextBuffer;
use serde::Serialize;
use tracing::trace;

/// A statement's text and the inclusive line span it occupies.
///
/// `code` is the trimmed text of every line in the span, concatenated without
/// line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub code: String,
    pub start: usize,
    pub end: usize,
}

/// Recover the statement containing `trigger_line`.
///
/// Walks upward from the line above the trigger while lines belong to the
/// same statement, i.e. contain no `;`, `{` or `}`. Block headers such as
/// `if (x) {` end in `{` and so stop the walk. Blank lines are absorbed but
/// never become the start line. Then walks downward from the trigger until
/// the accumulated text contains a `;`.
pub fn locate<B: TextBuffer + ?Sized>(buffer: &B, trigger_line: usize) -> CodeBlock {
    let line_count = buffer.line_count();
    let mut start = trigger_line;
    let mut preceding: Vec<&str> = Vec::new();

    for idx in (0..trigger_line.min(line_count)).rev() {
        let text = buffer.line_at(idx).trim();
        if ends_statement(text) {
            break;
        }
        if !text.is_empty() {
            start = idx;
        }
        preceding.push(text);
    }

    let mut code: String = preceding.into_iter().rev().collect();

    let mut current = trigger_line;
    while current < line_count {
        code.push_str(buffer.line_at(current).trim());
        current += 1;
        if code.is_empty() || code.contains(';') {
            break;
        }
    }
    let end = current.saturating_sub(1).max(start);

    trace!(start, end, code = code.as_str(), "located statement");
    CodeBlock { code, start, end }
}

fn ends_statement(line: &str) -> bool {
    line.contains([';', '{', '}'])
}
