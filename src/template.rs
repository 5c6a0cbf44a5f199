//! Concatenation-to-template conversion.
//!
//! Turns a `+`-concatenation such as `"id:" + user.getId() + " done"` into a
//! positional template (`"id:{0} done"`) and its ordered parameters
//! (`["user.getId()"]`).
//!
//! The parser is deliberately shallow. It recognises three operand shapes and
//! treats `+` purely as a separator:
//!
//! - string literals, whose inner text is copied into the template verbatim
//! - parenthesized groups, which become one opaque parameter each
//! - bare expressions (identifiers and simple call chains), cut at the next
//!   `+` or whitespace
//!
//! A parenthesized group is never decomposed, so `("a" + "b")` yields a single
//! parameter instead of folding into the template. A bare expression that
//! contains whitespace, such as `map.get("a key")`, is cut at the space.

use crate::scan::{end_of_balanced_parens, end_of_quoted_string};
use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::debug;

/// Default number of operands consumed before giving up on an expression.
pub const DEFAULT_ITERATION_BUDGET: usize = 20;

const TO_STRING_SUFFIX: &str = ".toString()";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid message syntax at: {remainder}")]
    InvalidSyntax { remainder: String },

    #[error("string literal never closes: {remainder}")]
    UnclosedString { remainder: String },

    #[error("unbalanced parentheses: {remainder}")]
    UnbalancedParens { remainder: String },

    #[error("expression not consumed after {budget} operands, remaining: {remainder}")]
    BudgetExhausted { budget: usize, remainder: String },
}

/// One unit of a concatenation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Inner text of a string literal, escapes preserved
    StringLiteral(String),
    /// A parenthesized group including its parentheses
    ParenGroup(String),
    /// A variable reference or simple call chain
    BareExpr(String),
}

/// A positional template and the parameters that fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateResult {
    /// Quoted template, e.g. `"job id:{0}"`
    pub template: String,
    /// Parameter expressions in placeholder order
    pub params: Vec<String>,
}

impl TemplateResult {
    /// Assemble a template from parsed operands.
    ///
    /// Placeholders are numbered in discovery order, one per non-literal
    /// operand.
    pub fn from_operands(operands: Vec<Operand>) -> Self {
        let mut template = String::from("\"");
        let mut params = Vec::new();

        for operand in operands {
            match operand {
                Operand::StringLiteral(text) => template.push_str(&text),
                Operand::ParenGroup(expr) | Operand::BareExpr(expr) => {
                    let _ = write!(template, "{{{}}}", params.len());
                    params.push(expr);
                }
            }
        }

        template.push('"');
        Self { template, params }
    }

    /// Parameter list as it appears in the rewritten call.
    ///
    /// A single parameter is passed directly; anything else is wrapped in an
    /// `Object[]` initializer.
    pub fn argument_list(&self) -> String {
        match self.params.as_slice() {
            [single] => single.clone(),
            params => format!("new Object[] {{{}}}", params.join(", ")),
        }
    }
}

/// Expression parser with an explicit operand budget.
#[derive(Debug, Clone, Copy)]
pub struct TemplateParser {
    budget: usize,
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_BUDGET)
    }
}

impl TemplateParser {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Parse `expr` and build its template.
    pub fn standardize(&self, expr: &str) -> Result<TemplateResult, ParseError> {
        self.operands(expr).map(TemplateResult::from_operands)
    }

    /// Split `expr` into its operands, left to right.
    pub fn operands(&self, expr: &str) -> Result<Vec<Operand>, ParseError> {
        let mut rest = expr.trim();
        let mut operands = Vec::new();

        for _ in 0..self.budget {
            let (operand, consumed) = next_operand(rest)?;
            operands.push(operand);

            rest = rest[consumed..].trim_start();
            if let Some(after_plus) = rest.strip_prefix('+') {
                rest = after_plus.trim_start();
            }
            if rest.is_empty() {
                return Ok(operands);
            }
        }

        debug!(budget = self.budget, remainder = rest, "operand budget exhausted");
        Err(ParseError::BudgetExhausted {
            budget: self.budget,
            remainder: rest.to_string(),
        })
    }
}

/// Parse `expr` with the default budget.
pub fn standardize(expr: &str) -> Result<TemplateResult, ParseError> {
    TemplateParser::default().standardize(expr)
}

/// Read the operand at the start of `rest`, returning it with the number of
/// bytes it occupies.
fn next_operand(rest: &str) -> Result<(Operand, usize), ParseError> {
    let Some(first) = rest.chars().next() else {
        return Err(invalid_syntax(rest));
    };

    match first {
        '"' => {
            let end = end_of_quoted_string(rest, 1).ok_or_else(|| {
                debug!(remainder = rest, "unclosed string literal");
                ParseError::UnclosedString {
                    remainder: rest.to_string(),
                }
            })?;
            Ok((Operand::StringLiteral(rest[1..end].to_string()), end + 1))
        }
        '(' => {
            let end = end_of_balanced_parens(rest).ok_or_else(|| {
                debug!(remainder = rest, "unbalanced parenthesized group");
                ParseError::UnbalancedParens {
                    remainder: rest.to_string(),
                }
            })?;
            Ok((Operand::ParenGroup(rest[..=end].to_string()), end + 1))
        }
        c if is_identifier_start(c) => {
            let end = rest
                .find(|c: char| c == '+' || c.is_whitespace())
                .unwrap_or(rest.len());
            let expr = &rest[..end];
            let expr = expr.strip_suffix(TO_STRING_SUFFIX).unwrap_or(expr);
            Ok((Operand::BareExpr(expr.to_string()), end))
        }
        _ => Err(invalid_syntax(rest)),
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn invalid_syntax(rest: &str) -> ParseError {
    debug!(remainder = rest, "invalid message syntax");
    ParseError::InvalidSyntax {
        remainder: rest.to_string(),
    }
}
