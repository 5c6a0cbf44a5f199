//! Rewrite orchestration: from a trigger line to at most one proposed edit.
//!
//! The pipeline is locate, classify, resolve the logger variant, split the
//! call, parse the message and assemble the replacement. Only the standard
//! variant is rewritten; log4j already accepts parameterized messages.

use crate::buffer::{Position, Range, TextBuffer};
use crate::classify::{is_already_templated, is_logging_call};
use crate::config::FormatterConfig;
use crate::locator::{locate, CodeBlock};
use crate::scan::find_top_level;
use crate::template::{ParseError, TemplateParser, TemplateResult};
use crate::variant::{LoggerVariant, Resolution, VariantResolver};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// A replacement of `range` by `replacement`, ready for an edit mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposedEdit {
    pub range: Range,
    pub replacement: String,
    /// The statement being replaced
    pub statement: CodeBlock,
    pub template: TemplateResult,
}

/// Result of evaluating one trigger position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RewriteOutcome should be checked for a proposal"]
pub enum RewriteOutcome {
    Proposed(ProposedEdit),
    Skipped(SkipReason),
}

/// Why no rewrite applies. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trigger sits on a blank region
    EmptyStatement,
    /// Statement is not `receiver.level(args);`
    NotLoggingCall,
    /// Message already contains a `{n}` placeholder
    AlreadyTemplated,
    /// Receiver is a log4j logger
    Log4j,
    /// Receiver's logger type could not be determined
    UnresolvedVariant,
    /// `.log(...)` call without a level argument
    MissingLevelArgument,
    /// Arguments besides the level and message, such as a throwable
    ExtraArguments,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::EmptyStatement => "no statement at trigger",
            SkipReason::NotLoggingCall => "not a logging call",
            SkipReason::AlreadyTemplated => "message already uses placeholders",
            SkipReason::Log4j => "log4j logger",
            SkipReason::UnresolvedVariant => "logger type not resolved",
            SkipReason::MissingLevelArgument => "log call has no level argument",
            SkipReason::ExtraArguments => "call passes arguments besides the message",
        };
        f.write_str(reason)
    }
}

/// A rewrite that was aborted. No partial edit is ever produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("trigger line {line} is outside a buffer of {line_count} lines")]
    TriggerOutOfRange { line: usize, line_count: usize },

    #[error("malformed message expression in statement at line {line_number}: {source}")]
    MalformedExpression {
        /// 1-based first line of the statement
        line_number: usize,
        #[source]
        source: ParseError,
    },

    #[error("message expression at line {line_number} exceeds the operand budget of {budget}")]
    UnboundedInput { line_number: usize, budget: usize },
}

impl RewriteError {
    fn from_parse(error: ParseError, block: &CodeBlock) -> Self {
        let line_number = block.start + 1;
        match error {
            ParseError::BudgetExhausted { budget, .. } => RewriteError::UnboundedInput {
                line_number,
                budget,
            },
            source => RewriteError::MalformedExpression {
                line_number,
                source,
            },
        }
    }
}

/// Every proposal in a buffer, plus the statements that failed to parse.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub proposals: Vec<ProposedEdit>,
    pub failures: Vec<RewriteError>,
}

/// Rewrites concatenated messages of standard-logger calls.
#[derive(Debug, Clone)]
pub struct Formatter {
    parser: TemplateParser,
    resolver: VariantResolver,
    level_type: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(&FormatterConfig::default())
    }
}

impl Formatter {
    pub fn new(config: &FormatterConfig) -> Self {
        Self {
            parser: TemplateParser::new(config.parser.iteration_budget),
            resolver: VariantResolver::from_config(&config.resolver),
            level_type: config.rewrite.level_type.clone(),
        }
    }

    /// Evaluate the statement around `trigger_line` (0-based).
    pub fn propose<B: TextBuffer + ?Sized>(
        &self,
        buffer: &B,
        trigger_line: usize,
    ) -> Result<RewriteOutcome, RewriteError> {
        let line_count = buffer.line_count();
        if trigger_line >= line_count {
            return Err(RewriteError::TriggerOutOfRange {
                line: trigger_line,
                line_count,
            });
        }

        self.rewrite_block(buffer, locate(buffer, trigger_line))
    }

    /// Evaluate every statement in `buffer`, top to bottom.
    ///
    /// Every line is tried as a trigger until a statement is rewritten or
    /// fails, after which scanning resumes past that statement. Proposals
    /// therefore never overlap.
    pub fn scan<B: TextBuffer + ?Sized>(&self, buffer: &B) -> ScanReport {
        let mut report = ScanReport::default();
        let mut line = 0;

        while line < buffer.line_count() {
            let block = locate(buffer, line);
            let past_statement = block.end.max(line) + 1;

            // A skipped block may have swallowed a block header, so the
            // statement on the next line still gets its own trigger.
            line = match self.rewrite_block(buffer, block) {
                Ok(RewriteOutcome::Proposed(edit)) => {
                    report.proposals.push(edit);
                    past_statement
                }
                Ok(RewriteOutcome::Skipped(_)) => line + 1,
                Err(error) => {
                    report.failures.push(error);
                    past_statement
                }
            };
        }

        debug!(
            proposals = report.proposals.len(),
            failures = report.failures.len(),
            "scanned buffer"
        );
        report
    }

    fn rewrite_block<B: TextBuffer + ?Sized>(
        &self,
        buffer: &B,
        block: CodeBlock,
    ) -> Result<RewriteOutcome, RewriteError> {
        if block.code.is_empty() {
            return Ok(RewriteOutcome::Skipped(SkipReason::EmptyStatement));
        }
        if !is_logging_call(&block.code) {
            trace!(code = block.code.as_str(), "not a logging call");
            return Ok(RewriteOutcome::Skipped(SkipReason::NotLoggingCall));
        }

        let call = match LoggingCall::split(&block.code) {
            Some(call) => call,
            None => return Ok(RewriteOutcome::Skipped(SkipReason::NotLoggingCall)),
        };

        match self.resolver.resolve(buffer, call.receiver) {
            Resolution::Found(LoggerVariant::StandardJul)
            | Resolution::Fallback(LoggerVariant::StandardJul) => {}
            Resolution::Found(LoggerVariant::Log4j) | Resolution::Fallback(LoggerVariant::Log4j) => {
                return Ok(RewriteOutcome::Skipped(SkipReason::Log4j));
            }
            Resolution::Unresolved => {
                debug!(receiver = call.receiver, "logger variant unresolved");
                return Ok(RewriteOutcome::Skipped(SkipReason::UnresolvedVariant));
            }
        }

        if is_already_templated(&block.code) {
            return Ok(RewriteOutcome::Skipped(SkipReason::AlreadyTemplated));
        }

        let (head, message) = match call.head_and_message(&self.level_type) {
            Ok(parts) => parts,
            Err(reason) => return Ok(RewriteOutcome::Skipped(reason)),
        };

        let template = self
            .parser
            .standardize(message.trim())
            .map_err(|error| RewriteError::from_parse(error, &block))?;

        let replacement = format!(
            "{}, {}, {});",
            head,
            template.template,
            template.argument_list()
        );
        let range = replacement_range(buffer, &block);

        debug!(
            start = block.start,
            end = block.end,
            replacement = replacement.as_str(),
            "proposing rewrite"
        );
        Ok(RewriteOutcome::Proposed(ProposedEdit {
            range,
            replacement,
            statement: block,
            template,
        }))
    }
}

/// The pieces of `receiver.level(args);` the rewrite needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoggingCall<'a> {
    receiver: &'a str,
    level: &'a str,
    /// Text between the call's parentheses
    args: &'a str,
}

impl<'a> LoggingCall<'a> {
    /// Split the call at the front of `code`. Anything after the `;` that
    /// ends the call is not part of it.
    fn split(code: &'a str) -> Option<Self> {
        let dot = code.find('.')?;
        let open = code.find('(')?;
        if dot > open {
            return None;
        }
        let close = open + 1 + find_top_level(&code[open + 1..], b')')?;
        if !code[close + 1..].trim_start().starts_with(';') {
            return None;
        }
        Some(Self {
            receiver: code[..dot].trim(),
            level: &code[dot + 1..open],
            args: &code[open + 1..close],
        })
    }

    /// Call head up to the message argument, and the message itself.
    ///
    /// `.log(level, msg)` keeps its level argument verbatim; any other level
    /// method becomes `.log(<level_type>.<LEVEL>`. Commas are only looked for
    /// outside literals and nested calls, so `getLevel(a, b), msg` splits
    /// after the call.
    fn head_and_message(&self, level_type: &str) -> Result<(String, &'a str), SkipReason> {
        let (head, message) = if self.level.eq_ignore_ascii_case("log") {
            let comma =
                find_top_level(self.args, b',').ok_or(SkipReason::MissingLevelArgument)?;
            let head = format!("{}.{}({}", self.receiver, self.level, &self.args[..comma]);
            (head, &self.args[comma + 1..])
        } else {
            let head = format!(
                "{}.log({}.{}",
                self.receiver,
                level_type,
                self.level.to_uppercase()
            );
            (head, self.args)
        };

        if find_top_level(message, b',').is_some() {
            return Err(SkipReason::ExtraArguments);
        }
        Ok((head, message))
    }
}

/// From the first non-blank column of the start line to just past the `;`
/// that ends the statement. Text after that `;` stays in place.
fn replacement_range<B: TextBuffer + ?Sized>(buffer: &B, block: &CodeBlock) -> Range {
    let first = buffer.line_at(block.start);
    let start_column = first.len() - first.trim_start_matches([' ', '\t']).len();

    // Continuation lines begin inside the call, never inside a literal
    let last = buffer.line_at(block.end);
    let from = if block.end == block.start { start_column } else { 0 };
    let end_column = find_top_level(&last[from..], b';')
        .map(|idx| from + idx + 1)
        .unwrap_or_else(|| last.trim_end().len());

    Range::new(
        Position::new(block.start, start_column),
        Position::new(block.end, end_column),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LineBuffer;

    const HEADER: &str = "import java.util.logging.Level;\n\
                          import java.util.logging.Logger;\n\
                          \n\
                          public class Job {\n\
                          \x20   private static final Logger logger = Logger.getLogger(\"Job\");\n";

    fn buffer(body: &str) -> LineBuffer {
        LineBuffer::new(format!("{HEADER}{body}\n}}\n"))
    }

    /// Line index of the first body line.
    const BODY: usize = 5;

    fn proposal(buffer: &LineBuffer, line: usize) -> ProposedEdit {
        match Formatter::default().propose(buffer, line).unwrap() {
            RewriteOutcome::Proposed(edit) => edit,
            RewriteOutcome::Skipped(reason) => panic!("skipped: {reason}"),
        }
    }

    fn skipped(buffer: &LineBuffer, line: usize) -> SkipReason {
        match Formatter::default().propose(buffer, line).unwrap() {
            RewriteOutcome::Skipped(reason) => reason,
            RewriteOutcome::Proposed(edit) => panic!("unexpected proposal: {edit:?}"),
        }
    }

    #[test]
    fn level_method_becomes_log_call() {
        let buf = buffer("    logger.info(\"id:\" + id);");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(Level.INFO, "id:{0}", id);"#);
        assert_eq!(edit.range.start, Position::new(BODY, 4));
        assert_eq!(edit.range.end, Position::new(BODY, 28));
        assert_eq!(buf.slice(edit.range), Some(r#"logger.info("id:" + id);"#));
    }

    #[test]
    fn several_parameters_use_object_array() {
        let buf = buffer("    logger.severe(jobId1 + \":testing:\" + jobId2);");
        let edit = proposal(&buf, BODY);
        assert_eq!(
            edit.replacement,
            r#"logger.log(Level.SEVERE, "{0}:testing:{1}", new Object[] {jobId1, jobId2});"#
        );
    }

    #[test]
    fn log_form_keeps_level_argument() {
        let buf = buffer("    logger.log(Level.WARNING, \"job \" + job.getId() + \" failed\");");
        let edit = proposal(&buf, BODY);
        assert_eq!(
            edit.replacement,
            r#"logger.log(Level.WARNING, "job {0} failed", job.getId());"#
        );
    }

    #[test]
    fn log_form_with_computed_level() {
        let buf = buffer("    logger.log(pick(a, b), \"x=\" + x);");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(pick(a, b), "x={0}", x);"#);
    }

    #[test]
    fn log_form_without_level_is_skipped() {
        let buf = buffer("    logger.log(\"x=\" + x);");
        assert_eq!(skipped(&buf, BODY), SkipReason::MissingLevelArgument);
    }

    #[test]
    fn multi_line_statement_is_replaced_whole() {
        let buf = buffer("    logger.fine(\"started \"\n            + name\n            + \" at \" + time);");
        for trigger in BODY..BODY + 3 {
            let edit = proposal(&buf, trigger);
            assert_eq!(
                edit.replacement,
                r#"logger.log(Level.FINE, "started {0} at {1}", new Object[] {name, time});"#
            );
            assert_eq!(edit.range.start, Position::new(BODY, 4));
            assert_eq!(edit.range.end.line, BODY + 2);
            assert_eq!((edit.statement.start, edit.statement.end), (BODY, BODY + 2));
        }
    }

    #[test]
    fn statement_inside_block_is_not_merged_with_header() {
        let buf = buffer("    if (x) {\n        logger.severe(\"bad \" + x);\n    }");
        let edit = proposal(&buf, BODY + 1);
        assert_eq!(edit.statement.code, r#"logger.severe("bad " + x);"#);
        assert_eq!(edit.range.start, Position::new(BODY + 1, 8));
    }

    #[test]
    fn tab_indentation() {
        let buf = buffer("\t\tlogger.info(\"a\" + b);");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.range.start, Position::new(BODY, 2));
    }

    #[test]
    fn already_templated_is_skipped() {
        let buf = buffer("    logger.log(Level.INFO, \"id:{0}\", id);");
        assert_eq!(skipped(&buf, BODY), SkipReason::AlreadyTemplated);
    }

    #[test]
    fn rewriting_twice_is_a_no_op() {
        let buf = buffer("    logger.info(\"id:\" + id);");
        let edit = proposal(&buf, BODY);

        let source = buf.source();
        let start = buf.offset_of(edit.range.start).unwrap();
        let end = buf.offset_of(edit.range.end).unwrap();
        let rewritten = format!("{}{}{}", &source[..start], edit.replacement, &source[end..]);

        let again = LineBuffer::new(rewritten);
        assert_eq!(skipped(&again, BODY), SkipReason::AlreadyTemplated);
    }

    #[test]
    fn log4j_is_left_alone() {
        let buf = LineBuffer::new(
            "import org.apache.logging.log4j.Logger;\n\
             class A {\n\
             \x20   Logger logger;\n\
             \x20   void f() {\n\
             \x20       logger.info(\"id:\" + id);\n\
             \x20   }\n\
             }\n",
        );
        assert_eq!(skipped(&buf, 4), SkipReason::Log4j);
    }

    #[test]
    fn unresolved_receiver_is_skipped() {
        let buf = buffer("    other.info(\"id:\" + id);");
        assert_eq!(skipped(&buf, BODY), SkipReason::UnresolvedVariant);
    }

    #[test]
    fn non_logging_statements_are_skipped() {
        let buf = buffer("    int x = compute();");
        assert_eq!(skipped(&buf, BODY), SkipReason::NotLoggingCall);
        let buf = buffer("    System.out.println(\"a\" + b);");
        assert_eq!(skipped(&buf, BODY), SkipReason::NotLoggingCall);
    }

    #[test]
    fn blank_trigger_is_skipped() {
        let buf = buffer("\n    logger.info(\"a\" + b);");
        assert_eq!(skipped(&buf, BODY), SkipReason::EmptyStatement);
    }

    #[test]
    fn malformed_message_aborts() {
        let buf = buffer("    logger.info(\"count: \" + 5);");
        let err = Formatter::default().propose(&buf, BODY).unwrap_err();
        assert_eq!(
            err,
            RewriteError::MalformedExpression {
                line_number: BODY + 1,
                source: ParseError::InvalidSyntax {
                    remainder: "5".to_string()
                },
            }
        );
    }

    #[test]
    fn operand_budget_aborts() {
        let config = FormatterConfig {
            parser: crate::config::ParserConfig {
                iteration_budget: 2,
            },
            ..FormatterConfig::default()
        };
        let buf = buffer("    logger.info(a + b + c);");
        let err = Formatter::new(&config).propose(&buf, BODY).unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnboundedInput {
                line_number: BODY + 1,
                budget: 2
            }
        );
    }

    #[test]
    fn trigger_outside_buffer() {
        let buf = buffer("    logger.info(\"a\" + b);");
        let err = Formatter::default().propose(&buf, 1000).unwrap_err();
        assert!(matches!(err, RewriteError::TriggerOutOfRange { line: 1000, .. }));
    }

    #[test]
    fn custom_level_type() {
        let mut config = FormatterConfig::default();
        config.rewrite.level_type = "java.util.logging.Level".to_string();
        let buf = buffer("    logger.config(\"a\" + b);");
        let edit = match Formatter::new(&config).propose(&buf, BODY).unwrap() {
            RewriteOutcome::Proposed(edit) => edit,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            edit.replacement,
            r#"logger.log(java.util.logging.Level.CONFIG, "a{0}", b);"#
        );
    }

    #[test]
    fn scan_visits_each_statement_once() {
        let buf = buffer(
            "    void run() {\n\
             \x20       logger.info(\"a\" + b);\n\
             \x20       int x = 1;\n\
             \x20       logger.warning(\"multi \"\n\
             \x20           + x);\n\
             \x20       logger.info(\"done\" + 5);\n\
             \x20       logger.log(Level.INFO, \"{0}\", x);\n\
             \x20   }",
        );
        let report = Formatter::default().scan(&buf);

        let starts: Vec<usize> = report
            .proposals
            .iter()
            .map(|p| p.statement.start)
            .collect();
        assert_eq!(starts, vec![BODY + 1, BODY + 3]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            RewriteError::MalformedExpression { line_number, .. } if line_number == BODY + 6
        ));

        for pair in report.proposals.windows(2) {
            assert!(!pair[0].range.overlaps(&pair[1].range));
        }
    }

    #[test]
    fn split_call_parts() {
        let call = LoggingCall::split(r#"log.info("a" + f(b));"#).unwrap();
        assert_eq!(call.receiver, "log");
        assert_eq!(call.level, "info");
        assert_eq!(call.args, r#""a" + f(b)"#);

        let call = LoggingCall::split(r#"log.info("a)" + b); next();"#).unwrap();
        assert_eq!(call.args, r#""a)" + b"#);
        assert!(LoggingCall::split(r#"log.info("a" + b) + c;"#).is_none());
    }

    #[test]
    fn statement_sharing_its_line_is_preserved() {
        let buf = buffer("    logger.info(\"a\" + b); count = 1;");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(Level.INFO, "a{0}", b);"#);
        assert_eq!(buf.slice(edit.range), Some(r#"logger.info("a" + b);"#));
        assert_eq!(edit.range.end, Position::new(BODY, 25));
    }

    #[test]
    fn semicolon_in_literal_does_not_end_statement() {
        let buf = buffer("    logger.info(\"a; \" + b); // done;");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(Level.INFO, "a; {0}", b);"#);
        assert_eq!(buf.slice(edit.range), Some(r#"logger.info("a; " + b);"#));
    }

    #[test]
    fn multi_line_statement_followed_by_another() {
        let buf = buffer("    logger.fine(\"n=\"\n            + n); n++;");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(Level.FINE, "n={0}", n);"#);
        assert_eq!(edit.range.end, Position::new(BODY + 1, 17));
    }

    #[test]
    fn throwable_argument_is_skipped() {
        let buf = buffer("    logger.log(Level.SEVERE, \"failed \" + id, ex);");
        assert_eq!(skipped(&buf, BODY), SkipReason::ExtraArguments);
        let buf = buffer("    logger.warning(\"failed \" + id, ex);");
        assert_eq!(skipped(&buf, BODY), SkipReason::ExtraArguments);
    }

    #[test]
    fn comma_inside_message_literal_is_kept() {
        let buf = buffer("    logger.log(Level.INFO, \"a, b: \" + count);");
        let edit = proposal(&buf, BODY);
        assert_eq!(edit.replacement, r#"logger.log(Level.INFO, "a, b: {0}", count);"#);
    }
}
