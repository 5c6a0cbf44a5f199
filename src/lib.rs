//! Logger Formatter: parameterized logging messages for Java sources
//!
//! Rewrites standard-library logging calls whose message is built by string
//! concatenation into the positional-parameter form:
//!
//! ```text
//! logger.info("id:" + id);   =>   logger.log(Level.INFO, "id:{0}", id);
//! ```
//!
//! # Architecture
//!
//! Given a buffer and a trigger line, [`Formatter::propose`] recovers the
//! statement around the trigger ([`locator`]), checks that it looks like a
//! logging call ([`classify`]), determines which logging API the receiver is
//! declared with ([`variant`]) and converts the message expression into a
//! template ([`template`]). The result is a [`ProposedEdit`] in line/column
//! terms; [`Edit`] pins it to bytes and applies it with before-text
//! verification.
//!
//! Only `java.util.logging` receivers are rewritten. Statements that do not
//! qualify are skipped with a [`SkipReason`]; malformed message expressions
//! abort with a [`RewriteError`] and never yield a partial edit.
//!
//! # Example
//!
//! ```
//! use logger_formatter::{Formatter, LineBuffer, RewriteOutcome};
//!
//! let source = "import java.util.logging.Logger;\n\
//!               class Job {\n\
//!               \x20   Logger logger;\n\
//!               \x20   void run() {\n\
//!               \x20       logger.info(\"job id:\" + jobId);\n\
//!               \x20   }\n\
//!               }\n";
//! let buffer = LineBuffer::new(source);
//!
//! match Formatter::default().propose(&buffer, 4).unwrap() {
//!     RewriteOutcome::Proposed(edit) => {
//!         assert_eq!(edit.replacement, r#"logger.log(Level.INFO, "job id:{0}", jobId);"#);
//!     }
//!     RewriteOutcome::Skipped(reason) => panic!("skipped: {reason}"),
//! }
//! ```

pub mod buffer;
pub mod classify;
pub mod config;
pub mod edit;
pub mod locator;
pub mod rewrite;
pub mod scan;
pub mod template;
pub mod variant;

// Re-exports
pub use buffer::{LineBuffer, Position, Range, TextBuffer};
pub use classify::{is_already_templated, is_logging_call, LOG_LEVELS};
pub use config::{load_from_path, load_from_str, ConfigError, FormatterConfig};
pub use edit::{apply_to_source, Edit, EditError, EditResult, EditVerification};
pub use locator::{locate, CodeBlock};
pub use rewrite::{Formatter, ProposedEdit, RewriteError, RewriteOutcome, ScanReport, SkipReason};
pub use template::{standardize, Operand, ParseError, TemplateParser, TemplateResult};
pub use variant::{LoggerVariant, Resolution, VariantResolver};
