//! Resolution of which logging API a receiver variable is declared with.
//!
//! Resolution is two-phase. The header phase reads the import region (every
//! line before the first line containing `{`) and remembers the last logger
//! import it saw. The declaration phase continues from there and looks for
//! the receiver's declaration.

use crate::buffer::TextBuffer;
use crate::config::ResolverConfig;
use serde::Serialize;
use tracing::trace;

/// The logging APIs the formatter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerVariant {
    /// `java.util.logging.Logger`
    StandardJul,
    /// `org.apache.logging.log4j.Logger`
    Log4j,
}

/// Outcome of resolving a receiver's logger variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The declaration names the fully-qualified type
    Found(LoggerVariant),
    /// The declaration uses the unqualified type; variant taken from imports
    Fallback(LoggerVariant),
    /// No usable declaration or import
    Unresolved,
}

impl Resolution {
    pub fn variant(self) -> Option<LoggerVariant> {
        match self {
            Resolution::Found(variant) | Resolution::Fallback(variant) => Some(variant),
            Resolution::Unresolved => None,
        }
    }
}

/// Matches receiver declarations against the configured logger types.
#[derive(Debug, Clone)]
pub struct VariantResolver {
    standard_logger: String,
    log4j_logger: String,
}

impl Default for VariantResolver {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl VariantResolver {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            standard_logger: config.standard_logger.clone(),
            log4j_logger: config.log4j_logger.clone(),
        }
    }

    /// Resolve the variant of `receiver` within `buffer`.
    pub fn resolve<B: TextBuffer + ?Sized>(&self, buffer: &B, receiver: &str) -> Resolution {
        let (imported, body_start) = self.scan_imports(buffer);
        let resolution = self.scan_declarations(buffer, body_start, receiver, imported);
        trace!(receiver, ?imported, ?resolution, "resolved logger variant");
        resolution
    }

    /// Header phase: last logger import before the first `{`, and the index
    /// of the line that ended the header.
    fn scan_imports<B: TextBuffer + ?Sized>(&self, buffer: &B) -> (Option<LoggerVariant>, usize) {
        let standard_import = format!("import {};", self.standard_logger);
        let log4j_import = format!("import {};", self.log4j_logger);
        let mut imported = None;

        for idx in 0..buffer.line_count() {
            let line = normalize(buffer.line_at(idx));
            if line.contains('{') {
                return (imported, idx);
            }
            if line == standard_import {
                imported = Some(LoggerVariant::StandardJul);
            } else if line == log4j_import {
                imported = Some(LoggerVariant::Log4j);
            }
        }

        (imported, buffer.line_count())
    }

    /// Declaration phase: find `<type> <receiver>` from `from` onward.
    fn scan_declarations<B: TextBuffer + ?Sized>(
        &self,
        buffer: &B,
        from: usize,
        receiver: &str,
        imported: Option<LoggerVariant>,
    ) -> Resolution {
        let standard_decl = format!("{} {}", self.standard_logger, receiver);
        let log4j_decl = format!("{} {}", self.log4j_logger, receiver);
        let bare_decls = [
            format!("{} {}", simple_name(&self.standard_logger), receiver),
            format!("{} {}", simple_name(&self.log4j_logger), receiver),
        ];

        for idx in from..buffer.line_count() {
            let line = normalize(buffer.line_at(idx));
            if declares(&line, &standard_decl) {
                return Resolution::Found(LoggerVariant::StandardJul);
            }
            if declares(&line, &log4j_decl) {
                return Resolution::Found(LoggerVariant::Log4j);
            }
            if bare_decls.iter().any(|decl| declares(&line, decl)) {
                return match imported {
                    Some(variant) => Resolution::Fallback(variant),
                    None => Resolution::Unresolved,
                };
            }
        }

        Resolution::Unresolved
    }
}

/// `Logger` for `java.util.logging.Logger`.
fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Trim and collapse the first double space, so `Logger  log` still matches.
fn normalize(line: &str) -> String {
    line.trim().replacen("  ", " ", 1)
}

/// True if `line` contains `declaration` not followed by more identifier
/// characters, so `Logger log` does not match `Logger logger`.
fn declares(line: &str, declaration: &str) -> bool {
    line.match_indices(declaration).any(|(idx, _)| {
        !matches!(
            line[idx + declaration.len()..].chars().next(),
            Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$'
        )
    })
}
