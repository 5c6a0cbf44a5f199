use crate::template::DEFAULT_ITERATION_BUDGET;
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_STANDARD_LOGGER: &str = "java.util.logging.Logger";
pub const DEFAULT_LOG4J_LOGGER: &str = "org.apache.logging.log4j.Logger";
pub const DEFAULT_LEVEL_TYPE: &str = "Level";

/// Formatter settings, usually read from a `logger-formatter.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FormatterConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Maximum number of operands read from one message expression
    pub iteration_budget: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            iteration_budget: DEFAULT_ITERATION_BUDGET,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Fully-qualified type of the logger whose calls get rewritten
    pub standard_logger: String,
    /// Fully-qualified type of the logger left untouched
    pub log4j_logger: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            standard_logger: DEFAULT_STANDARD_LOGGER.to_string(),
            log4j_logger: DEFAULT_LOG4J_LOGGER.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Class holding the level constants, as in `Level.INFO`
    pub level_type: String,
    /// File extensions visited when a directory is given on the command line
    pub extensions: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            level_type: DEFAULT_LEVEL_TYPE.to_string(),
            extensions: vec!["java".to_string()],
        }
    }
}

impl FormatterConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.parser.iteration_budget == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "parser.iteration_budget",
                message: "must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("resolver.standard_logger", &self.resolver.standard_logger),
            ("resolver.log4j_logger", &self.resolver.log4j_logger),
            ("rewrite.level_type", &self.rewrite.level_type),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::EmptyField { field });
            } else if value.chars().any(char::is_whitespace) {
                issues.push(ValidationIssue::InvalidCombo {
                    message: format!("{field} must not contain whitespace"),
                });
            }
        }

        if !self.resolver.standard_logger.is_empty()
            && self.resolver.standard_logger == self.resolver.log4j_logger
        {
            issues.push(ValidationIssue::InvalidCombo {
                message: "resolver.standard_logger and resolver.log4j_logger must differ"
                    .to_string(),
            });
        }

        if self.rewrite.extensions.is_empty() {
            issues.push(ValidationIssue::EmptyField {
                field: "rewrite.extensions",
            });
        }
        for ext in &self.rewrite.extensions {
            if ext.trim().is_empty() || ext.starts_with('.') {
                issues.push(ValidationIssue::InvalidCombo {
                    message: format!("extension '{ext}' must be a bare name such as 'java'"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyField { field: &'static str },
    OutOfRange { field: &'static str, message: String },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyField { field } => write!(f, "'{field}' must not be empty"),
            ValidationIssue::OutOfRange { field, message } => {
                write!(f, "'{field}' is out of range: {message}")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid formatter configuration: {message}")
            }
        }
    }
}
