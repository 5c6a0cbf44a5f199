//! Narrow recognition of `receiver.level(args);` statements.

use once_cell::sync::Lazy;
use regex::Regex;

/// Level methods recognised on a logger receiver, compared case-insensitively.
pub const LOG_LEVELS: &[&str] = &[
    "log", "debug", "error", "fatal", "info", "trace", "warn", "severe", "warning", "config",
    "fine", "finer", "finest",
];

/// `<identifier>.<level>(<anything>);` over a whole trimmed statement.
static LOGGING_CALL_REGEX: Lazy<Regex> = Lazy::new(|| {
    let levels = LOG_LEVELS
        .iter()
        .map(|level| format!("({level})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^([a-zA-Z_$]+[a-zA-Z_$0-9]*)+\.({levels})\(.+?;$"))
        .expect("logging call regex is valid")
});

/// A brace-enclosed integer, as left behind by a previous rewrite.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\d+.*?\}").expect("placeholder regex is valid"));

/// True if `statement` has the shape of a logging call.
///
/// Says nothing about whether the message is already templated; see
/// [`is_already_templated`].
pub fn is_logging_call(statement: &str) -> bool {
    LOGGING_CALL_REGEX.is_match(statement.trim())
}

/// True if `statement` already contains a positional placeholder such as `{0}`.
pub fn is_already_templated(statement: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_each_level() {
        for level in LOG_LEVELS {
            let statement = format!(r#"logger.{level}("x");"#);
            assert!(is_logging_call(&statement), "{statement}");
        }
    }

    #[test]
    fn level_is_case_insensitive() {
        assert!(is_logging_call(r#"logger.INFO("x");"#));
        assert!(is_logging_call(r#"LOG.Severe("x" + y);"#));
    }

    #[test]
    fn accepts_concatenated_messages() {
        assert!(is_logging_call(
            r#"logger.info("job id:" + String.valueOf(jobId));"#
        ));
        assert!(is_logging_call(
            r#"logger.info("job id:" + String.valueOf(jobId) + " is running");"#
        ));
        assert!(is_logging_call(
            r#"logger.log(Level.SEVERE, "a" + b);"#
        ));
    }

    #[test]
    fn receiver_names() {
        assert!(is_logging_call(r#"logger2.info("x");"#));
        assert!(is_logging_call(r#"$log.info("x");"#));
        assert!(is_logging_call(r#"_LOG.info("x");"#));
        assert!(!is_logging_call(r#"2logger.info("x");"#));
        assert!(!is_logging_call(r#"this.logger.info("x");"#));
    }

    #[test]
    fn requires_trailing_semicolon() {
        assert!(!is_logging_call(r#"logger.info("x")"#));
        assert!(!is_logging_call(r#"logger.info("x" +"#));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(is_logging_call("   logger.info(\"x\");  "));
    }

    #[test]
    fn rejects_other_methods() {
        assert!(!is_logging_call(r#"logger.setLevel(Level.ALL);"#));
        assert!(!is_logging_call(r#"System.out.println("x");"#));
        assert!(!is_logging_call(r#"int x = 3;"#));
        assert!(!is_logging_call(""));
    }

    #[test]
    fn classifier_ignores_existing_placeholders() {
        let statement = r#"logger.info("x" + "{0}"+x);"#;
        assert!(is_logging_call(statement));
        assert!(is_already_templated(statement));
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_already_templated(r#"logger.log(Level.INFO, "id:{0}", id);"#));
        assert!(is_already_templated(r#"logger.log(Level.INFO, "{12,number}", n);"#));
        assert!(!is_already_templated(r#"logger.info("id:" + id);"#));
        assert!(!is_already_templated(r#"logger.info("{name}" + id);"#));
    }
}
