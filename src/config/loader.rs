use crate::config::schema::{FormatterConfig, ValidationError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up next to the files being formatted.
pub const CONFIG_FILE_NAME: &str = "logger-formatter.toml";

/// Where a configuration was read from, carried by every [`ConfigError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Named on the command line
    Explicit(PathBuf),
    /// Found by walking up from the working directory
    Discovered(PathBuf),
    /// Parsed from a string
    Inline,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Explicit(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Discovered(path) => write!(f, "{} (found by search)", path.display()),
            ConfigOrigin::Inline => f.write_str("<inline>"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read formatter config {origin}: {source}")]
    Read {
        origin: ConfigOrigin,
        source: io::Error,
    },

    #[error("formatter config {origin} is not valid: {source}")]
    Syntax {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },

    #[error("formatter config {origin} has {} rejected setting(s):\n{source}", .source.issues.len())]
    Rejected {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn origin(&self) -> &ConfigOrigin {
        match self {
            ConfigError::Read { origin, .. }
            | ConfigError::Syntax { origin, .. }
            | ConfigError::Rejected { origin, .. } => origin,
        }
    }
}

/// Deserialize and validate one config text.
fn parse(input: &str, origin: ConfigOrigin) -> Result<FormatterConfig, ConfigError> {
    let config: FormatterConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Syntax { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Rejected { origin, source }),
    }
}

fn read(path: &Path, origin: ConfigOrigin) -> Result<FormatterConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => parse(&contents, origin),
        Err(source) => Err(ConfigError::Read { origin, source }),
    }
}

pub fn load_from_str(input: &str) -> Result<FormatterConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

/// Load the config file named by the user.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FormatterConfig, ConfigError> {
    let path = path.as_ref();
    read(path, ConfigOrigin::Explicit(path.to_path_buf()))
}

/// Find `logger-formatter.toml` in `start` or one of its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load the nearest config above `start`, if there is one.
///
/// A config that is found but unreadable or invalid is an error rather
/// than a silent fallback to the defaults.
pub fn load_discovered(start: &Path) -> Result<Option<(PathBuf, FormatterConfig)>, ConfigError> {
    let Some(path) = discover(start) else {
        return Ok(None);
    };
    let config = read(&path, ConfigOrigin::Discovered(path.clone()))?;
    Ok(Some((path, config)))
}
