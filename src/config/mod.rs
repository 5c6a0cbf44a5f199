pub mod loader;
pub mod schema;

pub use loader::{
    discover, load_discovered, load_from_path, load_from_str, ConfigError, ConfigOrigin,
    CONFIG_FILE_NAME,
};
pub use schema::{
    FormatterConfig, ParserConfig, ResolverConfig, RewriteConfig, ValidationError,
    ValidationIssue,
};
