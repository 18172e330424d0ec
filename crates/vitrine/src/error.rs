//! Error types for configuration and preset construction.

use vitrine_seeker::SeekerError;

/// Errors raised while loading configuration or building presets.
///
/// Nothing here is raised during filtering; these all surface at setup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// YAML configuration could not be parsed.
    #[error("invalid YAML in {what}: {source}")]
    Yaml {
        what: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON configuration or page data could not be parsed.
    #[error("invalid JSON in {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Page data had an unexpected shape.
    #[error("unexpected {what}: expected {expected}")]
    Shape {
        what: &'static str,
        expected: &'static str,
    },

    /// A native-id pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A pattern lacks a capture group the parser relies on.
    #[error("pattern '{pattern}' has no '{group}' capture group")]
    MissingGroup {
        pattern: String,
        group: &'static str,
    },

    /// Dimension definitions were rejected.
    #[error(transparent)]
    Seeker(#[from] SeekerError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
