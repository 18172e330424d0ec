//! Error types for the seeker crate.

use thiserror::Error;

/// Errors raised while assembling a dimension set.
///
/// Runtime paths (extraction, evaluation, counting) never fail; they degrade
/// and log instead. Only configuration mistakes surface as errors.
#[derive(Debug, Error)]
pub enum SeekerError {
    /// Two dimensions share the same key.
    #[error("duplicate dimension key '{0}'")]
    DuplicateDimension(String),

    /// A bucketed dimension declared no buckets.
    #[error("dimension '{0}' has no buckets")]
    EmptyBuckets(String),

    /// Two buckets of one dimension share an id.
    #[error("dimension '{dimension}' declares bucket '{bucket}' twice")]
    DuplicateBucket { dimension: String, bucket: String },

    /// A divisibility bucket with a zero divisor.
    #[error("dimension '{dimension}' bucket '{bucket}' divides by zero")]
    ZeroDivisor { dimension: String, bucket: String },

    /// A text dimension with no fields to search.
    #[error("text dimension '{0}' has no source fields")]
    EmptyTextSources(String),
}

/// Result type for seeker operations.
pub type Result<T> = std::result::Result<T, SeekerError>;
