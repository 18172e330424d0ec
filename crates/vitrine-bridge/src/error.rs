//! Error types for host ports.

use vitrine_seeker::SeekerError;

/// Errors raised by host ports and engine activation.
///
/// Calls made on behalf of a user interaction never surface these; the engine
/// logs them and carries on with whatever state it can read back.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The native widget rejected or failed a call.
    #[error("native widget call failed: {0}")]
    Native(String),

    /// The native widget does not expose an entry point the call needs.
    #[error("native widget has no '{0}' entry point")]
    Unsupported(&'static str),

    /// The host key-value store refused a write.
    #[error("host store write failed for '{key}': {reason}")]
    Store { key: String, reason: String },

    /// A cache value could not be encoded.
    #[error("could not encode cache entry '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid dimension definitions handed to activation.
    #[error(transparent)]
    Seeker(#[from] SeekerError),
}

impl BridgeError {
    /// Create a native widget error.
    pub fn native(msg: impl Into<String>) -> Self {
        Self::Native(msg.into())
    }
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
