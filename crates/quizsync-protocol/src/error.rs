//! Error types for the protocol layer.

/// Errors raised while parsing protocol-level values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The session code is not 6 characters from the code alphabet.
    #[error("invalid session code {0:?}")]
    InvalidCodeFormat(String),
}
