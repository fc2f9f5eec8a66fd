//! Error types for olsr-packet.

use thiserror::Error;

/// Errors that can occur while parsing a wire line.
#[derive(Debug, Error)]
pub enum PacketError {
    /// The line does not have the general shape of any message.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),

    /// The message kind keyword is not HELLO, TC, or DATA.
    ///
    /// This indicates a simulator bug, not a recoverable runtime
    /// condition; consumers treat it as fatal.
    #[error("unknown message kind: {0:?}")]
    UnknownKind(String),

    /// A field that should hold a non-negative integer did not parse.
    #[error("invalid value for {field}: {value:?}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// The raw token that failed to parse.
        value: String,
    },

    /// A required field is missing from the line.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl PacketError {
    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        PacketError::InvalidFormat(message.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        PacketError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for codec operations.
pub type PacketResult<T> = Result<T, PacketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PacketError::invalid_field("seq", "abc");
        assert!(err.to_string().contains("seq"));
        assert!(err.to_string().contains("abc"));

        let err = PacketError::UnknownKind("PING".to_string());
        assert!(err.to_string().contains("PING"));
    }
}
