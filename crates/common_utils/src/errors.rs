//! Error types shared by the payment crates

/// `Result` whose error is an [`error_stack::Report`] carrying context `E`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Failures turning data into or out of a wire format
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    /// The input did not deserialize into the named type
    #[error("Failed to parse struct: {0}")]
    StructParseFailure(&'static str),
    /// The value could not be serialized into the named format
    #[error("Failed to serialize to {0} format")]
    EncodeError(&'static str),
    /// A timestamp did not match the expected format
    #[error("Failed to parse datetime")]
    DateTimeParsingError,
    /// An amount could not be moved between minor and major units
    #[error("Failed to convert amount {value:?} between minor and major units")]
    AmountConversionFailed {
        /// Amount as it was given
        value: String,
    },
    /// A converted amount does not fit the target integer
    #[error("Integer overflow while converting {0}")]
    IntegerOverflow(&'static str),
}

/// Rejected configuration or input values
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Human readable reason
    #[error("{message}")]
    InvalidValue {
        /// What was wrong with the value
        message: String,
    },
}

/// Failures of the signing primitives
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The key rejected the message
    #[error("Failed to sign message")]
    MessageSigningFailed,
    /// The signature does not match the message
    #[error("Failed to verify signature")]
    SignatureVerificationFailed,
    /// Key material was not valid PEM, base64 DER or the expected key type
    #[error("Invalid key material: {0}")]
    InvalidKey(&'static str),
}
