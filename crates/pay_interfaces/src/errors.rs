//! Errors raised by the adapters and the transport

use crate::types::Way;

/// Coarse classification of a [`ConnectorError`]
///
/// Callers use it to pick between a generic "payment unavailable" message
/// (configuration and transport problems) and the gateway's own reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials or settings are unusable
    Configuration,
    /// A signature from the gateway is absent or does not match
    SignatureVerification,
    /// The adapter does not implement the requested channel
    UnsupportedChannel,
    /// The order cannot be turned into a gateway request
    InvalidRequest,
    /// The gateway could not be reached or answered with something unreadable
    ProviderTransport,
    /// The gateway answered and declined the operation
    ProviderBusiness,
}

/// Error raised by a payment gateway adapter
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConnectorError {
    #[error("Invalid connector configuration: {config}")]
    InvalidConnectorConfig { config: &'static str },
    #[error("{way} is not supported by {connector}")]
    WayNotSupported { way: Way, connector: &'static str },
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("Invalid value for field: {field_name}")]
    InvalidDataFormat { field_name: &'static str },
    #[error("Failed to encode connector request")]
    RequestEncodingFailed,
    #[error("Request to connector could not be sent")]
    RequestNotSent,
    #[error("Connector responded with unexpected status {status_code}")]
    UnexpectedResponseStatus { status_code: u16 },
    #[error("Failed to deserialize connector response")]
    ResponseDeserializationFailed,
    #[error("Connector response signature could not be verified")]
    ResponseSignatureVerificationFailed,
    #[error("Connector rejected the request: {message}")]
    ConnectorReturnedFailure { message: String },
    #[error("Connector declined the operation: {code} {message}")]
    FailedAtConnector { code: String, message: String },
    #[error("Failed to decode notification body")]
    WebhookBodyDecodingFailed,
    #[error("Signature not found for incoming notification")]
    WebhookSignatureNotFound,
    #[error("Failed to verify notification source")]
    WebhookSourceVerificationFailed,
}

impl ConnectorError {
    /// Which of the caller facing error kinds this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConnectorConfig { .. } => ErrorCategory::Configuration,
            Self::WayNotSupported { .. } => ErrorCategory::UnsupportedChannel,
            Self::MissingRequiredField { .. }
            | Self::InvalidDataFormat { .. }
            | Self::RequestEncodingFailed => ErrorCategory::InvalidRequest,
            Self::RequestNotSent
            | Self::UnexpectedResponseStatus { .. }
            | Self::ResponseDeserializationFailed => ErrorCategory::ProviderTransport,
            Self::ResponseSignatureVerificationFailed
            | Self::WebhookBodyDecodingFailed
            | Self::WebhookSignatureNotFound
            | Self::WebhookSourceVerificationFailed => ErrorCategory::SignatureVerification,
            Self::ConnectorReturnedFailure { .. } | Self::FailedAtConnector { .. } => {
                ErrorCategory::ProviderBusiness
            }
        }
    }

    /// Gateway supplied code and message, for business failures
    pub fn connector_reason(&self) -> Option<(&str, &str)> {
        match self {
            Self::FailedAtConnector { code, message } => Some((code.as_str(), message.as_str())),
            Self::ConnectorReturnedFailure { message } => {
                Some((crate::consts::NO_ERROR_CODE, message.as_str()))
            }
            _ => None,
        }
    }
}

/// Failure of the HTTP transport
#[allow(missing_docs)]
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum HttpClientError {
    #[error("Client construction failed")]
    ClientConstructionFailed,
    #[error("Invalid proxy configuration")]
    InvalidProxyConfiguration,
    #[error("Header map construction failed")]
    HeaderMapConstructionFailed,
    #[error("URL parsing failed")]
    UrlParsingFailed,
    #[error("Request was not sent: {0}")]
    RequestNotSent(String),
    #[error("Request timed out")]
    RequestTimeoutReceived,
    #[error("Failed to decode response")]
    ResponseDecodingFailed,
}
