//! connector integration related const declarations

/// No error message string const
pub const NO_ERROR_MESSAGE: &str = "No error message";

/// No error code string const
pub const NO_ERROR_CODE: &str = "No error code";

/// Default client ip for channels where the gateway only records it
pub const DEFAULT_CLIENT_IP: &str = "127.0.0.1";
