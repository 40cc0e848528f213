//! Commonly used constants

/// Base64 engine used for signatures and key material
pub const BASE64_ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Length of the random `nonce_str` sent with signed requests
pub const NONCE_LENGTH: usize = 32;

/// Number of minor units in one major unit of CNY
pub const CNY_MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Default timeout for outbound requests, in seconds
pub const REQUEST_TIME_OUT: u64 = 30;
