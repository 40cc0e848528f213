#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod ext_traits;
pub mod request;
pub mod types;

/// Date-time utilities.
pub mod date_time {
    use time::{macros::format_description, OffsetDateTime, UtcOffset};

    use crate::errors::{CustomResult, ParsingError};

    /// Offset of China Standard Time, the clock both gateways expect timestamps in.
    const CHINA_STANDARD_TIME: UtcOffset = time::macros::offset!(+8);

    /// Current time in UTC.
    pub fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Seconds since the unix epoch.
    pub fn now_unix_timestamp() -> i64 {
        now().unix_timestamp()
    }

    /// Format a timestamp as `YYYY-MM-DD HH:MM:SS` in China Standard Time.
    pub fn format_china_standard_time(
        date_time: OffsetDateTime,
    ) -> CustomResult<String, ParsingError> {
        use error_stack::ResultExt;

        date_time
            .to_offset(CHINA_STANDARD_TIME)
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .change_context(ParsingError::DateTimeParsingError)
    }

}
