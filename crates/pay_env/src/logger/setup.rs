//!
//! Setup logging subsystem.
//!

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config;

/// Failure while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A global subscriber was already installed, or the filter directive was invalid
    #[error("Failed to initialize the logging subsystem")]
    InitializationFailed,
}

/// Holds the writer guards so buffered log lines are flushed when it is dropped
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

///
/// Setup logging sub-system specifying.
/// Expects config and list of names of crates to watch.
///
pub fn setup<Str: AsRef<str>>(
    conf: &config::Log,
    service_name: &str,
    crates_to_watch: impl IntoIterator<Item = Str>,
) -> error_stack::Result<TelemetryGuard, LoggerError> {
    use error_stack::ResultExt;

    let mut guards = Vec::new();

    let file_writer = if conf.file.enabled {
        let mut path = crate::env::workspace_path();
        path.push(PathBuf::from(&conf.file.path));
        let file_appender = tracing_appender::rolling::hourly(&path, &conf.file.file_name);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        let file_filter = get_envfilter(
            conf.file.filtering_directive.as_ref(),
            conf.file.level.into_level(),
            &[service_name],
        );
        Some(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
    } else {
        None
    };

    let crates_to_watch = crates_to_watch
        .into_iter()
        .map(|krate| krate.as_ref().to_owned())
        .collect::<Vec<_>>();

    let console_layer = if conf.console.enabled {
        let (console_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);

        let console_filter = get_envfilter(
            conf.console.filtering_directive.as_ref(),
            conf.console.level.into_level(),
            &crates_to_watch,
        );

        let layer = match conf.console.log_format {
            config::LogFormat::Default => fmt::layer()
                .with_timer(fmt::time::time())
                .with_span_events(fmt::format::FmtSpan::CLOSE)
                .pretty()
                .with_writer(console_writer)
                .with_filter(console_filter)
                .boxed(),
            config::LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(console_writer)
                .with_filter(console_filter)
                .boxed(),
        };
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_writer)
        .with(console_layer)
        .try_init()
        .change_context(LoggerError::InitializationFailed)
        .attach_printable_lazy(|| format!("Service {service_name} already has a subscriber"))?;

    // Returning the WorkerGuard for logs to be printed until it is dropped
    Ok(TelemetryGuard {
        _log_guards: guards,
    })
}

fn get_envfilter(
    filtering_directive: Option<&String>,
    default_log_level: tracing::Level,
    crates_to_filter: &[impl AsRef<str>],
) -> EnvFilter {
    filtering_directive
        .map(|filter| {
            // Try to create target filter from specified filtering directive, if set
            EnvFilter::builder()
                .with_default_directive(default_log_level.into())
                .parse_lossy(filter)
        })
        .unwrap_or_else(|| {
            // Construct a default target filter otherwise
            let directives = crates_to_filter
                .iter()
                .map(|krate| format!("{}={}", krate.as_ref(), default_log_level))
                .collect::<Vec<_>>()
                .join(",");
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .parse_lossy(directives)
        })
}
