//! Log output for ical-booker binaries.
//!
//! The library crates only emit `tracing` events under the `ical_booker_*`
//! targets. A binary calls [`init_tracing`] once; all output goes to stderr
//! so stdout stays free for command results.
//!
//! ```ignore
//! use ical_booker_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli(verbose))?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log records are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One compact line per record, no timestamp.
    #[default]
    Text,
    /// One JSON object per record, with timestamp and source location.
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level of the `ical_booker*` targets when neither `filter` nor
    /// `RUST_LOG` is set.
    pub level: Level,
    pub format: LogFormat,
    /// Show file, line and target on text records.
    pub verbose: bool,
    /// Explicit filter directive; wins over `RUST_LOG`.
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Warnings only, or everything from `debug` up with source locations.
    #[must_use]
    pub fn cli(verbose: bool) -> Self {
        Self {
            level: if verbose { Level::DEBUG } else { Level::WARN },
            format: LogFormat::Text,
            verbose,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Directive used when neither `filter` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        format!("ical_booker={}", self.level)
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.filter {
            Some(ref directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli(false)
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if a global subscriber is already set or the filter directive is
/// invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.env_filter()?;

    let layer = match config.format {
        LogFormat::Text => fmt::layer()
            .compact()
            .without_time()
            .with_writer(std::io::stderr)
            .with_target(config.verbose)
            .with_file(config.verbose)
            .with_line_number(config.verbose)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    };

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(filter).with(layer))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_and_verbose_cli() {
        let quiet = TracingConfig::cli(false);
        assert_eq!(quiet.level, Level::WARN);
        assert_eq!(quiet.format, LogFormat::Text);
        assert_eq!(quiet.default_directive(), "ical_booker=WARN");

        let verbose = TracingConfig::cli(true);
        assert!(verbose.verbose);
        assert_eq!(verbose.default_directive(), "ical_booker=DEBUG");
    }

    #[test]
    fn explicit_filter_is_parsed() {
        let config = TracingConfig::cli(false)
            .with_format(LogFormat::Json)
            .with_filter("ical_booker_caldav=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.env_filter().is_ok());

        let bad = TracingConfig::cli(false).with_filter("ical_booker=loud");
        assert!(matches!(bad.env_filter(), Err(TracingError::Filter(_))));
    }
}
