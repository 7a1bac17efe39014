//! Error types for CalDAV operations.
//!
//! Every fallible operation in this crate returns [`CalDavResult`]. The
//! [`CalDavErrorCode`] tells callers which policy applies:
//!
//! - `Discovery` is fatal to discovery; retry discovery from scratch
//! - `Transport` means the server could not be reached at all
//! - `Booking` and `Notification` carry the HTTP status of the rejecting answer

use std::fmt;
use thiserror::Error;

/// The category of a CalDAV error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalDavErrorCode {
    /// Principal, calendar-home or calendar listing could not be resolved.
    Discovery,
    /// Connection, TLS, timeout or body read failure.
    Transport,
    /// A request body could not be serialized.
    Encoding,
    /// Calendar data or a recurrence rule could not be parsed.
    Parse,
    /// The booking PUT was rejected.
    Booking,
    /// A booking notification could not be delivered.
    Notification,
    /// Caller-supplied input was rejected before any request was made.
    InvalidInput,
    /// Client configuration is invalid.
    Configuration,
}

impl CalDavErrorCode {
    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery_failed",
            Self::Transport => "transport_error",
            Self::Encoding => "encoding_error",
            Self::Parse => "parse_error",
            Self::Booking => "booking_failed",
            Self::Notification => "notification_failed",
            Self::InvalidInput => "invalid_input",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for CalDavErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a CalDAV server.
#[derive(Debug, Error)]
pub struct CalDavError {
    code: CalDavErrorCode,
    message: String,
    /// HTTP status of the failing response, if there was one.
    status: Option<u16>,
    /// URLs tried before giving up (calendar-home fallback probing).
    attempted_urls: Vec<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CalDavError {
    /// Creates a new error with the given code and message.
    pub fn new(code: CalDavErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            attempted_urls: Vec::new(),
            source: None,
        }
    }

    /// Creates a discovery error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Discovery, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Transport, message)
    }

    /// Creates a request encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Encoding, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Parse, message)
    }

    /// Creates a booking error.
    pub fn booking(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Booking, message)
    }

    /// Creates a notification error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Notification, message)
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::InvalidInput, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalDavErrorCode::Configuration, message)
    }

    /// Attaches the HTTP status of the failing response.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the list of URLs that were tried.
    pub fn with_attempted_urls(mut self, urls: Vec<String>) -> Self {
        self.attempted_urls = urls;
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> CalDavErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if any.
    pub fn http_status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the URLs tried before failing.
    pub fn attempted_urls(&self) -> &[String] {
        &self.attempted_urls
    }

    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self.code {
            CalDavErrorCode::Transport => true,
            CalDavErrorCode::Booking
            | CalDavErrorCode::Notification
            | CalDavErrorCode::Discovery => {
                self.status.is_some_and(|s| s >= 500 || s == 429)
            }
            _ => false,
        }
    }
}

impl fmt::Display for CalDavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

/// A specialized Result type for CalDAV operations.
pub type CalDavResult<T> = Result<T, CalDavError>;
