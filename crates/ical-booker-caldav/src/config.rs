//! HTTP transport configuration.

use std::time::Duration;

/// Configuration for [`HttpTransport`](crate::HttpTransport).
///
/// Credentials are deliberately not part of this struct: they travel with
/// each operation.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl HttpConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("ical-booker/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HttpConfig::default();
        assert!(config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("ical-booker/"));
    }

    #[test]
    fn builder_methods() {
        let config = HttpConfig::new()
            .with_insecure_tls()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("booking-page/2.1");

        assert!(!config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "booking-page/2.1");
    }
}
