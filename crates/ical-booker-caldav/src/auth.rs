//! HTTP Basic authentication (RFC 7617).
//!
//! CalDAV providers targeted here (iCloud, Fastmail, most RFC 4791 servers)
//! accept app passwords over Basic auth, so the header is sent
//! preemptively on every request instead of waiting for a 401 challenge.

use base64::Engine;

/// Builds the `Authorization` header value for HTTP Basic auth.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}
