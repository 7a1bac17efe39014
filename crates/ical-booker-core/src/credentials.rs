//! CalDAV account credentials.

use std::fmt;

use url::Url;

/// Credentials for one CalDAV account.
///
/// Passed explicitly to every operation; nothing in the workspace stores
/// them beyond the call that receives them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Server or principal URL, e.g. `https://p55-caldav.icloud.com`.
    pub principal: Url,
    /// Account user name, usually a full e-mail address.
    pub username: String,
    /// Password or app-specific password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from an already-parsed principal URL.
    pub fn new(principal: Url, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            principal,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses the principal URL and creates credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn parse(
        principal: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(principal.as_ref())?, username, password))
    }

    /// The part of the user name before `@` (the whole name if there is none).
    pub fn email_local_part(&self) -> &str {
        self.username
            .split_once('@')
            .map_or(self.username.as_str(), |(local, _)| local)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("principal", &self.principal.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
