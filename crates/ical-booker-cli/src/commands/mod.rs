//! Subcommand implementations.

pub mod book;
pub mod busy;
pub mod calendars;
pub mod config;

use ical_booker_caldav::HttpTransport;
use ical_booker_core::{Calendar, Credentials};

use crate::config::{AccountSettings, ClientConfig};
use crate::error::{ClientError, ClientResult};

/// Account overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct AccountOverrides {
    pub principal: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AccountOverrides {
    fn is_empty(&self) -> bool {
        self.principal.is_none() && self.username.is_none() && self.password.is_none()
    }

    /// Layers the overrides on top of the configured account.
    pub fn apply(&self, config: &ClientConfig) -> ClientResult<AccountSettings> {
        let mut account = if self.is_empty() {
            config.require_account().map_err(ClientError::Config)?.clone()
        } else {
            config.account.clone().unwrap_or_default()
        };

        if let Some(ref principal) = self.principal {
            account.principal = principal.clone();
        }
        if let Some(ref username) = self.username {
            account.username = username.clone();
        }
        if let Some(ref password) = self.password {
            account.password = password.clone();
        }
        Ok(account)
    }
}

/// Credentials plus a transport, ready for CalDAV calls.
pub struct Session {
    pub creds: Credentials,
    pub transport: HttpTransport,
}

impl Session {
    /// Resolves the account and builds the HTTP transport.
    pub fn open(config: &ClientConfig, overrides: &AccountOverrides) -> ClientResult<Self> {
        let creds = overrides
            .apply(config)?
            .to_credentials()
            .map_err(ClientError::Config)?;
        let transport = HttpTransport::new(&config.http.to_http_config())?;
        Ok(Self { creds, transport })
    }
}

/// Picks the calendars whose display name or URL matches one of `wanted`.
///
/// An empty `wanted` keeps every calendar. A selector that matches nothing
/// is an error.
pub fn select_calendars(calendars: Vec<Calendar>, wanted: &[String]) -> ClientResult<Vec<Calendar>> {
    if wanted.is_empty() {
        return Ok(calendars);
    }

    if let Some(missing) = wanted
        .iter()
        .find(|w| !calendars.iter().any(|c| matches_calendar(c, w)))
    {
        return Err(ClientError::InvalidArgument(format!(
            "no calendar named '{}' (available: {})",
            missing,
            calendars
                .iter()
                .map(|c| c.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    Ok(calendars
        .into_iter()
        .filter(|c| wanted.iter().any(|w| matches_calendar(c, w)))
        .collect())
}

fn matches_calendar(calendar: &Calendar, selector: &str) -> bool {
    calendar.display_name.eq_ignore_ascii_case(selector) || calendar.url.as_str() == selector
}
