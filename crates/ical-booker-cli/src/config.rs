//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/ical-booker/config.toml` by default:
//!
//! ```toml
//! [account]
//! principal = "https://p55-caldav.icloud.com"
//! username = "me@icloud.com"
//! password = "pass::icloud/app-password"
//!
//! [http]
//! timeout = 30
//!
//! [email]
//! service_id = "service_xxx"
//! template_id = "template_xxx"
//! public_key = "..."
//! private_key = "env::EMAILJS_PRIVATE_KEY"
//! admin_email = "me@example.com"
//! timezone = "America/Toronto"
//! ```
//!
//! `account.password` and `email.private_key` support secret references
//! (`pass::…`, `env::…`), see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use ical_booker_caldav::{EmailConfig, HttpConfig};
use ical_booker_core::Credentials;

use crate::secret;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the ical-booker client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// CalDAV account.
    pub account: Option<AccountSettings>,

    /// HTTP transport settings.
    pub http: HttpSettings,

    /// Booking notification settings.
    pub email: Option<EmailSettings>,
}

/// CalDAV account settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Server or principal URL.
    pub principal: String,

    /// Account user name, usually an e-mail address.
    pub username: String,

    /// Password or app-specific password (supports `pass::` and `env::`).
    pub password: String,
}

impl AccountSettings {
    /// Resolves the password and builds credentials.
    pub fn to_credentials(&self) -> Result<Credentials, String> {
        if self.username.is_empty() {
            return Err("account.username is empty".to_string());
        }
        let password = secret::resolve_named("account.password", &self.password)?;
        Credentials::parse(&self.principal, &self.username, password)
            .map_err(|e| format!("invalid account.principal '{}': {}", self.principal, e))
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout: u64,

    /// Skip TLS certificate verification.
    pub insecure: bool,

    /// Custom user agent.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: HttpConfig::DEFAULT_TIMEOUT_SECS,
            insecure: false,
            user_agent: None,
        }
    }
}

impl HttpSettings {
    /// Converts to transport configuration.
    pub fn to_http_config(&self) -> HttpConfig {
        let mut config = HttpConfig::new().with_timeout(Duration::from_secs(self.timeout));
        if self.insecure {
            config = config.with_insecure_tls();
        }
        if let Some(ref agent) = self.user_agent {
            config = config.with_user_agent(agent);
        }
        config
    }
}

/// EmailJS notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// EmailJS service id.
    pub service_id: String,
    /// EmailJS template id.
    pub template_id: String,
    /// EmailJS public key.
    pub public_key: String,
    /// EmailJS private key (supports `pass::` and `env::`).
    pub private_key: String,
    /// Address notified of every booking.
    pub admin_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Sender address.
    pub from_email: String,
    /// `origin` header sent to EmailJS.
    pub origin: Option<String>,
    /// IANA zone used to render event times.
    pub timezone: Option<String>,
}

impl EmailSettings {
    /// Resolves the private key and builds the notification configuration.
    pub fn to_email_config(&self) -> Result<EmailConfig, String> {
        for (name, value) in [
            ("email.service_id", &self.service_id),
            ("email.template_id", &self.template_id),
            ("email.public_key", &self.public_key),
            ("email.admin_email", &self.admin_email),
        ] {
            if value.is_empty() {
                return Err(format!("{} is empty", name));
            }
        }

        let private_key = secret::resolve_named("email.private_key", &self.private_key)?;
        let mut config = EmailConfig::new(
            &self.service_id,
            &self.template_id,
            &self.public_key,
            private_key,
            &self.admin_email,
        )
        .with_sender(&self.from_name, &self.from_email);

        if let Some(ref origin) = self.origin {
            config = config.with_origin(origin);
        }
        if let Some(ref name) = self.timezone {
            let tz: Tz = name
                .parse()
                .map_err(|_| format!("unknown email.timezone '{}'", name))?;
            config = config.with_timezone(tz);
        }

        Ok(config)
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ical-booker")
    }

    /// The account section, or an error pointing at the config file.
    pub fn require_account(&self) -> Result<&AccountSettings, String> {
        self.account.as_ref().ok_or_else(|| {
            format!(
                "CalDAV account not configured. Add to {}:\n  \
                 [account]\n  \
                 principal = \"https://p55-caldav.icloud.com\"\n  \
                 username = \"me@icloud.com\"\n  \
                 password = \"pass::icloud/app-password\"",
                Self::default_path().display()
            )
        })
    }
}
