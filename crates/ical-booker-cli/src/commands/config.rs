//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const REDACTED: &str = "<redacted>";

/// Dump the current configuration to stdout.
///
/// Clear-text secrets are masked; `pass::` and `env::` references are shown
/// as written.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(&redacted(config))
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, resolving every secret it references.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let account = config.require_account().map_err(ClientError::Config)?;
    let creds = account.to_credentials().map_err(ClientError::Config)?;
    println!("Account {} at {} is valid.", creds.username, creds.principal);

    if let Some(ref email) = config.email {
        email.to_email_config().map_err(ClientError::Config)?;
        println!("Email notification settings are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

fn redacted(config: &ClientConfig) -> ClientConfig {
    let mut config = config.clone();
    if let Some(ref mut account) = config.account {
        account.password = mask(&account.password);
    }
    if let Some(ref mut email) = config.email {
        email.private_key = mask(&email.private_key);
    }
    config
}

fn mask(value: &str) -> String {
    if value.is_empty() || value.starts_with("pass::") || value.starts_with("env::") {
        value.to_string()
    } else {
        REDACTED.to_string()
    }
}
