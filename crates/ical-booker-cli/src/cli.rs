//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

/// ical-booker - CalDAV availability and booking
#[derive(Debug, Parser)]
#[command(name = "ical-booker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ICAL_BOOKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Write log records to stderr as JSON lines
    #[arg(long)]
    pub log_json: bool,

    // --- Account overrides ---
    /// Server or principal URL (overrides account.principal)
    #[arg(long, env = "ICAL_BOOKER_PRINCIPAL")]
    pub principal: Option<String>,

    /// Account user name (overrides account.username)
    #[arg(long, env = "ICAL_BOOKER_USERNAME")]
    pub username: Option<String>,

    /// Password or secret reference (overrides account.password)
    #[arg(long, env = "ICAL_BOOKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the calendars of the account
    Calendars,

    /// List busy intervals in a time window
    Busy {
        /// Window start (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_instant)]
        from: DateTime<Utc>,

        /// Window end (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_instant)]
        to: DateTime<Utc>,

        /// Only query calendars with this name or URL (can be repeated)
        #[arg(long, action = clap::ArgAction::Append)]
        calendar: Vec<String>,

        /// Skip events with STATUS:CANCELLED
        #[arg(long)]
        exclude_cancelled: bool,

        /// Skip events with TRANSP:TRANSPARENT
        #[arg(long)]
        exclude_transparent: bool,
    },

    /// Create an event in a calendar
    Book {
        /// Calendar name or URL
        #[arg(long)]
        calendar: String,

        /// Event start (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,

        /// Event end (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_instant, conflicts_with = "duration")]
        end: Option<DateTime<Utc>>,

        /// Event length in minutes
        #[arg(long, default_value = "30")]
        duration: u32,

        /// Event title
        #[arg(long)]
        title: String,

        /// Attendee e-mail address (can be repeated)
        #[arg(long, action = clap::ArgAction::Append)]
        attendee: Vec<String>,

        /// Event description
        #[arg(long)]
        description: Option<String>,

        /// Event location
        #[arg(long)]
        location: Option<String>,

        /// Send EmailJS confirmations after booking
        #[arg(long)]
        notify: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

/// Parses an RFC 3339 timestamp, or a date taken as midnight UTC.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{}' is neither RFC 3339 nor YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_json_is_independent_of_json_output() {
        let cli = Cli::try_parse_from(["ical-booker", "--log-json", "calendars"]).unwrap();
        assert!(cli.log_json);
        assert!(!cli.json);
    }

    #[test]
    fn parse_instant_formats() {
        assert_eq!(
            parse_instant("2025-03-10T14:00:00Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2025-03-10T10:00:00-04:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2025-03-10").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
        );
        assert!(parse_instant("next tuesday").is_err());
    }

    #[test]
    fn parses_busy_command() {
        let cli = Cli::try_parse_from([
            "ical-booker",
            "busy",
            "--from",
            "2025-03-10",
            "--to",
            "2025-03-17",
            "--calendar",
            "Work",
            "--calendar",
            "Home",
            "--exclude-cancelled",
        ])
        .unwrap();

        match cli.command {
            Command::Busy {
                from,
                to,
                calendar,
                exclude_cancelled,
                exclude_transparent,
            } => {
                assert_eq!(to - from, chrono::Duration::days(7));
                assert_eq!(calendar, vec!["Work", "Home"]);
                assert!(exclude_cancelled);
                assert!(!exclude_transparent);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn book_end_conflicts_with_duration() {
        let result = Cli::try_parse_from([
            "ical-booker",
            "book",
            "--calendar",
            "Work",
            "--start",
            "2025-03-10T14:00:00Z",
            "--end",
            "2025-03-10T15:00:00Z",
            "--duration",
            "45",
            "--title",
            "Call",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn book_defaults() {
        let cli = Cli::try_parse_from([
            "ical-booker",
            "--json",
            "book",
            "--calendar",
            "Work",
            "--start",
            "2025-03-10T14:00:00Z",
            "--title",
            "Call",
            "--attendee",
            "guest@example.com",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Book {
                end,
                duration,
                attendee,
                notify,
                ..
            } => {
                assert!(end.is_none());
                assert_eq!(duration, 30);
                assert_eq!(attendee, vec!["guest@example.com"]);
                assert!(!notify);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
