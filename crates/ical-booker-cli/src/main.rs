//! ical-booker CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use ical_booker_cli::cli::{Cli, Command, ConfigAction};
use ical_booker_cli::commands::book::BookArgs;
use ical_booker_cli::commands::busy::BusyArgs;
use ical_booker_cli::commands::{self, AccountOverrides};
use ical_booker_cli::config::ClientConfig;
use ical_booker_cli::error::{ClientError, ClientResult};
use ical_booker_core::{LogFormat, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = if cli.log_json { LogFormat::Json } else { LogFormat::Text };
    if let Err(e) = init_tracing(TracingConfig::cli(cli.debug).with_format(log_format)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    let overrides = AccountOverrides {
        principal: cli.principal,
        username: cli.username,
        password: cli.password,
    };

    match cli.command {
        Command::Calendars => commands::calendars::run(&config, &overrides, cli.json).await,
        Command::Busy {
            from,
            to,
            calendar,
            exclude_cancelled,
            exclude_transparent,
        } => {
            let args = BusyArgs {
                from,
                to,
                calendars: calendar,
                exclude_cancelled,
                exclude_transparent,
            };
            commands::busy::run(&config, &overrides, &args, cli.json).await
        }
        Command::Book {
            calendar,
            start,
            end,
            duration,
            title,
            attendee,
            description,
            location,
            notify,
        } => {
            let args = BookArgs {
                calendar,
                start,
                end,
                duration_minutes: duration,
                title,
                attendees: attendee,
                description,
                location,
                notify,
            };
            commands::book::run(&config, &overrides, &args, cli.json).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
