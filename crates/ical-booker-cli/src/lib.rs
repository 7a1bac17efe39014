//! Command-line client: calendar listing, busy intervals, bookings
//!
//! This crate provides the `ical-booker` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
