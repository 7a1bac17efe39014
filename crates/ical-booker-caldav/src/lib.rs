//! CalDAV client: calendar discovery, busy intervals and booking.
//!
//! - [`discover_calendars`] - principal, calendar-home (with fallbacks),
//!   calendar collections
//! - [`get_busy_events`] - busy intervals across calendars, recurrences
//!   expanded
//! - [`create_booking`] - PUT a new event
//! - [`send_booking_emails`] - EmailJS confirmations for a booking
//!
//! # Architecture
//!
//! ```text
//!   discover_calendars      get_busy_events        create_booking
//!          │                       │                      │
//!          │ PROPFIND              │ REPORT (concurrent)  │ PUT
//!          ▼                       ▼                      ▼
//!  ┌─────────────────────────────────────────────────────────────┐
//!  │                    Transport (trait)                        │
//!  │   HttpTransport (reqwest)   |   any in-memory transport     │
//!  └─────────────────────────────────────────────────────────────┘
//!          │                       │
//!          ▼ xml                   ▼ xml → ics → recurrence
//!     Vec<Calendar>          Vec<BusyEvent> (sorted)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ical_booker_caldav::{HttpConfig, HttpTransport, discover_calendars, get_busy_events};
//! use ical_booker_core::{Credentials, TimeWindow};
//!
//! let transport = HttpTransport::new(&HttpConfig::default())?;
//! let creds = Credentials::parse("https://p55-caldav.icloud.com", "me@icloud.com", app_password)?;
//! let calendars = discover_calendars(&transport, &creds).await?;
//! let busy = get_busy_events(&transport, &creds, &calendars, &window).await?;
//! ```

pub mod auth;
pub mod book;
pub mod busy;
pub mod config;
pub mod discover;
pub mod error;
pub mod http;
pub mod ics;
pub mod notify;
pub mod recurrence;
pub mod transport;
pub mod xml;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types at crate root
pub use book::create_booking;
pub use busy::{BusyOptions, get_busy_events, get_busy_events_with};
pub use config::HttpConfig;
pub use discover::{HomeCandidate, discover_calendars};
pub use error::{CalDavError, CalDavErrorCode, CalDavResult};
pub use http::HttpTransport;
pub use notify::{EmailConfig, send_booking_emails};
pub use transport::{BoxFuture, DavMethod, DavRequest, DavResponse, Depth, Transport};
