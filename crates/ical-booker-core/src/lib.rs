//! Core types: credentials, calendars, busy intervals, time windows, tracing

pub mod calendar;
pub mod credentials;
pub mod event;
pub mod time;
pub mod tracing;

pub use calendar::Calendar;
pub use credentials::Credentials;
pub use event::{Booking, BusyEvent, NewEvent, DEFAULT_TITLE};
pub use time::{format_caldav_timestamp, format_iso_millis, InvalidTimeWindow, TimeWindow};
pub use tracing::{init_tracing, LogFormat, TracingConfig, TracingError};
