//! Booking creation: PUT a generated `.ics` resource into a calendar.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::{debug, info};
use url::Url;

use ical_booker_core::{Booking, Credentials, NewEvent};

use crate::error::{CalDavError, CalDavResult};
use crate::ics::generate_ics;
use crate::transport::{DavRequest, Transport};

/// Creates `event` in the calendar at `calendar_url`.
///
/// The resource is named `{uid}.ics`, where the uid is the current Unix
/// time in milliseconds followed by a random base-36 suffix.
///
/// # Errors
///
/// - `InvalidInput` if the event does not end after it starts
/// - `Booking` (with the HTTP status) if the server rejects the PUT
/// - `Transport` if the server cannot be reached
pub async fn create_booking<T>(
    transport: &T,
    creds: &Credentials,
    calendar_url: &Url,
    event: &NewEvent,
) -> CalDavResult<Booking>
where
    T: Transport + ?Sized,
{
    put_event(transport, creds, calendar_url, event, new_uid()).await
}

pub(crate) async fn put_event<T>(
    transport: &T,
    creds: &Credentials,
    calendar_url: &Url,
    event: &NewEvent,
    uid: String,
) -> CalDavResult<Booking>
where
    T: Transport + ?Sized,
{
    if event.end <= event.start {
        return Err(CalDavError::invalid_input(format!(
            "event must end after it starts ({} >= {})",
            event.start, event.end
        )));
    }

    let url = resource_url(calendar_url, &uid)?;
    let ics = generate_ics(&uid, event);
    debug!(url = %url, bytes = ics.len(), "Uploading booking");

    let request = DavRequest::put_ics(url.as_str(), ics).with_credentials(creds);
    let response = transport.send(request).await?;

    if !response.is_success() {
        return Err(
            CalDavError::booking(format!("PUT {} was rejected", url)).with_status(response.status)
        );
    }

    info!(uid = %uid, url = %url, "Booking created");
    Ok(Booking { uid, url })
}

/// `calendar_url` with exactly one trailing slash, then `{uid}.ics`.
pub fn resource_url(calendar_url: &Url, uid: &str) -> CalDavResult<Url> {
    let mut base = calendar_url.clone();
    let path = format!("{}/", base.path().trim_end_matches('/'));
    base.set_path(&path);

    base.join(&format!("{}.ics", uid)).map_err(|e| {
        CalDavError::invalid_input(format!("cannot build resource URL for uid '{}'", uid))
            .with_source(e)
    })
}

/// A fresh event uid: `{unix_millis}-{random base36}`.
pub fn new_uid() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u64 = rand::rng().random();
    format!("{}-{}", millis, to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
