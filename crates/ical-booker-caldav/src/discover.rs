//! Calendar discovery.
//!
//! Three sequential phases: resolve the principal, resolve calendar-home,
//! then list the calendar collections under it. Calendar-home comes from
//! the `calendar-home-set` property when the server reports it; otherwise a
//! fixed list of well-known locations is probed, first success wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use ical_booker_core::{Calendar, Credentials};

use crate::error::{CalDavError, CalDavResult};
use crate::transport::{DavRequest, Depth, Transport};
use crate::xml;

/// A calendar collection href: one hex/hyphen segment and a trailing slash.
static CALENDAR_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[A-Fa-f0-9-]+/$").expect("calendar href pattern is valid"));

/// Numeric account id in principal hrefs such as `/18038309674/principal/`.
static PRINCIPAL_USER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)/principal").expect("principal id pattern is valid"));

/// Where to look for calendar-home when the server does not say.
///
/// Variants are listed in probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeCandidate {
    /// `./calendars/` relative to the principal URL.
    PrincipalRelative,
    /// `/{userId}/calendars/` at the server root.
    UserId,
    /// `/{emailLocalPart}/calendars/` at the server root.
    EmailLocalPart,
}

impl HomeCandidate {
    /// All candidates, in probing order.
    pub const ORDER: [Self; 3] = [Self::PrincipalRelative, Self::UserId, Self::EmailLocalPart];

    /// Builds the candidate URL.
    ///
    /// `user_id` is the numeric id from the principal href, or the e-mail
    /// local part when the href has none.
    pub fn url(self, principal_url: &Url, creds: &Credentials, user_id: &str) -> Option<Url> {
        let joined = match self {
            Self::PrincipalRelative => principal_url.join("./calendars/"),
            Self::UserId => creds.principal.join(&format!("/{}/calendars/", user_id)),
            Self::EmailLocalPart => creds
                .principal
                .join(&format!("/{}/calendars/", creds.email_local_part())),
        };
        match joined {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(candidate = ?self, error = %e, "Cannot build calendar-home candidate");
                None
            }
        }
    }
}

/// Lazily yields the calendar-home candidates in probing order.
pub fn home_candidates<'a>(
    principal_url: &'a Url,
    principal_href: &'a str,
    creds: &'a Credentials,
) -> impl Iterator<Item = Url> + 'a {
    let user_id = principal_user_id(principal_href).unwrap_or_else(|| creds.email_local_part());
    HomeCandidate::ORDER
        .into_iter()
        .filter_map(move |candidate| candidate.url(principal_url, creds, user_id))
}

/// The numeric account id in a principal href, if it has one.
pub fn principal_user_id(principal_href: &str) -> Option<&str> {
    PRINCIPAL_USER_ID
        .captures(principal_href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns true for hrefs that name a calendar collection (not the
/// calendar-home itself, inbox or outbox).
pub fn is_calendar_href(href: &str) -> bool {
    CALENDAR_HREF.is_match(href)
}

/// Discovers the calendar collections of an account.
///
/// # Errors
///
/// - `Discovery` when the principal or calendar-home cannot be found, or
///   the listing is rejected (with the HTTP status)
/// - `Transport` when the principal, home-set or listing request gets no
///   answer at all
pub async fn discover_calendars<T>(transport: &T, creds: &Credentials) -> CalDavResult<Vec<Calendar>>
where
    T: Transport + ?Sized,
{
    let (principal_url, principal_href) = resolve_principal(transport, creds).await?;
    let home_url = resolve_calendar_home(transport, creds, &principal_url, &principal_href).await?;
    list_calendars(transport, creds, &home_url).await
}

async fn resolve_principal<T>(transport: &T, creds: &Credentials) -> CalDavResult<(Url, String)>
where
    T: Transport + ?Sized,
{
    let request = DavRequest::propfind(
        creds.principal.as_str(),
        Depth::Zero,
        xml::current_user_principal_body()?,
    )
    .with_credentials(creds);

    let response = transport.send(request).await?;
    debug!(status = response.status, url = %creds.principal, "current-user-principal lookup");

    let href = xml::extract_property_href(&response.body, "current-user-principal").ok_or_else(|| {
        let err = CalDavError::discovery("principal not found");
        if response.is_success() {
            err
        } else {
            err.with_status(response.status)
        }
    })?;

    let url = creds.principal.join(&href).map_err(|e| {
        CalDavError::discovery(format!("invalid principal href '{}'", href)).with_source(e)
    })?;

    debug!(principal = %url, "Resolved principal");
    Ok((url, href))
}

async fn resolve_calendar_home<T>(
    transport: &T,
    creds: &Credentials,
    principal_url: &Url,
    principal_href: &str,
) -> CalDavResult<Url>
where
    T: Transport + ?Sized,
{
    let request = DavRequest::propfind(
        principal_url.as_str(),
        Depth::Zero,
        xml::calendar_home_set_body()?,
    )
    .with_credentials(creds);

    let response = transport.send(request).await?;
    debug!(status = response.status, "calendar-home-set lookup");

    if let Some(href) = xml::extract_property_href(&response.body, "calendar-home-set") {
        let url = creds.principal.join(&href).map_err(|e| {
            CalDavError::discovery(format!("invalid calendar-home-set href '{}'", href))
                .with_source(e)
        })?;
        debug!(home = %url, "Resolved calendar-home from calendar-home-set");
        return Ok(url);
    }

    probe_calendar_home(transport, creds, principal_url, principal_href).await
}

/// Probes the fallback locations one at a time and stops at the first 2xx.
async fn probe_calendar_home<T>(
    transport: &T,
    creds: &Credentials,
    principal_url: &Url,
    principal_href: &str,
) -> CalDavResult<Url>
where
    T: Transport + ?Sized,
{
    let mut attempted = Vec::new();

    for candidate in home_candidates(principal_url, principal_href, creds) {
        attempted.push(candidate.to_string());

        let request =
            DavRequest::propfind(candidate.as_str(), Depth::One, "").with_credentials(creds);
        match transport.send(request).await {
            Ok(response) if response.is_success() => {
                let home = with_trailing_slash(candidate);
                warn!(home = %home, "calendar-home-set missing, using fallback");
                return Ok(home);
            }
            Ok(response) => {
                debug!(url = %candidate, status = response.status, "Fallback candidate rejected");
            }
            Err(e) => {
                warn!(url = %candidate, error = %e, "Fallback candidate unreachable");
            }
        }
    }

    Err(CalDavError::discovery(format!(
        "calendar-home-set not found on server. Tried: {}",
        attempted.join(", ")
    ))
    .with_attempted_urls(attempted))
}

async fn list_calendars<T>(
    transport: &T,
    creds: &Credentials,
    home_url: &Url,
) -> CalDavResult<Vec<Calendar>>
where
    T: Transport + ?Sized,
{
    let request = DavRequest::propfind(home_url.as_str(), Depth::One, xml::list_collections_body()?)
        .with_credentials(creds);

    let response = transport.send(request).await?;
    debug!(status = response.status, home = %home_url, "Collection listing");

    if !response.is_success() {
        return Err(CalDavError::discovery(format!(
            "failed to list calendars at {}",
            home_url
        ))
        .with_status(response.status));
    }

    let mut seen = HashSet::new();
    let mut calendars = Vec::new();

    for listed in xml::parse_collection_listing(&response.body) {
        let Some(name) = listed
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        if !is_calendar_href(&listed.href) {
            continue;
        }
        let url = match creds.principal.join(&listed.href) {
            Ok(url) => url,
            Err(e) => {
                warn!(href = %listed.href, error = %e, "Skipping unresolvable calendar href");
                continue;
            }
        };
        if seen.insert(url.clone()) {
            calendars.push(Calendar::new(name, url));
        }
    }

    info!(
        count = calendars.len(),
        names = ?calendars.iter().map(|c| c.display_name.as_str()).collect::<Vec<_>>(),
        "Discovered calendars"
    );

    Ok(calendars)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
