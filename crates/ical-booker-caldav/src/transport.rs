//! The transport seam between CalDAV logic and HTTP.
//!
//! Discovery, busy resolution and booking only ever talk to a
//! [`Transport`]. [`HttpTransport`](crate::HttpTransport) is the production
//! implementation; tests plug in scripted transports.
//!
//! A transport reports *every* HTTP answer as a [`DavResponse`], whatever
//! its status. Only failures to get an answer at all (connection refused,
//! TLS, timeout, unreadable body) are errors. The callers decide which
//! statuses are fatal.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use ical_booker_core::Credentials;

use crate::auth::basic_auth;
use crate::error::CalDavResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps [`Transport`] object-safe so it can be passed around as
/// `&dyn Transport`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Content type for WebDAV/CalDAV XML bodies.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
/// Content type for iCalendar bodies.
pub const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// HTTP methods used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    /// WebDAV property query.
    Propfind,
    /// CalDAV calendar-query.
    Report,
    /// Resource upload.
    Put,
}

impl DavMethod {
    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propfind => "PROPFIND",
            Self::Report => "REPORT",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for DavMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the WebDAV `Depth` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    /// The resource itself.
    Zero,
    /// The resource and its direct children.
    One,
}

impl Depth {
    /// The header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }
}

/// A single request handed to a [`Transport`].
#[derive(Clone, PartialEq, Eq)]
pub struct DavRequest {
    /// HTTP method.
    pub method: DavMethod,
    /// Absolute request URL.
    pub url: String,
    /// `Depth` header, if any.
    pub depth: Option<Depth>,
    /// `Content-Type` header, if any.
    pub content_type: Option<&'static str>,
    /// `Authorization` header value, if any.
    pub authorization: Option<String>,
    /// Request body (may be empty).
    pub body: String,
}

impl DavRequest {
    fn new(method: DavMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            depth: None,
            content_type: None,
            authorization: None,
            body: String::new(),
        }
    }

    /// A PROPFIND with an XML body.
    pub fn propfind(url: impl Into<String>, depth: Depth, body: impl Into<String>) -> Self {
        let mut request = Self::new(DavMethod::Propfind, url);
        request.depth = Some(depth);
        request.content_type = Some(XML_CONTENT_TYPE);
        request.body = body.into();
        request
    }

    /// A REPORT with an XML body. CalDAV queries always use Depth 1.
    pub fn report(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(DavMethod::Report, url);
        request.depth = Some(Depth::One);
        request.content_type = Some(XML_CONTENT_TYPE);
        request.body = body.into();
        request
    }

    /// A PUT of an iCalendar resource.
    pub fn put_ics(url: impl Into<String>, ics: impl Into<String>) -> Self {
        let mut request = Self::new(DavMethod::Put, url);
        request.content_type = Some(ICS_CONTENT_TYPE);
        request.body = ics.into();
        request
    }

    /// Adds HTTP Basic authentication for the given account.
    pub fn with_credentials(mut self, creds: &Credentials) -> Self {
        self.authorization = Some(basic_auth(&creds.username, &creds.password));
        self
    }
}

impl fmt::Debug for DavRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DavRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("depth", &self.depth)
            .field("content_type", &self.content_type)
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// The answer to a [`DavRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl DavResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for any 2xx status (including 207 Multi-Status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends WebDAV/CalDAV requests.
///
/// Implementations must be `Send + Sync`: the busy resolver issues
/// requests for several calendars concurrently through one transport.
pub trait Transport: Send + Sync {
    /// Sends a request and returns the server's answer, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error only when no HTTP answer was obtained.
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>> {
        (**self).send(request)
    }
}
