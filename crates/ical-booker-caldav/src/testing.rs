//! Scripted in-memory transport for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use crate::error::{CalDavError, CalDavResult};
use crate::transport::{BoxFuture, DavMethod, DavRequest, DavResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Respond(u16, String),
    Unreachable,
}

#[derive(Debug)]
struct Route {
    method: DavMethod,
    url: String,
    body_contains: Option<&'static str>,
    reply: Reply,
    delay: Option<Duration>,
}

impl Route {
    fn matches(&self, request: &DavRequest) -> bool {
        self.method == request.method
            && self.url == request.url
            && self
                .body_contains
                .is_none_or(|marker| request.body.contains(marker))
    }
}

/// Answers requests from a fixed script and records every request.
///
/// Routes are matched in insertion order; unmatched requests get a 404.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<DavRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, method: DavMethod, url: &str, status: u16, body: &str) -> Self {
        self.push(method, url, None, Reply::Respond(status, body.to_string()))
    }

    /// Like [`on`](Self::on), but only for requests whose body contains `marker`.
    pub(crate) fn on_body(
        self,
        method: DavMethod,
        url: &str,
        marker: &'static str,
        status: u16,
        body: &str,
    ) -> Self {
        self.push(
            method,
            url,
            Some(marker),
            Reply::Respond(status, body.to_string()),
        )
    }

    pub(crate) fn unreachable(self, method: DavMethod, url: &str) -> Self {
        self.push(method, url, None, Reply::Unreachable)
    }

    /// Delays the answer of the most recently added route.
    pub(crate) fn delayed(mut self, millis: u64) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.delay = Some(Duration::from_millis(millis));
        }
        self
    }

    fn push(
        mut self,
        method: DavMethod,
        url: &str,
        body_contains: Option<&'static str>,
        reply: Reply,
    ) -> Self {
        self.routes.push(Route {
            method,
            url: url.to_string(),
            body_contains,
            reply,
            delay: None,
        });
        self
    }

    pub(crate) fn requests(&self) -> Vec<DavRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requested_urls(&self, method: DavMethod) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.url)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>> {
        let scripted = self
            .routes
            .iter()
            .find(|route| route.matches(&request))
            .map(|route| (route.reply.clone(), route.delay));
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        Box::pin(async move {
            let Some((reply, delay)) = scripted else {
                return Ok(DavResponse::new(404, ""));
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match reply {
                Reply::Respond(status, body) => Ok(DavResponse::new(status, body)),
                Reply::Unreachable => Err(CalDavError::transport(format!(
                    "connection refused: {}",
                    url
                ))),
            }
        })
    }
}
