//! `reqwest`-backed [`Transport`].

use reqwest::{Client, Method};
use tracing::{debug, trace};

use crate::config::HttpConfig;
use crate::error::{CalDavError, CalDavResult};
use crate::transport::{BoxFuture, DavRequest, DavResponse, Transport};

/// HTTP transport for CalDAV operations.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: &HttpConfig) -> CalDavResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                CalDavError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client })
    }

    /// Wraps an already-configured `reqwest` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying HTTP client, for non-DAV calls such as notifications.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn execute(&self, request: DavRequest) -> CalDavResult<DavResponse> {
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            CalDavError::configuration(format!("invalid HTTP method {}", request.method))
                .with_source(e)
        })?;

        let mut builder = self.client.request(method, &request.url);

        if let Some(depth) = request.depth {
            builder = builder.header("Depth", depth.as_str());
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header("Content-Type", content_type);
        }
        if let Some(ref authorization) = request.authorization {
            builder = builder.header("Authorization", authorization);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        trace!(method = %request.method, url = %request.url, "Sending request");

        let response = builder.send().await.map_err(|e| {
            CalDavError::transport(format!("{} {} failed: {}", request.method, request.url, e))
                .with_source(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            CalDavError::transport(format!("failed to read response from {}: {}", request.url, e))
                .with_source(e)
        })?;

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            body_len = body.len(),
            "Received response"
        );

        Ok(DavResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: DavRequest) -> BoxFuture<'_, CalDavResult<DavResponse>> {
        Box::pin(self.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transport_creation() {
        let config = HttpConfig::new().with_timeout(Duration::from_secs(10));
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn wrapped_client_keeps_its_defaults() {
        use reqwest::header::{HeaderMap, HeaderValue};
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use crate::transport::Depth;

        let server = MockServer::start().await;
        Mock::given(method("PROPFIND"))
            .and(path("/cal/"))
            .and(header("Depth", "1"))
            .and(header("X-Tenant", "acme"))
            .respond_with(ResponseTemplate::new(207).set_body_string("<multistatus/>"))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("X-Tenant", HeaderValue::from_static("acme"));
        let client = Client::builder().default_headers(headers).build().unwrap();
        let transport = HttpTransport::from_client(client);

        let response = transport
            .send(DavRequest::propfind(
                format!("{}/cal/", server.uri()),
                Depth::One,
                "<propfind/>",
            ))
            .await
            .unwrap();
        assert_eq!(response, DavResponse::new(207, "<multistatus/>"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let transport = HttpTransport::new(&HttpConfig::new()).unwrap();
        let err = transport
            .send(DavRequest::propfind("http://127.0.0.1:1/", crate::transport::Depth::Zero, ""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::CalDavErrorCode::Transport);
    }
}
