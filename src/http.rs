//! Transport seam for sending signed requests.

use crate::constants::REQUEST_TIMEOUT;
use crate::error::Error;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::Client;
use std::fmt::Debug;
use std::io;

/// HttpSend is the trait the client uses to perform the transport call.
///
/// Implementations must classify transport-level failures into
/// [`ErrorKind::Transport`](crate::ErrorKind::Transport) errors so the
/// polling loop can tell transient faults from everything else.
#[async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send the request and collect the full response body.
    async fn http_send(&self, req: http::Request<Bytes>) -> crate::Result<http::Response<Bytes>>;
}

/// Default transport backed by reqwest, with the hard per-request
/// timeout applied at the client level.
#[derive(Debug)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    ///
    /// The caller is responsible for configuring a request timeout on
    /// the client; [`ReqwestHttpSend::default`] applies the standard one.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHttpSend {
    fn default() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            // Fails only when no TLS backend can be initialized, the same
            // condition under which reqwest::Client::new() panics.
            .expect("reqwest client must build");
        Self::new(client)
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> crate::Result<http::Response<Bytes>> {
        let host = req.uri().host().unwrap_or_default().to_string();

        let req = reqwest::Request::try_from(req).map_err(|e| {
            Error::request_invalid(format!("failed to build outgoing request: {e}")).with_source(e)
        })?;
        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|e| classify_transport(e, &host))?;

        let resp: http::Response<reqwest::Body> = resp.into();
        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::transport(format!("failed to read response body from {host}: {e}"))
                    .with_source(e)
            })?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

/// Map a reqwest failure onto the transport taxonomy: timeout, connection
/// refused, name resolution failure or generic network fault.
///
/// The distinction only shapes the diagnostic message; every transport
/// fault carries the same retryable kind.
fn classify_transport(err: reqwest::Error, host: &str) -> Error {
    let message = if err.is_timeout() {
        format!(
            "request to {host} timed out after {}s",
            REQUEST_TIMEOUT.as_secs()
        )
    } else if io_error_kind(&err) == Some(io::ErrorKind::ConnectionRefused) {
        format!("connection refused by {host}")
    } else if is_dns_failure(&err) {
        format!("failed to resolve host {host}")
    } else if err.is_connect() {
        format!("failed to connect to {host}: {err}")
    } else {
        format!("network error talking to {host}: {err}")
    };

    Error::transport(message).with_source(err)
}

fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = e.source();
    }
    None
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    // hyper-util reports resolver failures as a connect error wrapping a
    // "dns error" cause; there is no structured kind to match on.
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if e.to_string().contains("dns error") {
            return true;
        }
        source = e.source();
    }
    false
}
