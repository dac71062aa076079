//! Shared HTTP plumbing for adapters.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::VendorError;

/// Default connection timeout. Per-request timeouts come from the config.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Map a transport error to its kind. URLs and bodies are never kept.
pub fn map_send_error(e: reqwest::Error) -> VendorError {
    if e.is_timeout() {
        VendorError::Timeout
    } else if e.is_connect() {
        VendorError::Connect(io_kind(&e).unwrap_or("connect"))
    } else if e.is_body() {
        VendorError::Request("body")
    } else if e.is_decode() {
        VendorError::Request("decode")
    } else if e.is_redirect() {
        VendorError::Request("redirect")
    } else if e.is_builder() {
        VendorError::Request("builder")
    } else {
        VendorError::Request("request")
    }
}

/// The I/O error kind at the bottom of a connect failure, if any.
fn io_kind(e: &reqwest::Error) -> Option<&'static str> {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(match io.kind() {
                std::io::ErrorKind::ConnectionRefused => "connection_refused",
                std::io::ErrorKind::ConnectionReset => "connection_reset",
                std::io::ErrorKind::ConnectionAborted => "connection_aborted",
                std::io::ErrorKind::AddrNotAvailable => "addr_not_available",
                std::io::ErrorKind::PermissionDenied => "permission_denied",
                _ => "io",
            });
        }
        source = err.source();
    }
    None
}

/// Send `request`, require a 2xx status, and decode the JSON body.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, VendorError> {
    let response = request.send().await.map_err(map_send_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(VendorError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(map_send_error)?;
    serde_json::from_slice(&body).map_err(|e| VendorError::from_json(&e))
}
