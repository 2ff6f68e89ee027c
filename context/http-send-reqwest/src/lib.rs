//! Reqwest-based HTTP sending for runpkg.
//!
//! `ReqwestHttpSend` implements the `HttpSend` trait from `runpkg_core`, which
//! is how storage data-plane calls and token requests leave the process.
//!
//! ```no_run
//! use runpkg_core::Context;
//! use runpkg_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), reqwest::Error> {
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use runpkg_core::{Error, HttpSend, Result};
use reqwest::{Client, Request};

/// Reqwest-based implementation of the `HttpSend` trait.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        log::debug!("sending {} request to {}", req.method(), req.uri().path());

        let req = Request::try_from(req)
            .map_err(|e| Error::unexpected("failed to convert http request").with_source(e))?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::unexpected("failed to send http request").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::unexpected("failed to read http response body").with_source(e))?;

        log::debug!("received http response with status {}", parts.status);
        Ok(http::Response::from_parts(parts, bs))
    }
}
