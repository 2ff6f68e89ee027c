//! Test doubles shared by the unit tests of this crate.

use bytes::Bytes;
use runpkg_core::{HttpSend, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A request seen by [`MockHttpSend`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    method: http::Method,
    uri: http::Uri,
    headers: http::HeaderMap,
    body: Bytes,
}

impl RecordedRequest {
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    pub fn uri(&self) -> &http::Uri {
        &self.uri
    }

    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Answers requests by uri path and records them. Unknown paths get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    responses: Arc<HashMap<String, (u16, String)>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, path: &str, status: u16, body: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let (status, resp) = self
            .responses
            .get(parts.uri.path())
            .cloned()
            .unwrap_or((404, r#"{"error":{"code":"NotFound"}}"#.to_string()));

        self.requests.lock().unwrap().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });

        Ok(http::Response::builder()
            .status(status)
            .body(Bytes::from(resp))?)
    }
}
