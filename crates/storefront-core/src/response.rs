//! Outgoing response envelope.

use std::borrow::Cow;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};

/// Final status, headers and body handed back to the server adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Wrap status, headers and body.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 200 response with no headers.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// HTML document response. `content-type: text/html` is appended to
    /// `headers`, keeping any value already present.
    pub fn html(status: StatusCode, mut headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        headers.append(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        Self::new(status, headers, body)
    }

    /// Resolve an optional component status, defaulting to 200.
    pub fn status_or_default(status: Option<StatusCode>) -> StatusCode {
        status.unwrap_or(StatusCode::OK)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// First value of a header, if it is valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Convert into an `http::Response`.
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl From<http::Response<Vec<u8>>> for ResponseEnvelope {
    fn from(response: http::Response<Vec<u8>>) -> Self {
        let (parts, body) = response.into_parts();
        Self::new(parts.status, parts.headers, body)
    }
}
