//! HTTP-style output sinks.
//!
//! [`Engine::render`](crate::Engine::render) writes to anything that can
//! expose response headers, accept a status line and take body bytes.
//! Framework adapters implement [`ResponseSink`] over their own response
//! types, or render into a [`BufferedResponse`] and convert it afterwards.

use std::io;

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;

/// Content type set on HTML responses that do not already carry one.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A response being written: headers, then status, then body.
pub trait ResponseSink: io::Write {
    /// Headers not yet sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line. Headers are final after this call.
    fn write_status(&mut self, status: StatusCode) -> io::Result<()>;
}

/// Sets the HTML content type unless the caller already chose one.
pub fn ensure_html_content_type(headers: &mut HeaderMap) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    }
}

/// Lets a `&mut dyn ResponseSink` be passed where a sink is taken by value.
impl<R: ResponseSink + ?Sized> ResponseSink for &mut R {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) -> io::Result<()> {
        (**self).write_status(status)
    }
}

/// An in-memory response.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// The written status, or `200 OK` if none was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status(), self.headers, self.body)
    }
}

impl io::Write for BufferedResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseSink for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) -> io::Result<()> {
        if self.status.is_some() {
            return Err(io::Error::other("status already written"));
        }
        self.status = Some(status);
        Ok(())
    }
}
