//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `FlickrClient` builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; whoever executes the round-trip (a `Transport`, a test, or a
//! mobile host through the C ABI) sits in between.
//!
//! Every call the photo service accepts is a `GET` with all parameters in the
//! query string, so a request is just a URL plus headers.

/// An HTTP `GET` request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Canonical reason phrase for the status, e.g. "Not Found".
    pub fn status_text(&self) -> String {
        ureq::http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}
