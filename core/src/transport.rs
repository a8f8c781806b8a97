//! Blocking HTTP execution of `HttpRequest` values.
//!
//! `Transport` is the seam between the pure request/response types and the
//! network. `UreqTransport` is the production implementation; tests swap in
//! canned transports.

use ureq::Agent;

use crate::config::Timeouts;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Execute one request. Non-2xx statuses are returned as data; only a
    /// failure to get a response at all is an `Err`.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `ureq` agent with bounded connect/read/write timeouts and no retries.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeouts: &Timeouts) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(timeouts.connect()))
            .timeout_send_request(Some(timeouts.write()))
            .timeout_send_body(Some(timeouts.write()))
            .timeout_recv_response(Some(timeouts.read()))
            .timeout_recv_body(Some(timeouts.read()))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&Timeouts::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.agent.get(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: ureq::Error) -> ApiError {
    ApiError::Transport {
        status: None,
        message: err.to_string(),
    }
}
