//! The photo API contract the controllers depend on.
//!
//! # Design
//! `PhotoApi` is what a controller sees: three blocking calls that return a
//! domain value or an `ApiError`. `FlickrApi` implements it by building a
//! request with `FlickrClient`, executing it on a `Transport`, and parsing
//! the response. Every call is a single attempt.

use tracing::{debug, warn};

use crate::client::FlickrClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{PhotoDetail, PhotoPage};

pub trait PhotoApi: Send + Sync {
    fn fetch_recent(&self, page: u32) -> Result<PhotoPage, ApiError>;

    fn search(&self, text: &str, page: u32) -> Result<PhotoPage, ApiError>;

    fn fetch_detail(&self, id: &str, secret: &str) -> Result<PhotoDetail, ApiError>;
}

pub struct FlickrApi<T = UreqTransport> {
    client: FlickrClient,
    transport: T,
}

impl FlickrApi<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            FlickrClient::new(&config.base_url, &config.api_key),
            UreqTransport::new(&config.timeouts),
        ))
    }
}

impl<T: Transport> FlickrApi<T> {
    pub fn new(client: FlickrClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &FlickrClient {
        &self.client
    }

    fn send<R>(
        &self,
        op: &'static str,
        request: HttpRequest,
        parse: impl FnOnce(&FlickrClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        debug!(op, url = %request.url, "sending request");
        let result = self
            .transport
            .execute(&request)
            .and_then(|response| parse(&self.client, response));
        if let Err(err) = &result {
            warn!(op, error = %err, "photo service call failed");
        }
        result
    }
}

impl<T: Transport> PhotoApi for FlickrApi<T> {
    fn fetch_recent(&self, page: u32) -> Result<PhotoPage, ApiError> {
        self.send("recent", self.client.build_recent(page), FlickrClient::parse_page)
    }

    fn search(&self, text: &str, page: u32) -> Result<PhotoPage, ApiError> {
        self.send("search", self.client.build_search(text, page), FlickrClient::parse_page)
    }

    fn fetch_detail(&self, id: &str, secret: &str) -> Result<PhotoDetail, ApiError> {
        self.send("detail", self.client.build_detail(id, secret), FlickrClient::parse_detail)
    }
}
