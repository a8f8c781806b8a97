//! Client core for the photo browsing app.
//!
//! # Overview
//! Talks to the Flickr REST API and drives the two screens of the app: a
//! paginated feed of recent or searched photos, and a detail view for one
//! photo. Rendering is left to the host.
//!
//! # Design
//! - `FlickrClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `FlickrApi` composes that with a `Transport` into the blocking
//!   `PhotoApi` contract.
//! - `Feed` and `Detail` are pure state machines; every fetch they ask for is
//!   stamped with a generation, and only the latest generation's result is
//!   applied.
//! - `FeedController` and `DetailController` run those machines on tokio
//!   tasks and publish snapshots over `watch` channels. The C ABI drives the
//!   same machines directly from the host's own I/O.

pub mod api;
pub mod client;
pub mod config;
pub mod controller;
pub mod cursor;
pub mod detail;
pub mod error;
pub mod feed;
pub mod http;
pub mod transport;
pub mod types;

pub use api::{FlickrApi, PhotoApi};
pub use client::FlickrClient;
pub use config::{ClientConfig, Timeouts};
pub use controller::{DetailController, FeedController};
pub use cursor::PagingCursor;
pub use detail::{Detail, DetailArgs, DetailRequest, DetailState, PhotoKey};
pub use error::{ApiError, ConfigError};
pub use feed::{Feed, FeedPhase, FeedState, PageRequest, LOAD_MORE_BUFFER};
pub use http::{HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Owner, Photo, PhotoDetail, PhotoPage, DEFAULT_IMAGE_HOST};
