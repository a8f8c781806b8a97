//! C-ABI wrapper around `flickr-core`.
//!
//! # Overview
//! Exposes request building, response parsing and the feed state machine
//! through `extern "C"` functions, so a host with its own HTTP stack can use
//! the core without linking to tokio or a Rust HTTP client.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `flickr_build_*` / `flickr_parse_*` mirror `FlickrClient` 1:1 and
//!   return an `FfiResult` envelope tagged with `FfiDataTag`.
//! - The feed handle returns an `FfiFeedFetch` for every page it wants. The
//!   host executes it and hands the response back with the fetch's
//!   generation; responses for superseded generations are dropped.
//! - The caller owns all returned pointers and must call the matching
//!   `flickr_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use flickr_core::{
    ApiError, FlickrClient, HttpResponse, PageRequest, DEFAULT_IMAGE_HOST, LOAD_MORE_BUFFER,
};

use types::*;

/// Borrow a C string, treating invalid UTF-8 as empty.
fn read_str<'a>(s: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(s) }.to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the service at `base_url`, authenticated by
/// `api_key`.
///
/// Returns null if either argument is null or if an internal panic occurs.
/// The caller must free the returned pointer with `flickr_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_client_new(
    base_url: *const c_char,
    api_key: *const c_char,
) -> *mut FfiFlickrClient {
    catch_unwind(|| {
        if base_url.is_null() || api_key.is_null() {
            return std::ptr::null_mut();
        }
        let client = FlickrClient::new(read_str(base_url), read_str(api_key));
        Box::into_raw(Box::new(FfiFlickrClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `flickr_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_client_free(client: *mut FfiFlickrClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for one page of recent photos.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `flickr_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_build_recent(
    client: *const FfiFlickrClient,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_recent(page))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request for one page of a full-text search.
///
/// Returns null if `client` or `text` is null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_build_search(
    client: *const FfiFlickrClient,
    text: *const c_char,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || text.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_search(read_str(text), page))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request for one photo's detail.
///
/// Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_build_detail(
    client: *const FfiFlickrClient,
    id: *const c_char,
    secret: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || id.is_null() || secret.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let req = client.inner.build_detail(read_str(id), read_str(secret));
        FfiHttpRequest::from_core(req)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        read_str(resp.body).to_string()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Parse the response to a recent or search request.
///
/// Returns a result with `data_tag = PhotoPage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_parse_page(
    client: *const FfiFlickrClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match client.inner.parse_page(resp) {
            Ok(page) => FfiResult::ok_page(page),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in flickr_parse_page"))
}

/// Parse the response to a detail request.
///
/// Returns a result with `data_tag = PhotoDetail` on success.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_parse_detail(
    client: *const FfiFlickrClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match client.inner.parse_detail(resp) {
            Ok(detail) => FfiResult::ok_detail(detail),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in flickr_parse_detail"))
}

/// Render the image URL of a photo. A null `host` means the default image
/// host.
///
/// Returns null if `server`, `id` or `secret` is null.
/// The caller must free the returned string with `flickr_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_photo_url(
    host: *const c_char,
    server: *const c_char,
    id: *const c_char,
    secret: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if server.is_null() || id.is_null() || secret.is_null() {
            return std::ptr::null_mut();
        }
        let host = if host.is_null() {
            DEFAULT_IMAGE_HOST
        } else {
            read_str(host)
        };
        let url =
            flickr_core::types::image_url(host, read_str(server), read_str(id), read_str(secret));
        c_string(url)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Create an empty feed of recent photos. Call `flickr_feed_load` to start.
/// The caller must free the returned pointer with `flickr_feed_free`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_new() -> *mut FfiFeed {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiFeed {
            inner: flickr_core::Feed::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a feed created by `flickr_feed_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_free(feed: *mut FfiFeed) {
    if !feed.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(feed) });
        }));
    }
}

fn to_fetch(client: &FlickrClient, request: Option<PageRequest>) -> *mut FfiFeedFetch {
    let Some(request) = request else {
        return std::ptr::null_mut();
    };
    let http = if request.is_search() {
        client.build_search(&request.query, request.page)
    } else {
        client.build_recent(request.page)
    };
    Box::into_raw(Box::new(FfiFeedFetch {
        generation: request.generation,
        request: FfiHttpRequest::from_core(http),
    }))
}

/// Run `op` against the feed and turn the page it asks for into a fetch.
fn feed_trigger(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
    op: impl FnOnce(&mut flickr_core::Feed) -> Option<PageRequest>,
) -> *mut FfiFeedFetch {
    catch_unwind(AssertUnwindSafe(|| {
        if feed.is_null() || client.is_null() {
            return std::ptr::null_mut();
        }
        let feed = unsafe { &mut *feed };
        let client = unsafe { &*client };
        to_fetch(&client.inner, op(&mut feed.inner))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Start loading the first page.
///
/// Returns null when there is nothing to fetch or an argument is null.
/// The caller must free the returned pointer with `flickr_free_fetch`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_load(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
) -> *mut FfiFeedFetch {
    feed_trigger(feed, client, |f| f.load())
}

/// Switch the feed to `text` (empty for recent photos). Re-submitting the
/// current query returns null unless `is_refresh` is set.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_submit_query(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
    text: *const c_char,
    is_refresh: bool,
) -> *mut FfiFeedFetch {
    if text.is_null() {
        return std::ptr::null_mut();
    }
    let text = read_str(text).to_string();
    feed_trigger(feed, client, |f| f.submit_query(&text, is_refresh))
}

/// Reload the current query from the first page.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_refresh(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
) -> *mut FfiFeedFetch {
    feed_trigger(feed, client, |f| f.refresh())
}

/// Ask for the next page. Returns null while a page is in flight or after
/// the last page.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_request_next_page(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
) -> *mut FfiFeedFetch {
    feed_trigger(feed, client, |f| f.request_next_page())
}

/// Hand the response to fetch `generation` back to the feed.
///
/// Returns `true` when the feed state changed, `false` when the result was
/// superseded or an argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_apply(
    feed: *mut FfiFeed,
    client: *const FfiFlickrClient,
    generation: u64,
    response: *const FfiHttpResponse,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if feed.is_null() || client.is_null() || response.is_null() {
            return false;
        }
        let feed = unsafe { &mut *feed };
        let client = unsafe { &*client };
        let result = client
            .inner
            .parse_page(ffi_response_to_core(unsafe { &*response }));
        feed.inner.apply(generation, result)
    }))
    .unwrap_or(false)
}

/// Report that fetch `generation` failed before any response arrived
/// (connection refused, timeout). `message` is what the feed will show.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_fail(
    feed: *mut FfiFeed,
    generation: u64,
    message: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if feed.is_null() || message.is_null() {
            return false;
        }
        let feed = unsafe { &mut *feed };
        let err = ApiError::Transport {
            status: None,
            message: read_str(message).to_string(),
        };
        feed.inner.apply(generation, Err(err))
    }))
    .unwrap_or(false)
}

/// Whether the host should request the next page now that the item at
/// `last_visible_index` is on screen.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_should_load_more(
    feed: *const FfiFeed,
    last_visible_index: u32,
) -> bool {
    catch_unwind(|| {
        if feed.is_null() {
            return false;
        }
        let feed = unsafe { &*feed };
        feed.inner
            .state()
            .should_load_more(last_visible_index as usize, LOAD_MORE_BUFFER)
    })
    .unwrap_or(false)
}

/// Copy the current feed state.
///
/// Returns null if `feed` is null.
/// The caller must free the returned pointer with `flickr_free_snapshot`.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_feed_snapshot(feed: *const FfiFeed) -> *mut FfiFeedSnapshot {
    catch_unwind(|| {
        if feed.is_null() {
            return std::ptr::null_mut();
        }
        let feed = unsafe { &*feed };
        Box::into_raw(Box::new(FfiFeedSnapshot::from(feed.inner.state())))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `flickr_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_free_request(req: *mut FfiHttpRequest) {
    if !req.is_null() {
        let _ = catch_unwind(|| FfiHttpRequest::free(req));
    }
}

/// Free a fetch returned by any `flickr_feed_*` trigger, including its
/// request. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_free_fetch(fetch: *mut FfiFeedFetch) {
    if !fetch.is_null() {
        let _ = catch_unwind(|| FfiFeedFetch::free(fetch));
    }
}

/// Free a result returned by any `flickr_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_free_result(result: *mut FfiResult) {
    if !result.is_null() {
        let _ = catch_unwind(|| FfiResult::free(result));
    }
}

/// Free a snapshot returned by `flickr_feed_snapshot`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_free_snapshot(snapshot: *mut FfiFeedSnapshot) {
    if !snapshot.is_null() {
        let _ = catch_unwind(|| FfiFeedSnapshot::free(snapshot));
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn flickr_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
