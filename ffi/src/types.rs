//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! for strings, pointer + length for lists, and plain integers where the
//! core uses `Option` (0 means absent). Every struct handed out is owned by
//! the caller and released with the matching `flickr_free_*` function.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use flickr_core::{ApiError, Feed, FeedState, FlickrClient, Owner, Photo, PhotoDetail, PhotoPage};

/// Opaque handle to a `FlickrClient`.
pub struct FfiFlickrClient {
    pub(crate) inner: FlickrClient,
}

/// Opaque handle to a feed state machine. The host performs every fetch it
/// asks for and feeds the outcome back in.
pub struct FfiFeed {
    pub(crate) inner: Feed,
}

/// Copy `s` into a freshly allocated C string, dropping interior NULs.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let owned = CString::new(s).unwrap_or_else(|err| {
        let mut bytes = err.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    owned.into_raw()
}

/// Null for `None`.
pub(crate) fn c_string_or_null(s: Option<&str>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), |s| c_string(s))
}

/// Release a string produced by `c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak `items` as a pointer + length pair; null when empty.
fn into_raw_parts<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let boxed = items.into_boxed_slice();
    (Box::into_raw(boxed) as *mut T, len)
}

/// Reclaim a list leaked by `into_raw_parts`.
fn from_raw_parts<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A `GET` request for the host to execute.
///
/// Built by the `flickr_build_*` functions. The host sends it and passes
/// the response back through `flickr_parse_*` or `flickr_feed_apply`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: flickr_core::HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_parts(headers);
        Box::into_raw(Box::new(FfiHttpRequest {
            url: c_string(req.url),
            headers,
            headers_len,
        }))
    }

    pub(crate) fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        for h in from_raw_parts(req.headers, req.headers_len) {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    }
}

/// A response the host received, borrowed for the duration of one call.
/// The FFI layer reads but never frees these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct FfiPhoto {
    pub id: *mut c_char,
    pub owner: *mut c_char,
    pub secret: *mut c_char,
    pub server: *mut c_char,
    pub title: *mut c_char,
}

impl From<Photo> for FfiPhoto {
    fn from(p: Photo) -> Self {
        FfiPhoto {
            id: c_string(p.id),
            owner: c_string(p.owner),
            secret: c_string(p.secret),
            server: c_string(p.server),
            title: c_string(p.title),
        }
    }
}

impl FfiPhoto {
    fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.owner);
        free_c_string(self.secret);
        free_c_string(self.server);
        free_c_string(self.title);
    }
}

fn photo_list(photos: Vec<Photo>) -> (*mut FfiPhoto, u32) {
    into_raw_parts(photos.into_iter().map(FfiPhoto::from).collect())
}

fn free_photo_list(items: *mut FfiPhoto, len: u32) {
    for photo in from_raw_parts(items, len) {
        photo.free_fields();
    }
}

#[repr(C)]
pub struct FfiPhotoPage {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u32,
    pub items: *mut FfiPhoto,
    pub len: u32,
}

impl From<PhotoPage> for FfiPhotoPage {
    fn from(page: PhotoPage) -> Self {
        let (items, len) = photo_list(page.photos);
        FfiPhotoPage {
            page: page.page,
            pages: page.pages,
            per_page: page.per_page,
            total: page.total,
            items,
            len,
        }
    }
}

/// `real_name` and `location` are null when the service left them empty.
#[repr(C)]
pub struct FfiOwner {
    pub nsid: *mut c_char,
    pub username: *mut c_char,
    pub real_name: *mut c_char,
    pub location: *mut c_char,
    pub buddy_icon_url: *mut c_char,
}

impl From<Owner> for FfiOwner {
    fn from(owner: Owner) -> Self {
        let location = (!owner.location.is_empty()).then_some(owner.location.as_str());
        FfiOwner {
            real_name: c_string_or_null(owner.display_real_name()),
            location: c_string_or_null(location),
            buddy_icon_url: c_string(owner.buddy_icon_url()),
            nsid: c_string(owner.id),
            username: c_string(owner.username),
        }
    }
}

impl FfiOwner {
    fn free_fields(&self) {
        free_c_string(self.nsid);
        free_c_string(self.username);
        free_c_string(self.real_name);
        free_c_string(self.location);
        free_c_string(self.buddy_icon_url);
    }
}

#[repr(C)]
pub struct FfiPhotoDetail {
    pub id: *mut c_char,
    pub secret: *mut c_char,
    pub server: *mut c_char,
    pub owner: FfiOwner,
    pub title: *mut c_char,
    pub description: *mut c_char,
    pub views: u32,
    pub comments: u32,
}

impl From<PhotoDetail> for FfiPhotoDetail {
    fn from(d: PhotoDetail) -> Self {
        FfiPhotoDetail {
            id: c_string(d.id),
            secret: c_string(d.secret),
            server: c_string(d.server),
            owner: d.owner.into(),
            title: c_string(d.title),
            description: c_string(d.description),
            views: d.views,
            comments: d.comments,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Application = 2,
    Decode = 3,
    Panic = 4,
    NullArg = 5,
}

/// Tells `flickr_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    PhotoPage = 1,
    PhotoDetail = 2,
}

/// Result envelope for the parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to the payload named by `data_tag`. On failure `data` is null,
/// `http_status` is set for non-2xx transport failures and `service_code`
/// for application failures; both are 0 otherwise.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub service_code: i64,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            service_code: 0,
            data_tag,
            data,
        }))
    }

    fn failed(
        error_code: FfiErrorCode,
        message: String,
        http_status: u16,
        service_code: i64,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(message),
            http_status,
            service_code,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_page(page: PhotoPage) -> *mut Self {
        let page = Box::new(FfiPhotoPage::from(page));
        Self::ok(FfiDataTag::PhotoPage, Box::into_raw(page) as *mut c_void)
    }

    pub(crate) fn ok_detail(detail: PhotoDetail) -> *mut Self {
        let detail = Box::new(FfiPhotoDetail::from(detail));
        Self::ok(FfiDataTag::PhotoDetail, Box::into_raw(detail) as *mut c_void)
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let message = err.message();
        let (code, http_status, service_code) = match err {
            ApiError::Transport { status, .. } => (FfiErrorCode::Transport, status.unwrap_or(0), 0),
            ApiError::Application { code, .. } => (FfiErrorCode::Application, 0, code.unwrap_or(0)),
            ApiError::Decode(_) => (FfiErrorCode::Decode, 0, 0),
        };
        Self::failed(code, message, http_status, service_code)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failed(FfiErrorCode::NullArg, format!("null argument: {name}"), 0, 0)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failed(FfiErrorCode::Panic, msg.to_string(), 0, 0)
    }

    pub(crate) fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::PhotoPage => {
                let page = unsafe { Box::from_raw(result.data as *mut FfiPhotoPage) };
                free_photo_list(page.items, page.len);
            }
            FfiDataTag::PhotoDetail => {
                let d = unsafe { Box::from_raw(result.data as *mut FfiPhotoDetail) };
                free_c_string(d.id);
                free_c_string(d.secret);
                free_c_string(d.server);
                d.owner.free_fields();
                free_c_string(d.title);
                free_c_string(d.description);
            }
            FfiDataTag::None => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Feed types
// ---------------------------------------------------------------------------

/// A page fetch the feed wants performed. Pass `generation` back to
/// `flickr_feed_apply` together with the response to `request`.
#[repr(C)]
pub struct FfiFeedFetch {
    pub generation: u64,
    pub request: *mut FfiHttpRequest,
}

impl FfiFeedFetch {
    pub(crate) fn free(fetch: *mut Self) {
        let fetch = unsafe { Box::from_raw(fetch) };
        if !fetch.request.is_null() {
            FfiHttpRequest::free(fetch.request);
        }
    }
}

/// Copy of the feed state for rendering. `error_message` is null when
/// there is no error; `next_page` is 0 on the last page.
#[repr(C)]
pub struct FfiFeedSnapshot {
    pub query: *mut c_char,
    pub photos: *mut FfiPhoto,
    pub len: u32,
    pub is_loading: bool,
    pub error_message: *mut c_char,
    pub current_page: u32,
    pub next_page: u32,
    pub support_load_more: bool,
}

impl From<&FeedState> for FfiFeedSnapshot {
    fn from(state: &FeedState) -> Self {
        let (photos, len) = photo_list(state.photos.clone());
        FfiFeedSnapshot {
            query: c_string(state.query.as_str()),
            photos,
            len,
            is_loading: state.is_loading,
            error_message: c_string_or_null(state.error_message.as_deref()),
            current_page: state.cursor.current_page,
            next_page: state.cursor.next_page.unwrap_or(0),
            support_load_more: state.support_load_more(),
        }
    }
}

impl FfiFeedSnapshot {
    pub(crate) fn free(snapshot: *mut Self) {
        let snapshot = unsafe { Box::from_raw(snapshot) };
        free_c_string(snapshot.query);
        free_c_string(snapshot.error_message);
        free_photo_list(snapshot.photos, snapshot.len);
    }
}
