//! Stateless HTTP request builder and response parser for the photo service.
//!
//! # Design
//! `FlickrClient` holds only the endpoint and the API key. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. The caller executes the
//! actual HTTP round-trip, keeping this module deterministic and free of I/O.
//!
//! The fixed protocol parameters (`format`, `nojsoncallback`, `api_key`) are
//! appended after the operation parameters on every request.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{PhotoDetail, PhotoInfo, PhotoPage};

/// Production endpoint of the photo service.
pub const DEFAULT_BASE_URL: &str = "https://api.flickr.com/services/rest";

pub const METHOD_RECENT: &str = "flickr.photos.getRecent";
pub const METHOD_SEARCH: &str = "flickr.photos.search";
pub const METHOD_INFO: &str = "flickr.photos.getInfo";

/// Synchronous, stateless client for the photo service.
#[derive(Debug, Clone)]
pub struct FlickrClient {
    base_url: String,
    api_key: String,
}

impl FlickrClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_recent(&self, page: u32) -> HttpRequest {
        self.build(METHOD_RECENT, &[("page", &page.to_string())])
    }

    pub fn build_search(&self, text: &str, page: u32) -> HttpRequest {
        self.build(METHOD_SEARCH, &[("text", text), ("page", &page.to_string())])
    }

    pub fn build_detail(&self, id: &str, secret: &str) -> HttpRequest {
        self.build(METHOD_INFO, &[("photo_id", id), ("secret", secret)])
    }

    /// Parse a response to either `build_recent` or `build_search`.
    pub fn parse_page(&self, response: HttpResponse) -> Result<PhotoPage, ApiError> {
        let envelope: PhotosEnvelope = open_envelope(&response)?;
        envelope
            .photos
            .ok_or_else(|| ApiError::Decode("missing `photos` payload".to_string()))
    }

    pub fn parse_detail(&self, response: HttpResponse) -> Result<PhotoDetail, ApiError> {
        let envelope: InfoEnvelope = open_envelope(&response)?;
        let info = envelope
            .photo
            .ok_or_else(|| ApiError::Decode("missing `photo` payload".to_string()))?;
        PhotoDetail::try_from(info).map_err(ApiError::Decode)
    }

    fn build(&self, method: &str, params: &[(&str, &str)]) -> HttpRequest {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("method", method);
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query
            .append_pair("format", "json")
            .append_pair("nojsoncallback", "1")
            .append_pair("api_key", &self.api_key);

        HttpRequest {
            url: format!("{}/?{}", self.base_url, query.finish()),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// The `stat`/`code`/`message` fields every response carries.
#[derive(Debug, Deserialize)]
struct Status {
    stat: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotosEnvelope {
    photos: Option<PhotoPage>,
}

#[derive(Debug, Deserialize)]
struct InfoEnvelope {
    photo: Option<PhotoInfo>,
}

/// Check the transport status and the envelope `stat`, then decode the
/// payload wrapper.
fn open_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Transport {
            status: Some(response.status),
            message: response.status_text(),
        });
    }

    let status: Status = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    if status.stat != "ok" {
        return Err(ApiError::Application {
            code: status.code,
            message: status.message.unwrap_or_default(),
        });
    }

    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FlickrClient {
        FlickrClient::new("http://localhost:3000/services/rest", "test-key")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_recent_appends_fixed_parameters() {
        let req = client().build_recent(1);
        assert_eq!(
            req.url,
            "http://localhost:3000/services/rest/?method=flickr.photos.getRecent&page=1\
             &format=json&nojsoncallback=1&api_key=test-key"
        );
        assert_eq!(
            req.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn build_search_encodes_text() {
        let req = client().build_search("golden gate & bay", 3);
        assert!(req.url.contains("method=flickr.photos.search"));
        assert!(req.url.contains("text=golden+gate+%26+bay&page=3"));
        assert!(req.url.ends_with("&api_key=test-key"));
    }

    #[test]
    fn build_detail_carries_id_and_secret() {
        let req = client().build_detail("7", "87");
        assert!(req
            .url
            .contains("method=flickr.photos.getInfo&photo_id=7&secret=87&format=json"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = FlickrClient::new("http://localhost:3000/services/rest/", "k");
        assert_eq!(c.base_url(), "http://localhost:3000/services/rest");
        assert!(c
            .build_recent(2)
            .url
            .starts_with("http://localhost:3000/services/rest/?method="));
    }

    #[test]
    fn parse_page_success() {
        let page = client()
            .parse_page(ok(r#"{"photos":{"page":1,"pages":5,"perpage":5,"total":25,
                "photo":[{"id":"1","owner":"12","secret":"1","server":"1","title":""}]},
                "stat":"ok"}"#))
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 5);
        assert_eq!(page.per_page, 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.photos.len(), 1);
    }

    #[test]
    fn parse_page_non_success_status() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: "Bad Request".to_string(),
        };
        let err = client().parse_page(response).unwrap_err();
        assert_eq!(
            err,
            ApiError::Transport {
                status: Some(404),
                message: "Not Found".to_string()
            }
        );
    }

    #[test]
    fn parse_page_stat_fail() {
        let err = client()
            .parse_page(ok(
                r#"{"stat":"fail","code":100,"message":"Invalid API Key (Key has invalid format)"}"#,
            ))
            .unwrap_err();
        assert_eq!(err.message(), "Invalid API Key (Key has invalid format)");
        assert!(matches!(err, ApiError::Application { code: Some(100), .. }));
    }

    #[test]
    fn parse_detail_stat_fail_uses_server_message() {
        let err = client()
            .parse_detail(ok(r#"{"stat":"fail","message":"Failed with message"}"#))
            .unwrap_err();
        assert_eq!(err.message(), "Failed with message");
    }

    #[test]
    fn parse_detail_stat_fail_without_message_is_empty() {
        let err = client().parse_detail(ok(r#"{"stat":"fail"}"#)).unwrap_err();
        assert_eq!(err.message(), "");
    }

    #[test]
    fn parse_detail_success() {
        let detail = client()
            .parse_detail(ok(r#"{"photo":{"id":"1","secret":"2","server":"1",
                "owner":{"nsid":"1","username":"username","realname":"",
                         "location":"","iconserver":"2334","iconfarm":34},
                "title":{"_content":"title"},"description":{"_content":"description"},
                "views":"1","comments":{"_content":"0"}},"stat":"ok"}"#))
            .unwrap();
        assert_eq!(detail.id, "1");
        assert_eq!(detail.owner.username, "username");
        assert_eq!(detail.owner.display_real_name(), None);
        assert_eq!(detail.views, 1);
    }

    #[test]
    fn parse_bad_json() {
        let err = client().parse_page(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn parse_ok_without_payload() {
        let err = client().parse_page(ok(r#"{"stat":"ok"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
