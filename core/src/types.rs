//! Domain types for the photo service.
//!
//! # Design
//! `Photo`, `PhotoPage` and `Owner` deserialize straight from the service's
//! wire shape (hence the `rename`s). `PhotoDetail` is flattened from the
//! nested `photo` object of `flickr.photos.getInfo`, whose text fields arrive
//! wrapped in `{"_content": ...}` objects and whose counters arrive as
//! strings.
//!
//! The mock server defines its own copies of these shapes; integration tests
//! catch any drift between the two.

use serde::{Deserialize, Serialize};

/// Image host used when no other is configured.
pub const DEFAULT_IMAGE_HOST: &str = "live.staticflickr.com";

const DEFAULT_BUDDY_ICON: &str = "https://www.flickr.com/images/buddyicon.gif";

/// A single photo as listed by the recent and search endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    #[serde(default)]
    pub title: String,
}

impl Photo {
    /// Render the display URL for this photo on `host`.
    pub fn image_url(&self, host: &str) -> String {
        image_url(host, &self.server, &self.id, &self.secret)
    }
}

/// `https://<host>/<server-id>/<id>_<secret>.jpg`
pub fn image_url(host: &str, server: &str, id: &str, secret: &str) -> String {
    format!("https://{host}/{server}/{id}_{secret}.jpg")
}

/// One page of photo results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoPage {
    #[serde(deserialize_with = "lenient::u32")]
    pub page: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub pages: u32,
    #[serde(rename = "perpage", deserialize_with = "lenient::u32")]
    pub per_page: u32,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub total: u32,
    #[serde(rename = "photo", default)]
    pub photos: Vec<Photo>,
}

/// The account that posted a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "nsid")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "realname", default)]
    pub real_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "iconserver", default)]
    pub icon_server: String,
    #[serde(rename = "iconfarm", default, deserialize_with = "lenient::u32")]
    pub icon_farm: u32,
}

impl Owner {
    /// The real name, or `None` when the service sent an empty one.
    pub fn display_real_name(&self) -> Option<&str> {
        let name = self.real_name.trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn buddy_icon_url(&self) -> String {
        let server = self.icon_server.trim();
        if server.is_empty() || server == "0" || self.icon_farm == 0 {
            return DEFAULT_BUDDY_ICON.to_string();
        }
        format!(
            "https://farm{}.staticflickr.com/{server}/buddyicons/{}.jpg",
            self.icon_farm, self.id
        )
    }
}

/// Metadata for one photo, as shown on the detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDetail {
    pub id: String,
    pub secret: String,
    pub server: String,
    pub owner: Owner,
    pub title: String,
    pub description: String,
    pub views: u32,
    pub comments: u32,
}

impl PhotoDetail {
    pub fn image_url(&self, host: &str) -> String {
        image_url(host, &self.server, &self.id, &self.secret)
    }
}

/// Wire shape of the `photo` object returned by `flickr.photos.getInfo`.
#[derive(Debug, Deserialize)]
pub(crate) struct PhotoInfo {
    id: String,
    secret: String,
    server: String,
    owner: Owner,
    #[serde(default)]
    title: Option<Content>,
    #[serde(default)]
    description: Option<Content>,
    #[serde(default, deserialize_with = "lenient::u32")]
    views: u32,
    #[serde(default)]
    comments: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(rename = "_content", default)]
    content: String,
}

impl TryFrom<PhotoInfo> for PhotoDetail {
    type Error = String;

    fn try_from(info: PhotoInfo) -> Result<Self, Self::Error> {
        let comments = match info.comments {
            Some(c) if !c.content.trim().is_empty() => c
                .content
                .trim()
                .parse()
                .map_err(|e| format!("comments: {e}"))?,
            _ => 0,
        };
        Ok(PhotoDetail {
            id: info.id,
            secret: info.secret,
            server: info.server,
            owner: info.owner,
            title: info.title.map(|c| c.content).unwrap_or_default(),
            description: info.description.map(|c| c.content).unwrap_or_default(),
            views: info.views,
            comments,
        })
    }
}

/// The service emits some counters as JSON numbers and others as numeric
/// strings, sometimes for the same field across endpoints.
mod lenient {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Text(String),
    }

    pub fn u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => u32::try_from(n).map_err(de::Error::custom),
            NumberOrString::Text(s) if s.trim().is_empty() => Ok(0),
            NumberOrString::Text(s) => s.trim().parse().map_err(de::Error::custom),
        }
    }
}
