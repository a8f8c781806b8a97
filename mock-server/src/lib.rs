//! In-process stand-in for the subset of the Flickr REST API the client uses.
//!
//! Like the real service, every call is a `GET` on one endpoint that
//! dispatches on the `method` query parameter, and application errors come
//! back as `200 OK` with `"stat": "fail"`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const REST_PATH: &str = "/services/rest/";
pub const DEFAULT_API_KEY: &str = "test-key";

const TITLES: [&str; 5] = [
    "sunset over the harbor",
    "mountain trail",
    "city lights",
    "forest path",
    "beach morning",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub nsid: String,
    pub username: String,
    pub realname: String,
    pub location: String,
    pub iconserver: String,
    pub iconfarm: u32,
}

#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub photo: Photo,
    pub owner: Owner,
    pub description: String,
    pub views: u32,
    pub comments: u32,
}

/// The photos the mock serves, newest first, and how it pages them.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub api_key: String,
    pub per_page: u32,
    pub entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    /// 25 photos, 5 per page.
    fn default() -> Self {
        Self::generate(25, 5)
    }
}

impl Catalog {
    /// Deterministic catalog of `count` photos. Titles cycle through a small
    /// word list so searches have predictable hits; every third owner has an
    /// empty real name.
    pub fn generate(count: usize, per_page: u32) -> Self {
        let owners: Vec<Owner> = (0..3)
            .map(|n| Owner {
                nsid: format!("1000{n}@N0{n}"),
                username: format!("user{n}"),
                realname: if n == 2 {
                    String::new()
                } else {
                    format!("Photographer {n}")
                },
                location: if n == 0 { "Lisbon, Portugal".to_string() } else { String::new() },
                iconserver: if n == 1 { "0".to_string() } else { format!("{}", 2330 + n) },
                iconfarm: if n == 1 { 0 } else { 3 },
            })
            .collect();

        let entries = (0..count)
            .map(|i| {
                let owner = owners[i % owners.len()].clone();
                CatalogEntry {
                    photo: Photo {
                        id: (53_000_000_000u64 + i as u64).to_string(),
                        owner: owner.nsid.clone(),
                        secret: format!("{:08x}", (i as u32 + 1).wrapping_mul(2_654_435_761)),
                        server: "65535".to_string(),
                        title: format!("{} #{i}", TITLES[i % TITLES.len()]),
                    },
                    owner,
                    description: format!("Description of photo {i}"),
                    views: (i as u32 + 1) * 17,
                    comments: (i % 4) as u32,
                }
            })
            .collect();

        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            per_page: per_page.max(1),
            entries,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn page_of(&self, matches: Vec<&CatalogEntry>, page: u32) -> Value {
        let total = matches.len() as u32;
        let pages = total.div_ceil(self.per_page);
        let start = (page as usize - 1).saturating_mul(self.per_page as usize);
        let photos: Vec<&Photo> = matches
            .iter()
            .skip(start)
            .take(self.per_page as usize)
            .map(|e| &e.photo)
            .collect();

        json!({
            "photos": {
                "page": page,
                "pages": pages,
                "perpage": self.per_page,
                "total": total,
                "photo": photos,
            },
            "stat": "ok",
        })
    }

    fn info(&self, id: &str, secret: &str) -> Value {
        let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.photo.id == id && e.photo.secret == secret)
        else {
            return fail(1, "Photo not found");
        };

        // The real service sends the counters as strings.
        json!({
            "photo": {
                "id": entry.photo.id,
                "secret": entry.photo.secret,
                "server": entry.photo.server,
                "owner": entry.owner,
                "title": { "_content": entry.photo.title },
                "description": { "_content": entry.description },
                "views": entry.views.to_string(),
                "comments": { "_content": entry.comments.to_string() },
            },
            "stat": "ok",
        })
    }
}

pub fn app() -> Router {
    app_with(Catalog::default())
}

pub fn app_with(catalog: Catalog) -> Router {
    Router::new()
        .route(REST_PATH, get(rest))
        .with_state(Arc::new(catalog))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Catalog::default()).await
}

pub async fn run_with(listener: TcpListener, catalog: Catalog) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(catalog)).await
}

fn fail(code: i64, message: &str) -> Value {
    json!({ "stat": "fail", "code": code, "message": message })
}

async fn rest(
    State(catalog): State<Arc<Catalog>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
    let method = param("method");
    debug!(method, "mock request");

    if param("api_key") != catalog.api_key {
        return Json(fail(100, "Invalid API Key (Key not found)"));
    }
    if param("format") != "json" || param("nojsoncallback") != "1" {
        return Json(fail(111, "Format \"rest\" not found"));
    }

    let page = param("page").parse::<u32>().unwrap_or(1).max(1);
    let body = match method {
        "flickr.photos.getRecent" => catalog.page_of(catalog.entries.iter().collect(), page),
        "flickr.photos.search" => {
            let text = param("text").trim().to_lowercase();
            if text.is_empty() {
                fail(
                    3,
                    "Parameterless searches have been disabled. \
                     Please use flickr.photos.getRecent instead.",
                )
            } else {
                let matches = catalog
                    .entries
                    .iter()
                    .filter(|e| e.photo.title.to_lowercase().contains(&text))
                    .collect();
                catalog.page_of(matches, page)
            }
        }
        "flickr.photos.getInfo" => catalog.info(param("photo_id"), param("secret")),
        other => fail(112, &format!("Method \"{other}\" not found")),
    };
    Json(body)
}
