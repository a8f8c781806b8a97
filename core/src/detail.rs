//! Photo detail state machine.
//!
//! Same shape as [`crate::feed::Feed`]: triggers return a stamped
//! `DetailRequest`, and `apply` only accepts the latest stamp. A failed
//! reload keeps whatever was shown before and only sets the error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ConfigError};
use crate::types::{self, Owner, PhotoDetail};

/// Identifying parameters handed over by navigation. All optional because
/// they arrive untyped; `Detail::new` rejects missing ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailArgs {
    pub id: Option<String>,
    pub secret: Option<String>,
    pub server: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoKey {
    pub id: String,
    pub secret: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailState {
    pub key: PhotoKey,
    pub title: Option<String>,
    pub owner: Option<Owner>,
    pub description: Option<String>,
    pub view_count: u32,
    pub comment_count: Option<u32>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl DetailState {
    pub fn image_url(&self, host: &str) -> String {
        types::image_url(host, &self.key.server, &self.key.id, &self.key.secret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub generation: u64,
    pub id: String,
    pub secret: String,
}

#[derive(Debug)]
pub struct Detail {
    state: DetailState,
    generation: u64,
}

impl Detail {
    pub fn new(args: DetailArgs) -> Result<Self, ConfigError> {
        let key = PhotoKey {
            id: required(args.id, "id")?,
            secret: required(args.secret, "secret")?,
            server: required(args.server, "server")?,
        };
        Ok(Self {
            state: DetailState {
                key,
                title: args.title,
                owner: None,
                description: None,
                view_count: 0,
                comment_count: None,
                is_loading: false,
                error_message: None,
            },
            generation: 0,
        })
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Start (or restart) the fetch for this photo.
    pub fn reload(&mut self) -> DetailRequest {
        self.generation += 1;
        self.state.is_loading = true;
        DetailRequest {
            generation: self.generation,
            id: self.state.key.id.clone(),
            secret: self.state.key.secret.clone(),
        }
    }

    /// Returns `false` when the result was stale and dropped.
    pub fn apply(&mut self, generation: u64, result: Result<PhotoDetail, ApiError>) -> bool {
        if generation != self.generation || !self.state.is_loading {
            debug!(generation, latest = self.generation, "dropping superseded detail result");
            return false;
        }

        self.state.is_loading = false;
        match result {
            Ok(detail) => {
                self.state.title = Some(detail.title);
                self.state.owner = Some(detail.owner);
                self.state.description = Some(detail.description);
                self.state.view_count = detail.views;
                self.state.comment_count = Some(detail.comments);
                self.state.error_message = None;
            }
            Err(err) => self.state.error_message = Some(err.message()),
        }
        true
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingParameter(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DetailArgs {
        DetailArgs {
            id: Some("1".to_string()),
            secret: Some("2".to_string()),
            server: Some("1".to_string()),
            title: Some("from the grid".to_string()),
        }
    }

    fn detail(title: &str, views: u32) -> PhotoDetail {
        PhotoDetail {
            id: "1".to_string(),
            secret: "2".to_string(),
            server: "1".to_string(),
            owner: Owner {
                id: "1".to_string(),
                username: "username".to_string(),
                real_name: String::new(),
                location: String::new(),
                icon_server: "2334".to_string(),
                icon_farm: 34,
            },
            title: title.to_string(),
            description: "description".to_string(),
            views,
            comments: 3,
        }
    }

    #[test]
    fn missing_parameters_fail_construction() {
        for (field, mut a) in [
            ("id", DetailArgs { id: None, ..args() }),
            ("secret", DetailArgs { secret: None, ..args() }),
            ("server", DetailArgs { server: Some(String::new()), ..args() }),
        ] {
            a.title = None;
            match Detail::new(a) {
                Err(ConfigError::MissingParameter(name)) => assert_eq!(name, field),
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn title_from_navigation_is_shown_before_fetch() {
        let d = Detail::new(args()).unwrap();
        assert_eq!(d.state().title.as_deref(), Some("from the grid"));
        assert!(d.state().owner.is_none());
        assert_eq!(
            d.state().image_url("live.staticflickr.com"),
            "https://live.staticflickr.com/1/1_2.jpg"
        );
    }

    #[test]
    fn success_replaces_fields() {
        let mut d = Detail::new(args()).unwrap();
        let req = d.reload();
        assert_eq!((req.id.as_str(), req.secret.as_str()), ("1", "2"));
        assert!(d.state().is_loading);

        assert!(d.apply(req.generation, Ok(detail("fetched title", 42))));
        let s = d.state();
        assert_eq!(s.title.as_deref(), Some("fetched title"));
        assert_eq!(s.view_count, 42);
        assert_eq!(s.comment_count, Some(3));
        assert_eq!(s.owner.as_ref().unwrap().display_real_name(), None);
        assert_eq!(s.owner.as_ref().unwrap().username, "username");
        assert!(!s.is_loading);
    }

    #[test]
    fn stat_fail_sets_error_without_fields() {
        let mut d = Detail::new(DetailArgs { title: None, ..args() }).unwrap();
        let req = d.reload();
        d.apply(
            req.generation,
            Err(ApiError::Application {
                code: None,
                message: "Failed with message".to_string(),
            }),
        );
        let s = d.state();
        assert_eq!(s.error_message.as_deref(), Some("Failed with message"));
        assert!(s.title.is_none());
        assert!(s.owner.is_none());
        assert!(s.description.is_none());
        assert!(s.comment_count.is_none());
        assert!(!s.is_loading);
    }

    #[test]
    fn failed_reload_keeps_previous_data() {
        let mut d = Detail::new(args()).unwrap();
        let req = d.reload();
        d.apply(req.generation, Ok(detail("first", 1)));

        let req = d.reload();
        d.apply(
            req.generation,
            Err(ApiError::Transport {
                status: None,
                message: "timed out".to_string(),
            }),
        );
        let s = d.state();
        assert_eq!(s.title.as_deref(), Some("first"));
        assert_eq!(s.view_count, 1);
        assert_eq!(s.error_message.as_deref(), Some("timed out"));
        assert!(!s.is_loading);
    }

    #[test]
    fn superseded_reload_is_dropped() {
        let mut d = Detail::new(args()).unwrap();
        let old = d.reload();
        let new = d.reload();
        assert!(!d.apply(old.generation, Ok(detail("old", 1))));
        assert!(d.apply(new.generation, Ok(detail("new", 2))));
        assert_eq!(d.state().title.as_deref(), Some("new"));
    }
}
