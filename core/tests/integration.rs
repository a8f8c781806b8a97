//! End-to-end tests against the mock photo service over real HTTP.
//!
//! # Design
//! Each test starts the mock server on a random port on its own thread, then
//! drives the core through `FlickrApi` + `UreqTransport`, either directly or
//! through the async controllers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flickr_core::{
    ApiError, ClientConfig, DetailArgs, DetailController, FeedController, FlickrApi, FlickrClient,
    PhotoApi, Timeouts, UreqTransport,
};
use mock_server::Catalog;
use tokio::sync::watch;

/// Start the mock server with `catalog` and return its address.
fn start_server(catalog: Catalog) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, catalog).await
        })
        .unwrap();
    });

    addr
}

fn api_for(addr: SocketAddr) -> FlickrApi {
    let mut config = ClientConfig::default();
    config.apply_overrides(|name| match name {
        "FLICKR_BASE_URL" => Some(format!("http://{addr}/services/rest")),
        "FLICKR_API_KEY" => Some(mock_server::DEFAULT_API_KEY.to_string()),
        _ => None,
    });
    FlickrApi::from_config(&config).unwrap()
}

async fn wait_for<T: Clone>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) -> T {
    let state = tokio::time::timeout(Duration::from_secs(10), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("controller stopped");
    state.clone()
}

#[test]
fn api_calls_against_mock() {
    let catalog = Catalog::default();
    let known = catalog.entries[2].photo.clone();
    let api = api_for(start_server(catalog));

    let page = api.fetch_recent(1).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.pages, 5);
    assert_eq!(page.per_page, 5);
    assert_eq!(page.total, 25);
    assert_eq!(page.photos.len(), 5);

    let hits = api.search("sunset", 1).unwrap();
    assert_eq!(hits.total, 5);
    assert!(hits.photos.iter().all(|p| p.title.contains("sunset")));

    let detail = api.fetch_detail(&known.id, &known.secret).unwrap();
    assert_eq!(detail.id, known.id);
    assert_eq!(detail.title, known.title);
    assert_eq!(detail.owner.display_real_name(), None);
    assert_eq!(detail.owner.username, "user2");

    let err = api.fetch_detail(&known.id, "wrong-secret").unwrap_err();
    assert_eq!(err.message(), "Photo not found");
}

#[test]
fn wrong_api_key_is_application_failure() {
    let addr = start_server(Catalog::default());
    let api = FlickrApi::new(
        FlickrClient::new(&format!("http://{addr}/services/rest"), "not-the-key"),
        UreqTransport::default(),
    );
    let err = api.fetch_recent(1).unwrap_err();
    assert!(matches!(err, ApiError::Application { code: Some(100), .. }));
}

#[test]
fn wrong_path_is_transport_failure() {
    let addr = start_server(Catalog::default());
    let api = FlickrApi::new(
        FlickrClient::new(&format!("http://{addr}/elsewhere"), "test-key"),
        UreqTransport::default(),
    );
    let err = api.fetch_recent(1).unwrap_err();
    assert_eq!(
        err,
        ApiError::Transport {
            status: Some(404),
            message: "Not Found".to_string()
        }
    );
}

#[test]
fn refused_connection_is_transport_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let api = FlickrApi::new(
        FlickrClient::new(&format!("http://{addr}/services/rest"), "test-key"),
        UreqTransport::default(),
    );
    let err = api.fetch_recent(1).unwrap_err();
    assert!(matches!(err, ApiError::Transport { status: None, .. }));
    assert!(!err.message().is_empty());
}

#[test]
fn silent_server_times_out() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        // Accept and hold the connection without ever answering.
        let (_stream, _) = listener.accept().unwrap();
        std::thread::sleep(Duration::from_secs(10));
    });

    let timeouts = Timeouts {
        connect_secs: 1,
        read_secs: 1,
        write_secs: 1,
    };
    let api = FlickrApi::new(
        FlickrClient::new(&format!("http://{addr}/services/rest"), "test-key"),
        UreqTransport::new(&timeouts),
    );

    let started = std::time::Instant::now();
    let err = api.fetch_recent(1).unwrap_err();
    assert!(matches!(err, ApiError::Transport { status: None, .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn feed_pages_through_recent_then_searches() {
    let catalog = Catalog::default();
    let expected_ids: Vec<String> = catalog.entries[..10]
        .iter()
        .map(|e| e.photo.id.clone())
        .collect();
    let api: Arc<dyn PhotoApi> = Arc::new(api_for(start_server(catalog)));

    let feed = FeedController::spawn(api);
    let mut states = feed.subscribe();

    // Step 1: the initial load brings page 1 of 5.
    let state = wait_for(&mut states, |s| !s.is_loading && !s.photos.is_empty()).await;
    assert_eq!(state.photos.len(), 5);
    assert_eq!(state.cursor.next_page, Some(2));
    assert!(feed.support_load_more());

    // Step 2: load-more appends page 2 after page 1.
    feed.request_next_page();
    let state = wait_for(&mut states, |s| !s.is_loading && s.photos.len() == 10).await;
    let ids: Vec<String> = state.photos.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, expected_ids);
    assert_eq!(state.cursor.next_page, Some(3));

    // Step 3: a search replaces the list and fits on one page.
    feed.submit_query("sunset", false);
    let state = wait_for(&mut states, |s| {
        s.query == "sunset" && !s.is_loading && !s.photos.is_empty()
    })
    .await;
    assert_eq!(state.photos.len(), 5);
    assert_eq!(state.cursor.next_page, None);
    assert!(!feed.support_load_more());
    assert_eq!(state.error_message, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn detail_loads_from_mock() {
    let catalog = Catalog::default();
    let entry = catalog.entries[2].clone();
    let api: Arc<dyn PhotoApi> = Arc::new(api_for(start_server(catalog)));

    let detail = DetailController::spawn(
        Arc::clone(&api),
        DetailArgs {
            id: Some(entry.photo.id.clone()),
            secret: Some(entry.photo.secret.clone()),
            server: Some(entry.photo.server.clone()),
            title: None,
        },
    )
    .unwrap();
    let mut states = detail.subscribe();
    let state = wait_for(&mut states, |s| !s.is_loading && s.owner.is_some()).await;

    let owner = state.owner.unwrap();
    assert_eq!(owner.username, "user2");
    assert_eq!(owner.display_real_name(), None);
    assert_eq!(state.title.as_deref(), Some(entry.photo.title.as_str()));
    assert_eq!(state.view_count, entry.views);
    assert_eq!(state.comment_count, Some(entry.comments));

    let missing = DetailController::spawn(
        api,
        DetailArgs {
            id: Some("1".to_string()),
            secret: Some("2".to_string()),
            server: Some("1".to_string()),
            title: None,
        },
    )
    .unwrap();
    let mut states = missing.subscribe();
    let state = wait_for(&mut states, |s| s.error_message.is_some()).await;
    assert_eq!(state.error_message.as_deref(), Some("Photo not found"));
    assert!(state.owner.is_none());
    assert!(!state.is_loading);
}
