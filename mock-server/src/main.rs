use mock_server::Catalog;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut catalog = Catalog::default();
    if let Ok(key) = std::env::var("MOCK_FLICKR_API_KEY") {
        catalog = catalog.with_api_key(&key);
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, photos = catalog.len(), "mock photo service listening");
    mock_server::run_with(listener, catalog).await
}
