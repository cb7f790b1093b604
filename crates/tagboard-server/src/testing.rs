//! Local stand-ins for upstream HTTP services.

use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> Url {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  Url::parse(&format!("http://{addr}/")).unwrap()
}
