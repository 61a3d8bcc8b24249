//! Local HTTP stand-in for the broker, used by the client tests.

use super::Endpoint;
use axum::Router;
use tokio::net::TcpListener;
use url::Url;

/// Serve `router` on an ephemeral local port and return an endpoint for it.
pub(super) async fn serve(router: Router) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Endpoint::new(Url::parse(&format!("http://{addr}/")).unwrap()).unwrap()
}
