use std::fs;

use axum::{Router, response::Html, routing::get};

pub(crate) fn fixture(name: &str) -> String {
    fs::read_to_string(format!("fixtures/{}", name)).expect("Failed to read fixture")
}

/// Serves each `(path, body)` pair as HTML on an ephemeral local port. Any other path
/// answers 404. Returns the server's base URL.
pub(crate) async fn serve_pages(pages: Vec<(&'static str, String)>) -> String {
    let mut router = Router::new();
    for (path, body) in pages {
        router = router.route(path, get(move || async move { Html(body) }));
    }
    serve_router(router).await
}

/// Serves `router` on an ephemeral local port and returns the server's base URL.
pub(crate) async fn serve_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    format!("http://{}", address)
}
