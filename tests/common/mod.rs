// tests/common/mod.rs
// Shared helpers: local axum servers standing in for remote APIs.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum::Router;

/// Bind `app` on an ephemeral localhost port; returns `http://127.0.0.1:{port}`.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// One request as the mock server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub headers: HeaderMap,
    pub body: String,
}

pub type Recorder = Arc<Mutex<Vec<Recorded>>>;

pub fn recorder() -> Recorder {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(rec: &Recorder, headers: &HeaderMap, body: &str) {
    rec.lock().unwrap().push(Recorded {
        headers: headers.clone(),
        body: body.to_string(),
    });
}
