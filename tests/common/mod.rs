//! In-process fake OPNsense API shared by the integration tests.
//!
//! Replies are keyed by request path; anything unknown answers 404. Every request
//! is recorded so tests can count hits and inspect headers and bodies.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use opnsense_exporter::config::OpnSenseConfig;
use secrecy::SecretString;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// `{"System":{"status":"OK"},"Firewall":{"status":"OK"}}`, gzip-compressed
pub const HEALTHY_GZIP: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xab, 0x56, 0x0a, 0xae, 0x2c,
    0x2e, 0x49, 0xcd, 0x55, 0xb2, 0xaa, 0x56, 0x2a, 0x2e, 0x49, 0x2c, 0x29, 0x2d, 0x56, 0xb2,
    0x52, 0xf2, 0xf7, 0x56, 0xaa, 0xd5, 0x51, 0x72, 0xcb, 0x2c, 0x4a, 0x2d, 0x4f, 0xcc, 0xc9,
    0xc1, 0x90, 0xaa, 0x05, 0x00, 0x39, 0x5c, 0x97, 0x6e, 0x35, 0x00, 0x00, 0x00,
];

pub const HEALTHY_JSON: &str = r#"{"System":{"status":"OK"},"Firewall":{"status":"OK"}}"#;
pub const UNHEALTHY_JSON: &str = r#"{"metadata":{"System":{"status":1},"Firewall":{"status":1}}}"#;

pub const HEALTH_PATH: &str = "/api/core/system/status";
pub const SERVICES_PATH: &str = "/api/core/service/search";
pub const ARP_PATH: &str = "/api/diagnostics/interface/search_arp";

#[derive(Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub gzip: bool,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            gzip: false,
        }
    }

    pub fn gzip(body: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_vec(),
            gzip: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Default)]
struct Upstream {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FakeOpnSense {
    pub addr: SocketAddr,
    upstream: Arc<Upstream>,
}

impl FakeOpnSense {
    pub async fn start() -> Self {
        let upstream = Arc::new(Upstream::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&upstream));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake upstream failed");
        });

        Self { addr, upstream }
    }

    /// Fake that answers the health check as healthy
    pub async fn healthy() -> Self {
        let fake = Self::start().await;
        fake.reply(HEALTH_PATH, Reply::json(HEALTHY_JSON));
        fake
    }

    pub fn reply(&self, path: &str, reply: Reply) {
        self.upstream
            .replies
            .lock()
            .unwrap()
            .insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.upstream.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn config(&self) -> OpnSenseConfig {
        opnsense_config(&self.addr.to_string())
    }
}

async fn handle(
    State(upstream): State<Arc<Upstream>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    upstream.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: path.clone(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let reply = upstream.replies.lock().unwrap().get(&path).cloned();
    let reply = reply.unwrap_or_else(|| Reply::status(StatusCode::NOT_FOUND, "not found"));

    let mut builder = Response::builder()
        .status(reply.status)
        .header(header::CONTENT_TYPE, "application/json");
    if reply.gzip {
        builder = builder.header(header::CONTENT_ENCODING, "gzip");
    }
    builder.body(Body::from(reply.body)).unwrap()
}

pub fn opnsense_config(host: &str) -> OpnSenseConfig {
    OpnSenseConfig {
        protocol: "http".to_string(),
        host: host.to_string(),
        api_key: SecretString::from("key"),
        api_secret: SecretString::from("secret"),
        api_key_file: None,
        api_secret_file: None,
        insecure: false,
    }
}

/// An address nothing listens on
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    addr.to_string()
}
