//! Shared test fixtures
//!
//! - [`MockBackend`]: axum server on an ephemeral port with canned answers
//!   per route and a record of every request it received
//! - [`FakeExtension`]: in-process wallet extension with call counters

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use redvalid_ui::error::WalletError;
use redvalid_ui::wallet::{SignOptions, WalletExtension};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const WALLET: &str = "GAVMYU2ZXTQ7IAK77NAICSKZZNH6T2FPVQ6XIAUWWHIZ6P7Y2CS736A6";

/// Route names used for canned responses and hit counts
pub const VERIFY: &str = "verify";
pub const VERIFY_FILE: &str = "verify_file";
pub const PREPARE_URL: &str = "prepare_url";
pub const PREPARE_FILE: &str = "prepare_file";
pub const SUBMIT: &str = "submit";
pub const CREATE_REPORTER: &str = "create_reporter";
pub const GET_REPORTER: &str = "get_reporter";

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: Value,
    delay: Option<Duration>,
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: &'static str,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    /// Parsed JSON body, or `Null` for non-JSON bodies
    pub json: Value,
    pub raw: Vec<u8>,
}

#[derive(Default)]
struct MockInner {
    canned: HashMap<&'static str, Canned>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockInner>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `route` with `status` and a JSON body
    pub fn respond(&self, route: &'static str, status: u16, body: Value) -> &Self {
        self.inner.lock().unwrap().canned.insert(
            route,
            Canned {
                status,
                body,
                delay: None,
            },
        );
        self
    }

    /// Like [`MockBackend::respond`], but after sleeping for `delay`
    pub fn respond_after(&self, route: &'static str, delay: Duration, status: u16, body: Value) -> &Self {
        self.inner.lock().unwrap().canned.insert(
            route,
            Canned {
                status,
                body,
                delay: Some(delay),
            },
        );
        self
    }

    pub fn hits(&self, route: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.route == route)
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn requests(&self, route: &str) -> Vec<RecordedRequest> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.route == route)
            .cloned()
            .collect()
    }

    pub fn routes_hit(&self) -> Vec<&'static str> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| r.route)
            .collect()
    }

    /// Serve on an ephemeral local port; returns the base URL
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/verify", post(verify))
            .route("/verify/file", post(verify_file))
            .route("/videos/prepare-transaction", post(prepare_url))
            .route("/videos/prepare-transaction/upload", post(prepare_file))
            .route("/videos/submit-transaction", post(submit))
            .route("/reporters/", post(create_reporter))
            .route("/reporters/:wallet", get(get_reporter))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn answer(&self, route: &'static str, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Response {
        let canned = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(RecordedRequest {
                route,
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
                content_type: headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                json: serde_json::from_slice(&body).unwrap_or(Value::Null),
                raw: body.to_vec(),
            });
            inner.canned.get(route).cloned()
        };

        let Some(canned) = canned else {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("no canned response for {}", route) })),
            )
                .into_response();
        };

        if let Some(delay) = canned.delay {
            tokio::time::sleep(delay).await;
        }
        let status = StatusCode::from_u16(canned.status).unwrap();
        (status, Json(canned.body)).into_response()
    }
}

async fn verify(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(VERIFY, &uri, &headers, body).await
}

async fn verify_file(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(VERIFY_FILE, &uri, &headers, body).await
}

async fn prepare_url(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(PREPARE_URL, &uri, &headers, body).await
}

async fn prepare_file(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(PREPARE_FILE, &uri, &headers, body).await
}

async fn submit(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(SUBMIT, &uri, &headers, body).await
}

async fn create_reporter(State(mock): State<MockBackend>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.answer(CREATE_REPORTER, &uri, &headers, body).await
}

async fn get_reporter(
    State(mock): State<MockBackend>,
    Path(_wallet): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.answer(GET_REPORTER, &uri, &headers, body).await
}

/// Base URL nothing listens on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn reporter_json(name: &str) -> Value {
    json!({
        "id": "r-1",
        "full_name": name,
        "wallet_address": WALLET,
        "institution": null,
        "kyc_verified": false,
        "created_at": "2026-01-01T00:00:00"
    })
}

/// Wallet extension double
pub struct FakeExtension {
    pub connected: bool,
    pub address: Value,
    pub sign_result: Result<Value, WalletError>,
    pub sign_calls: AtomicUsize,
    pub access_calls: AtomicUsize,
    pub last_sign: Mutex<Option<(String, SignOptions)>>,
}

impl FakeExtension {
    /// Connected extension that signs everything as `SIGNED_XDR`
    pub fn connected() -> Self {
        Self {
            connected: true,
            address: json!(WALLET),
            sign_result: Ok(json!({ "signedTxXdr": "SIGNED_XDR" })),
            sign_calls: AtomicUsize::new(0),
            access_calls: AtomicUsize::new(0),
            last_sign: Mutex::new(None),
        }
    }

    pub fn with_sign_result(mut self, result: Result<Value, WalletError>) -> Self {
        self.sign_result = result;
        self
    }

    pub fn with_address(mut self, address: Value) -> Self {
        self.address = address;
        self
    }

    pub fn sign_count(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletExtension for FakeExtension {
    fn name(&self) -> &str {
        "fake"
    }

    async fn is_connected(&self) -> Result<bool, WalletError> {
        Ok(self.connected)
    }

    async fn request_access(&self) -> Result<Value, WalletError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.address.clone())
    }

    async fn get_address(&self) -> Result<Value, WalletError> {
        Ok(self.address.clone())
    }

    async fn sign_transaction(&self, xdr: &str, options: &SignOptions) -> Result<Value, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sign.lock().unwrap() = Some((xdr.to_string(), options.clone()));
        self.sign_result.clone()
    }
}
