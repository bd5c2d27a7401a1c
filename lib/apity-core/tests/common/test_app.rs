#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

use apity_core::{Apity, FetchConfig, RequestInit};

/// Headers echoed back by the test server.
const ECHOED_HEADERS: [&str; 4] = ["accept", "admin", "authorization", "content-type"];

/// What the echo endpoints received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Echo {
    /// The raw request path, still percent-encoded.
    pub path: String,
    /// The decoded path parameters.
    pub params: HashMap<String, String>,
    /// The decoded query pairs, in order.
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    /// The JSON body, `null` when empty.
    pub body: Value,
}

#[derive(Debug)]
pub struct TestApp {
    pub base_url: String,
    pub apity: Apity,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("binding test server")?;
        let addr = listener.local_addr()?;
        info!(%addr, "launching server");

        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router()).await {
                error!(%error, "test server failure");
            }
        });

        let base_url = format!("http://{addr}");
        let apity = Apity::new();
        apity.configure(Self::default_config(&base_url)?);

        Ok(Self { base_url, apity })
    }

    pub fn default_config(base_url: &str) -> anyhow::Result<FetchConfig> {
        let init = RequestInit::new().with_header("Authorization", "Bearer token")?;
        Ok(FetchConfig::default()
            .with_base_url(base_url)
            .with_init(init))
    }
}

/// The headers every request carries.
pub fn expected_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("accept".to_string(), "application/json".to_string()),
        ("authorization".to_string(), "Bearer token".to_string()),
    ])
}

/// The headers of a request with a JSON body.
pub fn headers_with_content_type() -> BTreeMap<String, String> {
    let mut headers = expected_headers();
    headers.insert("content-type".to_string(), "application/json".to_string());
    headers
}

fn router() -> Router {
    let echo_routes = post(echo).put(echo).patch(echo).delete(echo);

    Router::new()
        .route("/query/{a}/{b}", get(echo))
        .route("/body/{id}", echo_routes.clone())
        .route("/bodyarray/{id}", echo_routes.clone())
        .route("/bodyquery/{id}", echo_routes)
        .route("/nocontent", post(no_content))
        .route("/text", get(text))
        .route("/error/{status}", get(error_status))
        .route("/defaulterror", get(default_error))
        .route("/counter", get(counter))
        .with_state(Arc::new(AtomicU64::new(0)))
}

async fn echo(
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let query = uri
        .query()
        .map(|query| {
            serde_urlencoded::from_str::<Vec<(String, String)>>(query).expect("valid query")
        })
        .unwrap_or_default();

    let headers = ECHOED_HEADERS
        .iter()
        .filter_map(|name| {
            let value = headers.get(*name)?.to_str().ok()?;
            Some((name.to_string(), value.to_string()))
        })
        .collect::<BTreeMap<_, _>>();

    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };

    Json(json!({
        "path": uri.path(),
        "params": params,
        "query": query,
        "headers": headers,
        "body": body,
    }))
}

async fn no_content() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(CONTENT_TYPE, "application/json")])
}

async fn text() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], "hello")
}

async fn error_status(Path(status): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match status {
        StatusCode::BAD_REQUEST => json!({ "badRequest": true }),
        StatusCode::INTERNAL_SERVER_ERROR => json!({ "internalServer": true }),
        _ => json!({ "message": "unknown error" }),
    };
    (status, Json(body))
}

async fn default_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, "text/plain")],
        "internal server error",
    )
}

async fn counter(State(count): State<Arc<AtomicU64>>) -> Json<Value> {
    let count = count.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "count": count }))
}

