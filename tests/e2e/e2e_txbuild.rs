use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::net::TcpListener;

use anvil_txbuild::{AnvilClient, TxBuildRequest};

const SENDER: &str = "addr_test1qrydyk6uw6cehk5u3zspyz3dhnwzmhfls2fp42vv5dv9g2z3885pg4kpkn30ptezc855lu3w5ey93zcr5lrezjmwkftqg8xvge";
const RECEIVER: &str = "addr_test1qr0tkwvlln0v5fljdxceudmlpt5y6szc84vpj4skm836tgn4hsqaesgg97l8ppy5rsn0alj8pth6lqe20fdyydsdgw6sr74cyt";
const E2E_KEY: &str = "testnet_e2e_key";

#[derive(Debug, Deserialize)]
struct BuiltTx {
    hash: String,
    complete: bool,
}

#[derive(Debug, Deserialize)]
struct ServiceFailure {
    error: String,
}

fn sample_request() -> TxBuildRequest {
    TxBuildRequest::new(SENDER).with_output(RECEIVER, 10_000_000)
}

#[tokio::test]
async fn e2e_build_roundtrip_over_http() {
    let server = TestServer::start().await;
    let client = AnvilClient::new(E2E_KEY).with_base_url(server.url("/v2/services"));

    let request = sample_request();
    let built: BuiltTx = client
        .build_transaction(&request)
        .await
        .expect("build should round-trip over a real socket");
    assert_eq!(built.hash, "deadbeef");
    assert!(!built.complete);

    let seen = server
        .state
        .requests
        .lock()
        .expect("test server mutex poisoned");
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];

    assert_eq!(
        headers.get("content-type").map(|v| v.as_bytes()),
        Some(b"application/json".as_slice())
    );
    assert_eq!(
        headers.get("x-api-key").map(|v| v.as_bytes()),
        Some(E2E_KEY.as_bytes())
    );

    let decoded: TxBuildRequest =
        sonic_rs::from_slice(body).expect("server should receive the wire document");
    assert_eq!(decoded, request);
}

#[tokio::test]
async fn e2e_500_body_is_parsed_and_surfaced() {
    let server = TestServer::start().await;
    let client = AnvilClient::new(E2E_KEY).with_base_url(server.url("/v2/failing"));

    let failure: ServiceFailure = client
        .build_transaction(&sample_request())
        .await
        .expect("a 500 body is parsed like any other");

    assert_eq!(failure.error, "bad request");
}

#[tokio::test]
async fn e2e_health_returns_body_text() {
    let server = TestServer::start().await;
    let client = AnvilClient::new(E2E_KEY).with_base_url(server.url("/v2/services"));

    let body = client.health().await.expect("health should succeed");
    assert_eq!(body, "OK");
}

#[derive(Clone, Default)]
struct AppState {
    requests: Arc<Mutex<Vec<(HeaderMap, Bytes)>>>,
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/v2/services/transactions/build", post(build_handler))
            .route("/v2/failing/transactions/build", post(failing_build_handler))
            .route("/v2/services/health", get(health_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn build_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    state
        .requests
        .lock()
        .expect("test server mutex poisoned")
        .push((headers, body));
    (StatusCode::OK, r#"{"hash":"deadbeef","complete":false}"#)
}

async fn failing_build_handler() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"bad request"}"#)
}

async fn health_handler() -> &'static str {
    "OK"
}
