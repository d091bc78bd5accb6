//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use sosrelay_api::{AppState, build_app};
use sosrelay_core::config::AppConfig;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching into the engine directly
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with default configuration and no
    /// system-of-record relay.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application from the given configuration
    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::from_config(config).expect("Failed to build app state");
        let router = build_app(state.clone());
        Self { router, state }
    }

    /// Serve the app on an ephemeral local port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server");
        });
        addr
    }

    /// Make a JSON HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.request_raw(method, path, body_str).await
    }

    /// Make an HTTP request with a raw body
    pub async fn request_raw(&self, method: &str, path: &str, body: String) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// A WebSocket test client speaking the relay's envelope format.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connect to `/ws` and consume the `connection_established` greeting.
    pub async fn connect(addr: SocketAddr) -> Self {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("Failed to connect");
        let mut client = Self { stream };
        let greeting = client.recv().await;
        assert_eq!(greeting["data"]["type"], "connection_established");
        client
    }

    /// Send a JSON frame.
    pub async fn send(&mut self, frame: Value) {
        self.stream
            .send(Message::text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next envelope, skipping heartbeat pings.
    pub async fn recv(&mut self) -> Value {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Stream closed")
                .expect("WebSocket error");
            if let Message::Text(text) = next {
                let envelope: Value = serde_json::from_str(text.as_str()).expect("JSON frame");
                if envelope["data"]["type"] != "ping" {
                    return envelope;
                }
            }
        }
    }

    /// Next envelope's payload, asserting its type.
    pub async fn expect(&mut self, kind: &str) -> Value {
        let envelope = self.recv().await;
        assert_eq!(envelope["data"]["type"], kind, "unexpected frame {envelope}");
        envelope["data"].clone()
    }

    /// Assert nothing but pings arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let quiet = tokio::time::timeout(Duration::from_millis(200), async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let envelope: Value =
                            serde_json::from_str(text.as_str()).expect("JSON frame");
                        if envelope["data"]["type"] != "ping" {
                            return envelope;
                        }
                    }
                    Some(Ok(_)) => {}
                    _ => std::future::pending::<()>().await,
                }
            }
        })
        .await;
        if let Ok(envelope) = quiet {
            panic!("expected no frames, got {envelope}");
        }
    }

    /// Close the socket.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Poll until `check` holds or the timeout elapses.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
