//! Shared utilities for integration testing: in-process stub providers and a
//! proxy server bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use stock_report_proxy::config::{Credentials, ProxyConfig};
use stock_report_proxy::{HttpServer, Shutdown};

pub const FINANCIAL_KEY: &str = "FINANCIAL-TEST-KEY-0001";
pub const GENERATIVE_KEY: &str = "GENERATIVE-TEST-KEY-0002";

/// Every request a stub received, in arrival order.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }
}

type Responder = Arc<dyn Fn(&str, usize) -> (u16, Value) + Send + Sync>;

#[derive(Clone)]
struct StubState {
    log: Arc<CallLog>,
    respond: Responder,
}

/// Serve `router` on 127.0.0.1 with an OS-assigned port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Address nobody listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Stub financial-data provider at `/query`.
///
/// `respond` gets the `function` parameter and how many times that function
/// was called before, and returns the status and JSON body to send.
pub async fn financial_stub<F>(respond: F) -> (SocketAddr, Arc<CallLog>)
where
    F: Fn(&str, usize) -> (u16, Value) + Send + Sync + 'static,
{
    async fn handler(
        State(state): State<StubState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let function = params.get("function").cloned().unwrap_or_default();
        if params.get("apikey").map(String::as_str) != Some(FINANCIAL_KEY) {
            return (StatusCode::OK, Json(json!({"Error Message": "the parameter apikey is invalid or missing."})));
        }
        let previous = state.log.count(&function);
        state.log.record(function.clone());
        let (status, body) = (state.respond)(&function, previous);
        (StatusCode::from_u16(status).unwrap(), Json(body))
    }

    let state = StubState {
        log: Arc::new(CallLog::default()),
        respond: Arc::new(respond),
    };
    let log = state.log.clone();
    let router = Router::new().route("/query", get(handler)).with_state(state);
    (serve(router).await, log)
}

/// Stub generative provider at `/models/{model}:generateContent`.
///
/// `respond` gets the prompt text and the number of earlier calls.
pub async fn generative_stub<F>(respond: F) -> (SocketAddr, Arc<CallLog>)
where
    F: Fn(&str, usize) -> (u16, Value) + Send + Sync + 'static,
{
    async fn handler(
        State(state): State<StubState>,
        Path(call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GENERATIVE_KEY) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}})),
            );
        }
        assert!(call.ends_with(":generateContent"), "unexpected call {}", call);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default().to_string();
        let previous = state.log.total();
        state.log.record(prompt.clone());
        let (status, body) = (state.respond)(&prompt, previous);
        (StatusCode::from_u16(status).unwrap(), Json(body))
    }

    let state = StubState {
        log: Arc::new(CallLog::default()),
        respond: Arc::new(respond),
    };
    let log = state.log.clone();
    let router = Router::new().route("/models/{call}", post(handler)).with_state(state);
    (serve(router).await, log)
}

/// Gemini-shaped success body.
pub fn generation(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

/// Defaults pointed at the stubs, with a 1ms backoff base.
pub fn test_config(financial: SocketAddr, generative: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.retries.base_delay_ms = 1;
    config.financial.base_url = format!("http://{}/query", financial);
    config.generative.base_url = format!("http://{}", generative);
    config.generative.model = "test-model".to_string();
    config
}

pub fn test_credentials() -> Credentials {
    Credentials {
        financial_api_key: Some(FINANCIAL_KEY.to_string()),
        generative_api_key: Some(GENERATIVE_KEY.to_string()),
    }
}

/// A running proxy. Dropping it does not stop the server; call `stop`.
pub struct RunningProxy {
    pub base_url: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl RunningProxy {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("proxy unreachable")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("proxy unreachable")
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig, credentials: Credentials) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, credentials);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    RunningProxy {
        base_url: format!("http://{}", addr),
        client,
        shutdown,
    }
}
