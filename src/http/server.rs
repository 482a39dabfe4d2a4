//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build provider clients from config + credentials
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS, metrics)
//! - Serve until shutdown

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Credentials, ProxyConfig, SecurityConfig};
use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::ApiError;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::providers::{FinancialClient, GenerativeClient};
use crate::report::ReportAggregator;
use crate::resilience::RetryPolicy;

const REQUEST_TIMED_OUT: &str = "Request timed out before the providers answered.";
const BODY_TOO_LARGE: &str = "Request body is too large.";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub financial: FinancialClient,
    pub generative: GenerativeClient,
    pub aggregator: ReportAggregator,
}

impl AppState {
    /// Build both provider clients. Each receives only its own credential.
    pub fn new(config: &ProxyConfig, credentials: Credentials) -> Self {
        let retry_policy = RetryPolicy::from(&config.retries);
        let financial = FinancialClient::new(
            &config.financial,
            retry_policy,
            credentials.financial_api_key,
        );
        let generative = GenerativeClient::new(
            &config.generative,
            retry_policy,
            credentials.generative_api_key,
        );

        Self {
            aggregator: ReportAggregator::new(financial.clone()),
            financial,
            generative,
        }
    }
}

/// HTTP server for the report proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and secrets.
    pub fn new(config: ProxyConfig, credentials: Credentials) -> Self {
        let state = AppState::new(&config, credentials);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/alpha-vantage/search/{keyword}", get(handlers::search_symbols))
            .route("/api/alpha-vantage/overview/{ticker}", get(handlers::overview))
            .route("/api/alpha-vantage/global-quote/{ticker}", get(handlers::global_quote))
            .route("/api/alpha-vantage/income-statement/{ticker}", get(handlers::income_statement))
            .route("/api/alpha-vantage/earnings/{ticker}", get(handlers::earnings))
            .route("/api/alpha-vantage/balance-sheet/{ticker}", get(handlers::balance_sheet))
            .route("/api/alpha-vantage/cash-flow/{ticker}", get(handlers::cash_flow))
            .route("/api/alpha-vantage/full-report/{ticker}", get(handlers::full_report))
            .route(
                "/api/gemini/generate-report-sections",
                post(handlers::generate_report_sections),
            )
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state);

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(json_error_body))
            // Timeout must sit inside the body limit: it needs a `Default` response body.
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.security));

        api.layer(layers)
    }

    /// Run the server, accepting connections on the given listener until a
    /// signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with all layers, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if security.cors_allow_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}

/// Give the bodiless 408 and 413 produced by the timeout and body-limit
/// layers the same `{"error": ...}` shape as handler errors. Handlers never
/// return either status themselves.
async fn json_error_body(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let message = match response.status() {
        StatusCode::REQUEST_TIMEOUT => REQUEST_TIMED_OUT,
        StatusCode::PAYLOAD_TOO_LARGE => BODY_TOO_LARGE,
        _ => return response,
    };

    let (parts, _) = response.into_parts();
    let mut mapped = ApiError::new(parts.status, message).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            mapped.headers_mut().append(name.clone(), value.clone());
        }
    }
    mapped
}

/// Record count and latency per matched route.
async fn track_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(route, response.status().as_u16(), start_time);
    response
}
