pub mod chat_routes;
pub mod company_routes;
pub mod config;
pub mod request_id;

use anyhow::Context;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chat_assistant::ChatAssistant;
use llm_client::CompletionProvider;
use metrics_db::{MetricStore, MetricsDb};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::ServerConfig;

const DEFAULT_LOG_FILTER: &str = "api_server=info,chat_assistant=info,fundamental_scoring=info,tower_http=info";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MetricStore>,
    pub assistant: Arc<ChatAssistant>,
}

impl AppState {
    pub fn new(store: Arc<MetricStore>, llm: Arc<dyn CompletionProvider>, default_year: i32) -> Self {
        let assistant = ChatAssistant::new(store.clone(), llm).with_default_year(default_year);
        Self {
            store,
            assistant: Arc::new(assistant),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as an `ApiResponse` with `error` set.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::warn!("Request rejected ({}): {:#}", self.status, self.error);
        }
        (self.status, Json(ApiResponse::<()>::error(self.error.to_string()))).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "Fintech Chatbot API",
    })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(health))
        .merge(chat_routes::chat_routes())
        .merge(company_routes::company_routes())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Model: {}", config.gemini_model);
    tracing::info!("  Default year: {}", config.default_year);

    let db = MetricsDb::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    let store = Arc::new(MetricStore::new(db));

    let llm = config.llm_config().build_gemini()?;
    tracing::info!("Completion backend: {} ({})", llm.backend_name(), llm.model());

    let state = AppState::new(store, Arc::new(llm), config.default_year);
    let app = build_router(state, &config.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Fintech Chatbot API listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_client::LlmResult;
    use metrics_core::RawValue;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct EchoLlm;

    #[async_trait]
    impl CompletionProvider for EchoLlm {
        async fn complete(&self, _prompt: &str) -> LlmResult<String> {
            Ok("Ask me about company metrics.".to_string())
        }

        fn backend_name(&self) -> &'static str {
            "echo"
        }
    }

    async fn test_app(allowed_origins: &[String]) -> Router {
        let store = MetricStore::new(MetricsDb::new("sqlite::memory:").await.unwrap());
        for (company, year, metric, value) in [
            ("Acme", 2022, "ROE", 11.0),
            ("Acme", 2023, "ROE", 12.5),
            ("Beta", 2023, "ROE", 8.0),
            ("Beta", 2023, "Debt Ratio", 0.4),
        ] {
            store.record(company, year, metric, &RawValue::Number(value)).await.unwrap();
        }

        let state = AppState::new(Arc::new(store), Arc::new(EchoLlm), 2023);
        build_router(state, allowed_origins)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = send(test_app(&[]).await, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "service": "Fintech Chatbot API"}));
    }

    #[tokio::test]
    async fn test_chat_routes_to_handlers() {
        let (status, _, body) = send(test_app(&[]).await, chat(r#"{"message": "list companies"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "📋 Companies (showing first 2):\n- Acme\n- Beta");

        let (_, _, body) = send(test_app(&[]).await, chat(r#"{"message": "top companies"}"#)).await;
        assert_eq!(body["response"], "📊 Top 10 Companies (2023):\n- Acme: 1.0000\n- Beta: 0.5000");
    }

    #[tokio::test]
    async fn test_chat_blank_and_fallback() {
        let (_, _, body) = send(test_app(&[]).await, chat("{}")).await;
        assert_eq!(body["response"], "Please type something.");

        let (status, _, body) = send(test_app(&[]).await, chat(r#"{"message": null}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Please type something.");

        let (_, _, body) = send(test_app(&[]).await, chat(r#"{"message": "hello"}"#)).await;
        assert_eq!(body["response"], "Ask me about company metrics.");
    }

    #[tokio::test]
    async fn test_companies_envelope() {
        let (status, _, body) = send(test_app(&[]).await, get("/api/companies")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": ["Acme", "Beta"]}));
    }

    #[tokio::test]
    async fn test_metric_history() {
        let (status, _, body) = send(test_app(&[]).await, get("/api/company/Acme/metric/ROE")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["values"][0]["fiscal_year"], 2023);
        assert_eq!(body["data"]["values"][1]["fiscal_year"], 2022);

        let (status, _, body) = send(test_app(&[]).await, get("/api/company/Globex/metric/ROE")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        // Both names exist but the pair has no values.
        let (status, _, _) = send(test_app(&[]).await, get("/api/company/Acme/metric/Debt%20Ratio")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_year_scores() {
        let (status, _, body) = send(test_app(&[]).await, get("/api/scores/2023")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        // Only Beta reports a debt ratio, so that column scores 1.0 for both.
        assert_eq!(rows[0]["name"], "Acme");
        assert_eq!(rows[0]["score"], 1.0);
        assert_eq!(rows[1]["score"], 0.5);
        assert_eq!(rows[1]["rank"], 2);

        let (_, _, body) = send(test_app(&[]).await, get("/api/scores/1999")).await;
        assert_eq!(body["data"]["rows"], json!([]));
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(test_app(&[]).await, request).await;
        assert_eq!(headers["x-request-id"], "abc-123");

        let (_, headers, _) = send(test_app(&[]).await, get("/")).await;
        assert_eq!(headers["x-request-id"].len(), 36);
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let app = test_app(&["http://localhost:3000".to_string()]).await;
        let request = Request::builder()
            .uri("/")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(app, request).await;
        assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");

        let request = Request::builder()
            .uri("/")
            .header("origin", "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(test_app(&["http://localhost:3000".to_string()]).await, request).await;
        assert!(!headers.contains_key("access-control-allow-origin"));
    }
}
