pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    config::{PipelineConfig, ServerConfig},
    models::ModelManager,
    pipeline::ClassificationPipeline,
    storage::UploadStore,
    utils::error::ClassifierError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelManager>,
    pub pipeline: Arc<ClassificationPipeline>,
    pub dev_mode: bool,
}

impl AppState {
    pub fn new(
        models: Arc<ModelManager>,
        store: UploadStore,
        pipeline_config: PipelineConfig,
        dev_mode: bool,
    ) -> Self {
        let pipeline = ClassificationPipeline::new(models.classifier(), store, pipeline_config);
        Self {
            models,
            pipeline: Arc::new(pipeline),
            dev_mode,
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载一次模型
    let models = ModelManager::init(&config)?;
    models.health_check(config.pipeline_config.categories.len())?;

    let store = UploadStore::new(&config.upload_dir);
    store.ensure_dir().await?;

    let state = AppState::new(
        models,
        store,
        config.pipeline_config.clone(),
        config.dev_mode,
    );
    let app = create_app(state, &config.server_config);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifierError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /                    - Landing page");
    tracing::info!("  GET  /upload              - Upload form");
    tracing::info!("  POST /predict             - Multipart image classification");
    tracing::info!("  GET  /results/:filename   - Classification result");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/info           - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifierError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifierError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState, server_config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(ui::index_handler))
        .route("/upload", get(ui::upload_handler))
        .route("/predict", post(handlers::predict_handler))
        .route("/results/:filename", get(handlers::results_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::request_logging))
        // multipart 默认 2MB 限制由 RequestBodyLimitLayer 取代
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state
        .models
        .health_check(state.pipeline.config().categories.len())?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let pipeline_config = state.pipeline.config();
    let (width, height) = pipeline_config.target_size;

    Json(json!({
        "service": "Brain Tumor Classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": state.models.get_stats(),
        "pipeline": {
            "target_size": [width, height],
            "categories": pipeline_config.categories,
            "report_confidences": pipeline_config.report_confidences
        }
    }))
}
