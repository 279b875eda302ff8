use crate::{
    pipeline::{ClassificationOutcome, PipelineStatus, ResultFormatter, ResultsQuery},
    web::{extractors::FileUpload, AppState},
    Result,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Redirect},
};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// 结果页展示数据
#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<Uuid>,
    pub result: Option<String>,
    pub confidences: Vec<ConfidenceView>,
}

#[derive(Debug, Serialize)]
pub struct ConfidenceView {
    pub category: String,
    pub percent: String,
}

/// 图像上传分类处理器，成功后重定向到结果页
pub async fn predict_handler(
    State(state): State<AppState>,
    FileUpload(upload): FileUpload,
) -> Result<Redirect> {
    let request_id = Uuid::new_v4().to_string();

    tracing::info!(
        "Processing predict request: request_id={}, has_file={}",
        request_id,
        upload.is_some()
    );

    // 开发模式下输出各阶段进度
    let status_tx = if state.dev_mode {
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<PipelineStatus>();
        let request_id = request_id.clone();
        tokio::spawn(async move {
            while let Some(status) = status_rx.recv().await {
                tracing::debug!(
                    "Pipeline progress [{}]: {:?} - {}",
                    request_id,
                    status.stage,
                    status.message
                );
            }
        });
        Some(status_tx)
    } else {
        None
    };

    let outcome = state.pipeline.process(upload, status_tx).await?;
    let location = results_location(&outcome, state.pipeline.config().report_confidences)?;

    tracing::info!(
        "Predict request completed: request_id={}, upload_id={}",
        request_id,
        outcome.upload_id
    );

    Ok(Redirect::to(&location))
}

/// 构造结果页地址：`/results/<filename>?upload_id=..&result=..&conf1=..`
pub fn results_location(
    outcome: &ClassificationOutcome,
    report_confidences: bool,
) -> Result<String> {
    let query = ResultsQuery::from_outcome(outcome, report_confidences).to_query_string()?;
    Ok(format!(
        "/results/{}?{}",
        urlencoding::encode(&outcome.filename),
        query
    ))
}

/// 结果页处理器
pub async fn results_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ResultsView> {
    let query = ResultsQuery::from_params(&params);
    let categories = &state.pipeline.config().categories;

    let confidences = categories
        .iter()
        .zip(query.confidences)
        .map(|(category, percent)| ConfidenceView {
            category: ResultFormatter::format_label(category),
            percent,
        })
        .collect();

    Json(ResultsView {
        filename,
        upload_id: query.upload_id,
        result: query.result,
        confidences,
    })
}
