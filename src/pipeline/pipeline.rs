use crate::{
    config::PipelineConfig,
    image::ImagePreprocessor,
    models::{ClassifierModel, PredictionVector},
    pipeline::{
        ClassificationOutcome, ClassificationResult, PipelineStage, PipelineStatus, ResultFormatter,
        UploadedImage,
    },
    storage::{StoredUpload, UploadStore},
    utils::error::ClassifierError,
    Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

pub type StatusSender = Option<mpsc::UnboundedSender<PipelineStatus>>;

/// 上传 → 存储 → 预处理 → 推理 → 结果
pub struct ClassificationPipeline {
    model: Arc<dyn ClassifierModel>,
    store: UploadStore,
    config: PipelineConfig,
}

impl ClassificationPipeline {
    pub fn new(
        model: Arc<dyn ClassifierModel>,
        store: UploadStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            model,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 处理一次上传；`upload` 为 None 表示请求中没有 file 字段
    pub async fn process(
        &self,
        upload: Option<UploadedImage>,
        status_tx: StatusSender,
    ) -> Result<ClassificationOutcome> {
        let start_time = Instant::now();
        send_status(&status_tx, PipelineStage::Received, "Upload received");

        let upload = upload.ok_or(ClassifierError::MissingFilePart)?;
        if let Err(e) = upload.validate() {
            send_status(&status_tx, PipelineStage::Failed, "Validation failed");
            return Err(e);
        }
        send_status(&status_tx, PipelineStage::Validated, "Upload validated");

        let stored = match self.store.persist(&upload).await {
            Ok(stored) => stored,
            Err(e) => {
                send_status(&status_tx, PipelineStage::Failed, "Failed to store upload");
                return Err(e);
            }
        };
        send_status(&status_tx, PipelineStage::Persisted, "Upload stored");

        let result = match self.classify_stored(&stored, &status_tx).await {
            Ok(result) => result,
            Err(e) => {
                send_status(&status_tx, PipelineStage::Failed, "Classification failed");
                if let Err(remove_err) = self.store.remove(&stored).await {
                    tracing::warn!(
                        "Failed to remove upload {} after error: {}",
                        stored.path.display(),
                        remove_err
                    );
                }
                return Err(e);
            }
        };

        let message = format!("Classified as {}", result.label);
        send_status(&status_tx, PipelineStage::Succeeded, &message);

        tracing::info!(
            "Classification completed: upload_id={}, result={}, time={:.3}s",
            stored.id,
            result.label,
            start_time.elapsed().as_secs_f32()
        );

        Ok(ClassificationOutcome {
            upload_id: stored.id,
            filename: stored.original_filename,
            result,
        })
    }

    async fn classify_stored(
        &self,
        stored: &StoredUpload,
        status_tx: &StatusSender,
    ) -> Result<ClassificationResult> {
        let prediction = self.predict_file(stored, status_tx).await?;
        let result = ResultFormatter::format_result(&prediction, &self.config.categories)?;
        send_status(status_tx, PipelineStage::Resolved, "Result resolved");
        Ok(result)
    }

    /// 预处理与推理都是阻塞操作，放到阻塞线程池执行
    async fn predict_file(
        &self,
        stored: &StoredUpload,
        status_tx: &StatusSender,
    ) -> Result<PredictionVector> {
        let model = Arc::clone(&self.model);
        let path = stored.path.clone();
        let target_size = self.config.target_size;
        let status_tx = status_tx.clone();

        tokio::task::spawn_blocking(move || {
            let preprocess_start = Instant::now();
            let tensor = ImagePreprocessor::preprocess(&path, target_size)?;
            let preprocess_time = preprocess_start.elapsed();
            send_status(&status_tx, PipelineStage::Preprocessed, "Image preprocessed");

            let inference_start = Instant::now();
            let prediction = model.predict(&tensor)?;
            send_status(&status_tx, PipelineStage::Inferred, "Inference finished");

            tracing::debug!(
                "Predicted with '{}': scores={:?}, preprocess={:.3}s, inference={:.3}s",
                model.name(),
                prediction.scores(),
                preprocess_time.as_secs_f32(),
                inference_start.elapsed().as_secs_f32()
            );

            Ok(prediction)
        })
        .await
        .map_err(|e| ClassifierError::Internal(format!("Classification task failed: {}", e)))?
    }
}

fn send_status(status_tx: &StatusSender, stage: PipelineStage, message: &str) {
    tracing::debug!("Pipeline stage {:?}: {}", stage, message);
    if let Some(tx) = status_tx {
        let _ = tx.send(PipelineStatus::new(stage, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageTensor;
    use image::{ImageFormat, Rgb, RgbImage};
    use parking_lot::Mutex;

    struct RecordingModel {
        scores: Vec<f32>,
        seen_shapes: Mutex<Vec<Vec<usize>>>,
    }

    impl ClassifierModel for RecordingModel {
        fn predict(&self, tensor: &ImageTensor) -> Result<PredictionVector> {
            self.seen_shapes.lock().push(tensor.shape().to_vec());
            Ok(PredictionVector::new(self.scores.clone()))
        }

        fn input_size(&self) -> (u32, u32) {
            (512, 512)
        }

        fn num_classes(&self) -> usize {
            self.scores.len()
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        RgbImage::from_pixel(40, 30, Rgb([100, 50, 25]))
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn build_pipeline(
        dir: &std::path::Path,
        scores: Vec<f32>,
    ) -> (ClassificationPipeline, Arc<RecordingModel>) {
        let model = Arc::new(RecordingModel {
            scores,
            seen_shapes: Mutex::new(Vec::new()),
        });
        let pipeline = ClassificationPipeline::new(
            model.clone(),
            UploadStore::new(dir),
            PipelineConfig::default(),
        );
        (pipeline, model)
    }

    #[tokio::test]
    async fn classifies_upload_and_keeps_filename() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, model) = build_pipeline(dir.path(), vec![0.7, 0.2, 0.1]);

        let outcome = pipeline
            .process(Some(UploadedImage::new("patient 7.png", png_bytes())), None)
            .await
            .unwrap();

        assert_eq!(outcome.filename, "patient 7.png");
        assert_eq!(outcome.result.label, "Glioma");
        assert_eq!(model.seen_shapes.lock().as_slice(), &[vec![1, 512, 512, 3]]);
    }

    #[tokio::test]
    async fn missing_upload_is_missing_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = build_pipeline(dir.path(), vec![0.7, 0.2, 0.1]);

        let err = pipeline.process(None, None).await.unwrap_err();
        assert!(matches!(err, ClassifierError::MissingFilePart));
    }

    #[tokio::test]
    async fn corrupted_upload_fails_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, model) = build_pipeline(dir.path(), vec![0.7, 0.2, 0.1]);

        let err = pipeline
            .process(Some(UploadedImage::new("scan.png", b"broken".to_vec())), None)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(model.seen_shapes.lock().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reports_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = build_pipeline(dir.path(), vec![0.1, 0.1, 0.8]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        pipeline
            .process(Some(UploadedImage::new("scan.png", png_bytes())), Some(tx))
            .await
            .unwrap();

        let mut stages = Vec::new();
        while let Ok(status) = rx.try_recv() {
            stages.push(status.stage);
        }
        assert_eq!(
            stages,
            vec![
                PipelineStage::Received,
                PipelineStage::Validated,
                PipelineStage::Persisted,
                PipelineStage::Preprocessed,
                PipelineStage::Inferred,
                PipelineStage::Resolved,
                PipelineStage::Succeeded,
            ]
        );
    }
}
