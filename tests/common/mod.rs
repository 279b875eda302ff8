#![allow(dead_code)]

use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use std::sync::Arc;
use tempfile::TempDir;
use tumor_classifier::{
    config::{PipelineConfig, ServerConfig},
    image::ImageTensor,
    models::{ClassifierModel, ModelManager, PredictionVector},
    storage::UploadStore,
    web::{create_app, AppState},
    ClassifierError, Result,
};

pub const BOUNDARY: &str = "----classifier-test-boundary";

/// 返回固定分数的模型，检查输入形状
pub struct StubModel {
    pub scores: Vec<f32>,
}

impl ClassifierModel for StubModel {
    fn predict(&self, tensor: &ImageTensor) -> Result<PredictionVector> {
        if tensor.shape() != [1usize, 512, 512, 3].as_slice() {
            return Err(ClassifierError::ShapeMismatch {
                expected: vec![1, 512, 512, 3],
                actual: tensor.shape().to_vec(),
            });
        }
        Ok(PredictionVector::new(self.scores.clone()))
    }

    fn input_size(&self) -> (u32, u32) {
        (512, 512)
    }

    fn num_classes(&self) -> usize {
        self.scores.len()
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn create_test_app(scores: Vec<f32>, pipeline_config: PipelineConfig) -> (Router, TempDir) {
    let upload_dir = TempDir::new().unwrap();
    let models = Arc::new(ModelManager::with_model(Arc::new(StubModel { scores })));
    let state = AppState::new(
        models,
        UploadStore::new(upload_dir.path()),
        pipeline_config,
        false,
    );
    let server_config = ServerConfig {
        request_timeout: 30,
        max_request_size: 10 * 1024 * 1024,
    };

    (create_app(state, &server_config), upload_dir)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 77]))
        .write_to(&mut cursor, ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

/// 单个字段的 multipart 请求体
pub fn multipart_body(field_name: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(filename) => {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field_name, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        }
        None => {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field_name)
                    .as_bytes(),
            );
        }
    }
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
