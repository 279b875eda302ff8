use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("No file part in request")]
    MissingFilePart,

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifierError {
    /// 只有缺少 file 字段是客户端错误，其余一律 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifierError::MissingFilePart => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifierError::MissingFilePart => "MISSING_FILE_PART",
            ClassifierError::InvalidFile(_) => "INVALID_FILE",
            ClassifierError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ClassifierError::Preprocess(_) => "PREPROCESS_ERROR",
            ClassifierError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            ClassifierError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ClassifierError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            ClassifierError::Inference(_) => "INFERENCE_ERROR",
            ClassifierError::Ort(_) => "ORT_ERROR",
            ClassifierError::Io(_) => "IO_ERROR",
            ClassifierError::Config(_) => "CONFIG_ERROR",
            ClassifierError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回给客户端的消息，不包含内部细节
    pub fn public_message(&self) -> &'static str {
        match self {
            ClassifierError::MissingFilePart => "No file part",
            ClassifierError::InvalidFile(_) => "Invalid or empty file",
            ClassifierError::UnsupportedFormat(_) => "Unsupported image format",
            ClassifierError::Preprocess(_) | ClassifierError::ImageDecode(_) => {
                "Failed to process image"
            }
            ClassifierError::ModelLoad(_) => "Model unavailable",
            ClassifierError::ShapeMismatch { .. }
            | ClassifierError::Inference(_)
            | ClassifierError::Ort(_) => "Model inference failed",
            ClassifierError::Io(_) => "Failed to store upload",
            ClassifierError::Config(_) | ClassifierError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ClassifierError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": self.public_message(),
            "code": self.error_code(),
        });

        if status.is_server_error() {
            tracing::error!("Error processing request: {} ({})", self, status);
        } else {
            tracing::warn!("Rejected request: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
