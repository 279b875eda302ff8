use crate::pipeline::UploadedImage;
use crate::utils::error::ClassifierError;
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};

/// 上传表单中文件字段的名称
pub const FILE_FIELD: &str = "file";

/// 从 multipart 请求中提取 `file` 字段
///
/// 字段缺失或请求不是 multipart 时得到 `None`，由流水线转换为 400。
pub struct FileUpload(pub Option<UploadedImage>);

#[async_trait]
impl<S> FromRequest<S> for FileUpload
where
    S: Send + Sync,
{
    type Rejection = ClassifierError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(multipart) => multipart,
            Err(rejection) => {
                tracing::debug!("Request is not multipart: {}", rejection);
                return Ok(FileUpload(None));
            }
        };

        let mut upload = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ClassifierError::InvalidFile(format!("Failed to read multipart field: {}", e))
        })? {
            let field_name = field.name().unwrap_or("unknown").to_string();
            if field_name != FILE_FIELD || upload.is_some() {
                tracing::debug!("Ignoring field: {}", field_name);
                continue;
            }

            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(|e| {
                ClassifierError::InvalidFile(format!("Failed to read file data: {}", e))
            })?;

            tracing::debug!("Received file '{}': {} bytes", filename, data.len());
            upload = Some(UploadedImage::new(filename, data.to_vec()));
        }

        Ok(FileUpload(upload))
    }
}
