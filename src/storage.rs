use crate::image::ImageLoader;
use crate::pipeline::UploadedImage;
use crate::Result;
use std::path::PathBuf;
use uuid::Uuid;

/// 已写入磁盘的上传文件
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: Uuid,
    pub path: PathBuf,
    /// 客户端提供的文件名，仅用于展示
    pub original_filename: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// 存储文件名为 `<uuid>.<ext>`，扩展名由文件内容判断
    pub fn storage_key(id: Uuid, bytes: &[u8]) -> String {
        let extension = ImageLoader::detect_format(bytes)
            .map(ImageLoader::extension_for)
            .unwrap_or("bin");
        format!("{}.{}", id, extension)
    }

    pub async fn persist(&self, upload: &UploadedImage) -> Result<StoredUpload> {
        let id = Uuid::new_v4();
        let path = self.root.join(Self::storage_key(id, &upload.bytes));

        tokio::fs::write(&path, &upload.bytes).await?;

        tracing::debug!(
            "Stored upload '{}' ({} bytes) as {}",
            upload.filename,
            upload.bytes.len(),
            path.display()
        );

        Ok(StoredUpload {
            id,
            path,
            original_filename: upload.filename.clone(),
        })
    }

    /// 删除已存储的文件，文件不存在时忽略
    pub async fn remove(&self, stored: &StoredUpload) -> Result<()> {
        match tokio::fs::remove_file(&stored.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
