use crate::utils::error::ClassifierError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从文件路径加载图像，格式只由文件内容判断，与扩展名无关
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let file = File::open(path).map_err(|e| read_error(path, e))?;
        let reader = ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(|e| read_error(path, e))?;

        match reader.format() {
            Some(format) if Self::is_supported_format(format) => {}
            Some(format) => {
                return Err(ClassifierError::UnsupportedFormat(format!("{:?}", format)));
            }
            None => {
                return Err(ClassifierError::InvalidFile(format!(
                    "Unrecognized image data in {}",
                    path.display()
                )));
            }
        }

        let image = reader.decode()?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 当前 image 构建能解码的格式都接受
    pub fn is_supported_format(format: ImageFormat) -> bool {
        format.reading_enabled()
    }

    /// 存储时使用的扩展名
    pub fn extension_for(format: ImageFormat) -> &'static str {
        format.extensions_str().first().copied().unwrap_or("bin")
    }

    fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifierError::InvalidFile(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        Ok(())
    }
}

// 读取已存储文件失败属于预处理阶段，不是存储阶段
fn read_error(path: &Path, err: std::io::Error) -> ClassifierError {
    ClassifierError::Preprocess(format!("Failed to read {}: {}", path.display(), err))
}
