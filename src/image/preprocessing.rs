use crate::image::ImageLoader;
use crate::utils::error::ClassifierError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array4, ArrayView4};
use std::path::Path;

/// 模型输入张量，形状固定为 (1, H, W, 3)，RGB，取值 [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn from_array(array: Array4<f32>) -> Result<Self> {
        let shape = array.shape();
        if shape[0] != 1 || shape[3] != 3 {
            return Err(ClassifierError::ShapeMismatch {
                expected: vec![1, shape[1], shape[2], 3],
                actual: shape.to_vec(),
            });
        }
        Ok(Self(array))
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// (宽, 高)
    pub fn size(&self) -> (u32, u32) {
        (self.0.shape()[2] as u32, self.0.shape()[1] as u32)
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 读取图像文件并转换为模型输入张量
    pub fn preprocess(path: &Path, target_size: (u32, u32)) -> Result<ImageTensor> {
        let image = ImageLoader::from_path(path)?;
        Self::preprocess_image(&image, target_size)
    }

    /// RGB 转换 → Lanczos 缩放 → 归一化 → 增加 batch 维度
    pub fn preprocess_image(image: &DynamicImage, target_size: (u32, u32)) -> Result<ImageTensor> {
        let (width, height) = target_size;
        if width == 0 || height == 0 {
            return Err(ClassifierError::Config(format!(
                "Invalid target size {}x{}",
                width, height
            )));
        }

        // 丢弃 alpha，灰度扩展为三通道
        let rgb = image.to_rgb8();
        let resized = image::imageops::resize(&rgb, width, height, FilterType::Lanczos3);

        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();

        let array = Array4::from_shape_vec((1, height as usize, width as usize, 3), data)
            .map_err(|e| ClassifierError::Preprocess(format!("Failed to build tensor: {}", e)))?;

        tracing::debug!("Preprocessed image to tensor shape {:?}", array.shape());

        ImageTensor::from_array(array)
    }
}
