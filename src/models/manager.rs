use crate::models::{ClassifierModel, OnnxClassifier};
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 持有已加载模型的管理器，进程内只初始化一次
pub struct ModelManager {
    classifier: Arc<dyn ClassifierModel>,
    intra_threads: usize,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器，重复调用返回同一实例
    pub fn init(config: &Config) -> Result<Arc<ModelManager>> {
        MODEL_MANAGER
            .get_or_try_init(|| -> Result<Arc<ModelManager>> {
                tracing::info!("Initializing model manager...");

                let classifier = OnnxClassifier::load(
                    &config.model_path,
                    config.pipeline_config.target_size,
                    config.pipeline_config.categories.len(),
                    &config.onnx_config,
                )?;

                tracing::info!("Model manager initialized successfully");
                Ok(Arc::new(ModelManager {
                    classifier: Arc::new(classifier),
                    intra_threads: config.onnx_config.intra_threads,
                }))
            })
            .cloned()
    }

    /// 使用现成的模型构造，不经过全局状态
    pub fn with_model(classifier: Arc<dyn ClassifierModel>) -> Self {
        Self {
            classifier,
            intra_threads: 0,
        }
    }

    pub fn classifier(&self) -> Arc<dyn ClassifierModel> {
        Arc::clone(&self.classifier)
    }

    /// 模型健康检查：输入输出规格是否与配置一致
    pub fn health_check(&self, expected_classes: usize) -> Result<()> {
        tracing::debug!("Performing model health check...");

        let actual = self.classifier.num_classes();
        if actual != expected_classes {
            return Err(ClassifierError::ModelLoad(format!(
                "Model '{}' reports {} classes, {} categories configured",
                self.classifier.name(),
                actual,
                expected_classes
            )));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    pub fn get_stats(&self) -> ModelStats {
        let (width, height) = self.classifier.input_size();
        ModelStats {
            model_name: self.classifier.name().to_string(),
            input_width: width,
            input_height: height,
            num_classes: self.classifier.num_classes(),
            intra_threads: self.intra_threads,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_name: String,
    pub input_width: u32,
    pub input_height: u32,
    pub num_classes: usize,
    pub intra_threads: usize,
}
