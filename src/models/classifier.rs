use crate::config::OnnxConfig;
use crate::image::ImageTensor;
use crate::utils::error::ClassifierError;
use crate::Result;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;

/// 模型输出的各类别概率，下标与类别列表一一对应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionVector(Vec<f32>);

impl PredictionVector {
    pub fn new(scores: Vec<f32>) -> Self {
        Self(scores)
    }

    pub fn scores(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 最大值下标，并列时取第一个；NaN 不参与比较
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in self.0.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, max)) if score <= max => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// 推理模型接口
pub trait ClassifierModel: Send + Sync {
    /// 对单张图像张量推理，返回各类别分数
    fn predict(&self, tensor: &ImageTensor) -> Result<PredictionVector>;

    /// 期望的输入尺寸 (宽, 高)
    fn input_size(&self) -> (u32, u32);

    /// 输出类别数
    fn num_classes(&self) -> usize;

    fn name(&self) -> &str;
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    name: String,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    input_size: (u32, u32),
    num_classes: usize,
}

impl OnnxClassifier {
    pub fn load(
        model_path: &Path,
        input_size: (u32, u32),
        num_classes: usize,
        onnx_config: &OnnxConfig,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(model_path, e))?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        Ok(Self {
            session: Mutex::new(session),
            name,
            input_name,
            output_name,
            input_size,
            num_classes,
        })
    }

    fn check_shape(&self, tensor: &ImageTensor) -> Result<()> {
        let (width, height) = self.input_size;
        let expected = vec![1, height as usize, width as usize, 3];
        if tensor.shape() != expected.as_slice() {
            return Err(ClassifierError::ShapeMismatch {
                expected,
                actual: tensor.shape().to_vec(),
            });
        }
        Ok(())
    }
}

fn load_error(model_path: &Path, err: impl std::fmt::Display) -> ClassifierError {
    ClassifierError::ModelLoad(format!("{}: {}", model_path.display(), err))
}

impl ClassifierModel for OnnxClassifier {
    fn predict(&self, tensor: &ImageTensor) -> Result<PredictionVector> {
        self.check_shape(tensor)?;

        let input_tensor = Tensor::from_array(tensor.view().to_owned())?;
        let scores: Vec<f32> = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.iter().copied().collect(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ClassifierError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        if scores.len() != self.num_classes {
            return Err(ClassifierError::Inference(format!(
                "Expected {} class scores, model returned {}",
                self.num_classes,
                scores.len()
            )));
        }

        Ok(PredictionVector::new(scores))
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn name(&self) -> &str {
        &self.name
    }
}
