use crate::utils::error::ClassifierError;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// 客户端上传的原始图像
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// 未选择文件时浏览器会提交空文件名和空内容
    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(ClassifierError::InvalidFile("No file selected".to_string()));
        }
        if self.bytes.is_empty() {
            return Err(ClassifierError::InvalidFile(format!(
                "Uploaded file '{}' is empty",
                self.filename
            )));
        }
        Ok(())
    }
}

/// 单个类别的置信度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryConfidence {
    pub category: String,
    pub label: String,
    /// 百分比，保留三位小数
    pub percent: String,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category_index: usize,
    pub category: String,
    pub label: String,
    pub confidences: Vec<CategoryConfidence>,
}

/// 一次请求的完整输出，交给展示层
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationOutcome {
    pub upload_id: Uuid,
    pub filename: String,
    pub result: ClassificationResult,
}

/// 流水线处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Validated,
    Persisted,
    Preprocessed,
    Inferred,
    Resolved,
    Succeeded,
    Failed,
}

/// 流水线处理状态
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub stage: PipelineStage,
    pub message: String,
}

impl PipelineStatus {
    pub fn new(stage: PipelineStage, message: &str) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

/// 重定向到结果页时携带的参数
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsQuery {
    pub upload_id: Option<Uuid>,
    pub result: Option<String>,
    /// conf1, conf2, ... 按类别顺序
    pub confidences: Vec<String>,
}

impl ResultsQuery {
    pub fn from_outcome(outcome: &ClassificationOutcome, report_confidences: bool) -> Self {
        let confidences = if report_confidences {
            outcome
                .result
                .confidences
                .iter()
                .map(|c| c.percent.clone())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            upload_id: Some(outcome.upload_id),
            result: Some(outcome.result.label.clone()),
            confidences,
        }
    }

    pub fn to_query_string(&self) -> Result<String> {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(self.confidences.len() + 2);
        if let Some(id) = self.upload_id {
            pairs.push(("upload_id".to_string(), id.to_string()));
        }
        if let Some(result) = &self.result {
            pairs.push(("result".to_string(), result.clone()));
        }
        for (i, percent) in self.confidences.iter().enumerate() {
            pairs.push((format!("conf{}", i + 1), percent.clone()));
        }

        serde_urlencoded::to_string(&pairs).map_err(|e| {
            ClassifierError::Internal(format!("Failed to encode results query: {}", e))
        })
    }

    /// 解析查询参数，confN 需连续出现
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut confidences = Vec::new();
        while let Some(value) = params.get(&format!("conf{}", confidences.len() + 1)) {
            confidences.push(value.clone());
        }

        Self {
            upload_id: params.get("upload_id").and_then(|v| Uuid::parse_str(v).ok()),
            result: params.get("result").cloned(),
            confidences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_filename_is_invalid() {
        let upload = UploadedImage::new("", vec![1, 2, 3]);
        assert!(matches!(upload.validate(), Err(ClassifierError::InvalidFile(_))));
    }

    #[test]
    fn empty_bytes_are_invalid() {
        let upload = UploadedImage::new("scan.png", Vec::new());
        assert!(matches!(upload.validate(), Err(ClassifierError::InvalidFile(_))));
    }

    #[test]
    fn query_string_carries_result_and_confidences() {
        let query = ResultsQuery {
            upload_id: Some(Uuid::nil()),
            result: Some("Pituitary Tumor".to_string()),
            confidences: vec!["70.000".into(), "20.000".into(), "10.000".into()],
        };

        let encoded = query.to_query_string().unwrap();
        assert_eq!(
            encoded,
            "upload_id=00000000-0000-0000-0000-000000000000&result=Pituitary+Tumor&conf1=70.000&conf2=20.000&conf3=10.000"
        );

        let params: HashMap<String, String> = serde_urlencoded::from_str(&encoded).unwrap();
        assert_eq!(ResultsQuery::from_params(&params), query);
    }

    #[test]
    fn confidences_stop_at_first_gap() {
        let params: HashMap<String, String> =
            serde_urlencoded::from_str("result=Glioma&conf1=1.000&conf3=3.000").unwrap();
        let query = ResultsQuery::from_params(&params);

        assert_eq!(query.result.as_deref(), Some("Glioma"));
        assert_eq!(query.confidences, vec!["1.000".to_string()]);
        assert_eq!(query.upload_id, None);
    }
}
