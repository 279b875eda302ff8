use crate::models::PredictionVector;
use crate::pipeline::{CategoryConfidence, ClassificationResult};
use crate::utils::error::ClassifierError;
use crate::Result;

/// 结果格式化器
pub struct ResultFormatter;

impl ResultFormatter {
    /// 由模型输出得到最终分类结果
    pub fn format_result(
        prediction: &PredictionVector,
        categories: &[String],
    ) -> Result<ClassificationResult> {
        if prediction.len() != categories.len() {
            return Err(ClassifierError::Inference(format!(
                "Prediction has {} scores for {} categories",
                prediction.len(),
                categories.len()
            )));
        }

        let category_index = prediction.argmax().ok_or_else(|| {
            ClassifierError::Inference("Prediction contains no comparable scores".to_string())
        })?;

        let confidences = categories
            .iter()
            .zip(prediction.scores())
            .map(|(category, &score)| CategoryConfidence {
                category: category.clone(),
                label: Self::format_label(category),
                percent: Self::format_percentage(score),
            })
            .collect();

        let category = categories[category_index].clone();
        let label = Self::format_label(&category);

        Ok(ClassificationResult {
            category_index,
            category,
            label,
            confidences,
        })
    }

    /// `pituitary_tumor` -> `Pituitary Tumor`
    pub fn format_label(category: &str) -> String {
        let mut label = String::with_capacity(category.len());
        let mut word_start = true;

        for ch in category.chars() {
            let ch = if ch == '_' { ' ' } else { ch };
            if ch.is_alphabetic() {
                if word_start {
                    label.extend(ch.to_uppercase());
                } else {
                    label.extend(ch.to_lowercase());
                }
                word_start = false;
            } else {
                label.push(ch);
                word_start = true;
            }
        }

        label
    }

    /// 概率转百分比字符串，保留三位小数
    pub fn format_percentage(score: f32) -> String {
        format!("{:.3}", score as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CATEGORIES;

    fn categories() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn resolves_argmax_and_percentages() {
        let prediction = PredictionVector::new(vec![0.7, 0.2, 0.1]);
        let result = ResultFormatter::format_result(&prediction, &categories()).unwrap();

        assert_eq!(result.category_index, 0);
        assert_eq!(result.label, "Glioma");
        let percents: Vec<&str> = result.confidences.iter().map(|c| c.percent.as_str()).collect();
        assert_eq!(percents, vec!["70.000", "20.000", "10.000"]);
    }

    #[test]
    fn winning_pituitary_label() {
        let prediction = PredictionVector::new(vec![0.05, 0.15, 0.8]);
        let result = ResultFormatter::format_result(&prediction, &categories()).unwrap();

        assert_eq!(result.category, "pituitary_tumor");
        assert_eq!(result.label, "Pituitary Tumor");
    }

    #[test]
    fn formats_labels_like_title_case() {
        assert_eq!(ResultFormatter::format_label("pituitary_tumor"), "Pituitary Tumor");
        assert_eq!(ResultFormatter::format_label("glioma"), "Glioma");
        assert_eq!(ResultFormatter::format_label("MENINGIOMA"), "Meningioma");
        assert_eq!(ResultFormatter::format_label("no_tumor_2nd"), "No Tumor 2Nd");
    }

    #[test]
    fn percentage_has_three_decimals() {
        assert_eq!(ResultFormatter::format_percentage(1.0), "100.000");
        assert_eq!(ResultFormatter::format_percentage(0.0), "0.000");
        assert_eq!(ResultFormatter::format_percentage(0.123456), "12.346");
    }

    #[test]
    fn length_mismatch_is_inference_error() {
        let prediction = PredictionVector::new(vec![0.5, 0.5]);
        let result = ResultFormatter::format_result(&prediction, &categories());
        assert!(matches!(result, Err(ClassifierError::Inference(_))));
    }
}
