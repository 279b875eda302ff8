pub mod classifier;
pub mod manager;

pub use classifier::{ClassifierModel, OnnxClassifier, PredictionVector};
pub use manager::{ModelManager, ModelStats};
