pub mod pipeline;
pub mod postprocessing;
pub mod types;

pub use pipeline::ClassificationPipeline;
pub use postprocessing::ResultFormatter;
pub use types::{
    CategoryConfidence, ClassificationOutcome, ClassificationResult, PipelineStage, PipelineStatus,
    ResultsQuery, UploadedImage,
};
