use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tumor_classifier::{
    config::{parse_target_size, Config, DEFAULT_TARGET_SIZE},
    web::serve,
};

#[derive(Parser)]
#[command(name = "tumor-classifier")]
#[command(about = "Brain scan tumor classification service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "CLASSIFIER_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// Path to the ONNX classifier model
    #[arg(long, env = "CLASSIFIER_MODEL", default_value = "brain_tumor_classifier.onnx")]
    model_path: String,

    /// Directory uploaded scans are written to
    #[arg(long, env = "CLASSIFIER_UPLOAD_DIR", default_value = "static/upload")]
    upload_dir: String,

    /// Model input size as WIDTHxHEIGHT
    #[arg(long, env = "CLASSIFIER_TARGET_SIZE", value_parser = parse_target_size)]
    target_size: Option<(u32, u32)>,

    /// Only report the winning category, without per-category confidences
    #[arg(long)]
    no_confidences: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting tumor classifier service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model_path);
    tracing::info!("Upload directory: {}", args.upload_dir);

    let config = Config::new(
        args.bind,
        args.model_path,
        args.upload_dir,
        args.target_size.unwrap_or(DEFAULT_TARGET_SIZE),
        !args.no_confidences,
        args.dev,
    )?;

    serve(config).await?;

    Ok(())
}
