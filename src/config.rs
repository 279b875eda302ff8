use anyhow::{bail, Result};
use std::path::PathBuf;

/// 默认的肿瘤类别，顺序与模型输出一一对应，不可重排
pub const DEFAULT_CATEGORIES: [&str; 3] = ["glioma", "meningioma", "pituitary_tumor"];

/// 模型输入尺寸 (宽, 高)
pub const DEFAULT_TARGET_SIZE: (u32, u32) = (512, 512);

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 上传文件目录
    pub upload_dir: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// 分类流水线配置
    pub pipeline_config: PipelineConfig,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 预处理目标尺寸 (宽, 高)
    pub target_size: (u32, u32),

    /// 类别列表
    pub categories: Vec<String>,

    /// 是否在结果中附带各类别置信度
    pub report_confidences: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            report_confidences: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: String,
        upload_dir: String,
        target_size: (u32, u32),
        report_confidences: bool,
        dev_mode: bool,
    ) -> Result<Self> {
        if target_size.0 == 0 || target_size.1 == 0 {
            bail!("Target size must be non-zero, got {}x{}", target_size.0, target_size.1);
        }

        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1),
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 20 * 1024 * 1024, // 20MB
        };

        let pipeline_config = PipelineConfig {
            target_size,
            report_confidences,
            ..PipelineConfig::default()
        };

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            upload_dir: PathBuf::from(upload_dir),
            dev_mode,
            pipeline_config,
            onnx_config,
            server_config,
        })
    }
}

/// 解析形如 "512x512" 的尺寸参数
pub fn parse_target_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;

    let width: u32 = w.trim().parse().map_err(|e| format!("invalid width '{}': {}", w, e))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("invalid height '{}': {}", h, e))?;

    if width == 0 || height == 0 {
        return Err("target size must be non-zero".to_string());
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_size() {
        assert_eq!(parse_target_size("512x512"), Ok((512, 512)));
        assert_eq!(parse_target_size("224X160"), Ok((224, 160)));
        assert!(parse_target_size("512").is_err());
        assert!(parse_target_size("0x512").is_err());
    }

    #[test]
    fn rejects_zero_target_size() {
        let result = Config::new(
            "127.0.0.1:5000".into(),
            "model.onnx".into(),
            "uploads".into(),
            (0, 512),
            true,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn default_pipeline_uses_three_categories() {
        let config = PipelineConfig::default();
        assert_eq!(config.categories, vec!["glioma", "meningioma", "pituitary_tumor"]);
        assert_eq!(config.target_size, (512, 512));
        assert!(config.report_confidences);
    }
}
