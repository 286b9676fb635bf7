use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::summarize::GenerationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum SummaryBackend {
    HfInference,
    RustBert,
    Extractive,
}

impl SummaryBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryBackend::HfInference => "hf_inference",
            SummaryBackend::RustBert => "rust_bert",
            SummaryBackend::Extractive => "extractive",
        }
    }
}

impl fmt::Display for SummaryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in-process inference runs. `-1` selects the CPU, any other
/// index selects that accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(usize),
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "cpu" || s == "-1" {
            return Ok(Device::Cpu);
        }
        let index = s.strip_prefix("cuda:").unwrap_or(&s);
        index
            .parse::<usize>()
            .map(Device::Cuda)
            .map_err(|_| format!("invalid device '{s}' (expected -1, cpu, N or cuda:N)"))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(i) => write!(f, "cuda:{i}"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "textsum-api")]
#[command(about = "HTTP summarization service backed by a pretrained seq2seq model", long_about = None)]
pub struct AppConfig {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    #[arg(long, env = "SUMMARY_BACKEND", value_enum, default_value_t = SummaryBackend::HfInference)]
    pub summary_backend: SummaryBackend,

    #[arg(long, env = "SUMMARY_MODEL", default_value = "facebook/bart-large-cnn")]
    pub summary_model: String,

    #[arg(long, env = "INFERENCE_HOST", default_value = "https://api-inference.huggingface.co")]
    pub inference_host: String,

    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    #[arg(long, env = "SUMMARY_DEVICE", default_value = "-1", allow_hyphen_values = true)]
    pub device: Device,

    #[arg(long, env = "SUMMARY_MAX_LENGTH", default_value_t = 200)]
    pub max_length: usize,

    #[arg(long, env = "SUMMARY_MIN_LENGTH", default_value_t = 50)]
    pub min_length: usize,

    #[arg(long, env = "SUMMARY_NUM_BEAMS", default_value_t = 5)]
    pub num_beams: usize,

    #[arg(long, env = "SUMMARY_NUM_RETURN_SEQUENCES", default_value_t = 1)]
    pub num_return_sequences: usize,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env_and_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_length == 0 {
            return Err("max_length must be > 0".into());
        }
        if self.min_length > self.max_length {
            return Err(format!(
                "min_length ({}) must not exceed max_length ({})",
                self.min_length, self.max_length
            ));
        }
        if self.num_beams == 0 {
            return Err("num_beams must be > 0".into());
        }
        if self.num_return_sequences == 0 || self.num_return_sequences > self.num_beams {
            return Err("num_return_sequences must be between 1 and num_beams".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".into());
        }
        if self.summary_backend == SummaryBackend::HfInference {
            url::Url::parse(&self.inference_host)
                .map_err(|_| "Invalid INFERENCE_HOST URL format".to_string())?;
        }
        Ok(())
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.max_length,
            min_length: self.min_length,
            do_sample: false,
            num_beams: self.num_beams,
            num_return_sequences: self.num_return_sequences,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["textsum-api"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn device_accepts_index_and_named_forms() {
        assert_eq!("-1".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!("CPU".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!("0".parse::<Device>(), Ok(Device::Cuda(0)));
        assert_eq!("cuda:2".parse::<Device>(), Ok(Device::Cuda(2)));
        assert!("gpu".parse::<Device>().is_err());
        assert!("-2".parse::<Device>().is_err());
    }

    #[test]
    fn flags_override_generation_defaults() {
        let cfg = parse(&[
            "--summary-backend",
            "extractive",
            "--device",
            "-1",
            "--max-length",
            "120",
            "--min-length",
            "30",
        ]);
        assert_eq!(cfg.summary_backend, SummaryBackend::Extractive);
        assert_eq!(cfg.device, Device::Cpu);
        let params = cfg.generation_params();
        assert_eq!(params.max_length, 120);
        assert_eq!(params.min_length, 30);
        assert_eq!(params.num_beams, 5);
        assert!(!params.do_sample);
    }

    #[test]
    fn validate_rejects_inconsistent_lengths() {
        let cfg = parse(&["--min-length", "300"]);
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("min_length"));
    }

    #[test]
    fn validate_rejects_more_sequences_than_beams() {
        let cfg = parse(&["--num-beams", "2", "--num-return-sequences", "3"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_inference_host() {
        let cfg = parse(&["--inference-host", "not a url"]);
        assert!(cfg.validate().is_err());
        let cfg = parse(&["--inference-host", "not a url", "--summary-backend", "extractive"]);
        assert!(cfg.validate().is_ok());
    }
}
