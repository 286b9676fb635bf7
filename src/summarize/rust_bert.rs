use parking_lot::Mutex;
use rust_bert::pipelines::summarization::{SummarizationConfig, SummarizationModel};

use crate::config::Device;
use crate::errors::SummarizeError;
use crate::summarize::{GenerationParams, SummarizeResult, Summarizer};

/// In-process BART-CNN through libtorch. Weights are fetched into the
/// rust-bert cache on first load. Generation settings are baked into the
/// model at load time, so `params` passed per call are only logged.
pub struct RustBertSummarizer {
    model: Mutex<SummarizationModel>,
}

fn to_tch(device: Device) -> tch::Device {
    match device {
        Device::Cpu => tch::Device::Cpu,
        Device::Cuda(i) => tch::Device::Cuda(i),
    }
}

impl RustBertSummarizer {
    pub fn load(device: Device, params: &GenerationParams) -> Result<Self, SummarizeError> {
        if let Device::Cuda(i) = device {
            if !tch::Cuda::is_available() || i as i64 >= tch::Cuda::device_count() {
                return Err(SummarizeError::Unavailable(format!("device {device} not available")));
            }
        }
        let config = SummarizationConfig {
            min_length: params.min_length as i64,
            max_length: Some(params.max_length as i64),
            do_sample: params.do_sample,
            num_beams: params.num_beams as i64,
            num_return_sequences: params.num_return_sequences as i64,
            device: to_tch(device),
            ..Default::default()
        };
        let model = SummarizationModel::new(config)
            .map_err(|e| SummarizeError::Model(format!("load model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Summarizer for RustBertSummarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<SummarizeResult, SummarizeError> {
        tracing::trace!(?params, "rust-bert summarize");
        let summaries = self
            .model
            .lock()
            .summarize(&[text])
            .map_err(|e| SummarizeError::Model(e.to_string()))?;
        let summaries: Vec<String> = summaries
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if summaries.is_empty() {
            return Err(SummarizeError::EmptyOutput);
        }
        Ok(SummarizeResult {
            summaries,
            backend: self.backend(),
        })
    }

    fn backend(&self) -> &'static str {
        "rust_bert"
    }
}
