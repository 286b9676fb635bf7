use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::{AppConfig, SummaryBackend};
use crate::errors::SummarizeError;

/// Decoding settings passed to the model on every call. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
    pub num_beams: usize,
    pub num_return_sequences: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 200,
            min_length: 50,
            do_sample: false,
            num_beams: 5,
            num_return_sequences: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizeResult {
    pub summaries: Vec<String>,
    pub backend: &'static str,
}

/// Blocking summarization call. Callers on the async runtime go through
/// `spawn_blocking`.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<SummarizeResult, SummarizeError>;

    fn backend(&self) -> &'static str;
}

#[cfg(feature = "summarizer-hf-inference")]
mod hf_inference;
#[cfg(feature = "summarizer-extractive")]
mod extractive;
#[cfg(feature = "summarizer-rust-bert")]
mod rust_bert;

static SHARED: OnceCell<Arc<dyn Summarizer>> = OnceCell::new();

/// Builds the process-wide summarizer on first call and hands out the same
/// instance afterwards. Loading may block for a long time (weights download).
pub fn load_shared(cfg: &AppConfig) -> Result<Arc<dyn Summarizer>, SummarizeError> {
    SHARED.get_or_try_init(|| build_summarizer(cfg)).cloned()
}

pub fn build_summarizer(cfg: &AppConfig) -> Result<Arc<dyn Summarizer>, SummarizeError> {
    tracing::info!(
        backend=%cfg.summary_backend,
        model=%cfg.summary_model,
        device=%cfg.device,
        "loading summarizer"
    );
    match cfg.summary_backend {
        #[cfg(feature = "summarizer-hf-inference")]
        SummaryBackend::HfInference => Ok(Arc::new(hf_inference::HfInferenceSummarizer::new(
            cfg.inference_host.clone(),
            cfg.summary_model.clone(),
            cfg.api_token.clone(),
            cfg.request_timeout(),
        )?)),
        #[cfg(feature = "summarizer-rust-bert")]
        SummaryBackend::RustBert => Ok(Arc::new(rust_bert::RustBertSummarizer::load(
            cfg.device,
            &cfg.generation_params(),
        )?)),
        #[cfg(feature = "summarizer-extractive")]
        SummaryBackend::Extractive => Ok(Arc::new(extractive::ExtractiveSummarizer::default())),
        #[allow(unreachable_patterns)]
        other => Err(SummarizeError::Unavailable(format!(
            "backend '{other}' is not compiled into this build"
        ))),
    }
}

#[cfg(all(test, feature = "summarizer-extractive"))]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn shared_summarizer_is_loaded_once() {
        let cfg = AppConfig::try_parse_from(["textsum-api", "--summary-backend", "extractive"])
            .expect("parse");
        let first = load_shared(&cfg).expect("load");
        let second = load_shared(&cfg).expect("load again");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
