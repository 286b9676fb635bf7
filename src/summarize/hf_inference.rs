use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::errors::SummarizeError;
use crate::summarize::{GenerationParams, SummarizeResult, Summarizer};

const MAX_ATTEMPTS: u64 = 3;

/// Talks to a Hugging Face Inference-API compatible endpoint, which runs the
/// `summarization` pipeline for `model` and answers `[{"summary_text": ...}]`.
pub struct HfInferenceSummarizer {
    host: String,
    model: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

impl HfInferenceSummarizer {
    pub fn new(
        host: String,
        model: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::Other(format!("build http client: {e}")))?;
        Ok(Self {
            host,
            model,
            token,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.host.trim_end_matches('/'), self.model)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorReply>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl Summarizer for HfInferenceSummarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<SummarizeResult, SummarizeError> {
        let url = self.endpoint();
        let body = serde_json::json!({
            "inputs": text,
            "parameters": params,
            "options": { "wait_for_model": true, "use_cache": false },
        });

        // Retry with linear backoff on connection failures, 429 and 5xx
        let mut last_err = SummarizeError::Http(format!("no response from {}", self.host));
        for attempt in 0..MAX_ATTEMPTS {
            let mut req = self.client.post(&url).json(&body);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            match req.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let items: Vec<SummaryItem> = resp
                            .json()
                            .map_err(|e| SummarizeError::Http(format!("decode response: {e}")))?;
                        let summaries: Vec<String> = items
                            .into_iter()
                            .map(|i| i.summary_text.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect();
                        if summaries.is_empty() {
                            return Err(SummarizeError::EmptyOutput);
                        }
                        return Ok(SummarizeResult {
                            summaries,
                            backend: self.backend(),
                        });
                    }
                    let detail = error_message(&resp.text().unwrap_or_default());
                    last_err = match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(SummarizeError::Unavailable(format!(
                                "{} rejected credentials (status {status}): {detail}",
                                self.host
                            )));
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            SummarizeError::Unavailable(format!("rate limited by {}: {detail}", self.host))
                        }
                        StatusCode::SERVICE_UNAVAILABLE => {
                            SummarizeError::Unavailable(format!("{} is loading: {detail}", self.model))
                        }
                        s if s.is_client_error() => {
                            // Bad input; retrying won't help
                            return Err(SummarizeError::Model(format!("status {status}: {detail}")));
                        }
                        _ => SummarizeError::Http(format!("status {status} from {}: {detail}", self.host)),
                    };
                }
                Err(e) => {
                    last_err = SummarizeError::Unavailable(format!("connect {}: {e}", self.host));
                }
            }
            tracing::warn!(attempt = attempt + 1, error=%last_err, "inference request failed");
            if attempt + 1 < MAX_ATTEMPTS {
                std::thread::sleep(Duration::from_millis(100 * (attempt + 1)));
            }
        }
        Err(last_err)
    }

    fn backend(&self) -> &'static str {
        "hf_inference"
    }
}
