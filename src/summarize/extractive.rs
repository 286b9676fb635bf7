use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SummarizeError;
use crate::summarize::{GenerationParams, SummarizeResult, Summarizer};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Model-free fallback: keeps leading sentences that fit in a character
/// budget derived from `max_length` (roughly four characters per token).
#[derive(Default)]
pub struct ExtractiveSummarizer;

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<SummarizeResult, SummarizeError> {
        let approx_tokens_per_char = 0.25; // crude
        let max_chars = (params.max_length as f64 / approx_tokens_per_char) as usize;
        let text = WHITESPACE.replace_all(text.trim(), " ");

        // Budget counted in chars on both paths
        let mut out = String::new();
        let mut used = 0usize;
        for sentence in text.split_inclusive(['.', '!', '?']) {
            let s = sentence.trim();
            if s.is_empty() {
                continue;
            }
            let len = s.chars().count();
            let add = if out.is_empty() { len } else { len + 1 };
            if used + add > max_chars {
                break;
            }
            used += add;
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(s);
        }
        if out.is_empty() {
            out = text.chars().take(max_chars).collect();
        }
        if out.is_empty() {
            return Err(SummarizeError::EmptyOutput);
        }
        Ok(SummarizeResult {
            summaries: vec![out],
            backend: self.backend(),
        })
    }

    fn backend(&self) -> &'static str {
        "extractive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_length: usize) -> GenerationParams {
        GenerationParams {
            max_length,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn respects_length_cap_and_sentence_selection() {
        let s = ExtractiveSummarizer;
        let context = "Sentence one is short. Sentence two is a little bit longer! And question three? Trailing.";
        let res = s.summarize(context, &params(15)).expect("summarize");
        assert_eq!(res.backend, "extractive");
        assert_eq!(res.summaries.len(), 1);
        assert_eq!(
            res.summaries[0],
            "Sentence one is short. Sentence two is a little bit longer!"
        );
    }

    #[test]
    fn falls_back_to_char_truncation_when_first_sentence_is_too_long() {
        let s = ExtractiveSummarizer;
        let context = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let res = s.summarize(context, &params(8)).expect("summarize");
        assert_eq!(res.summaries[0].len(), 32);
    }

    #[test]
    fn multibyte_sentences_use_the_same_char_budget_as_truncation() {
        let s = ExtractiveSummarizer;
        // 8 tokens => 32 chars; each sentence is 14 chars but 18 bytes
        let context = "Größe über öl. Größe über öl. Größe über öl.";
        let res = s.summarize(context, &params(8)).expect("summarize");
        assert_eq!(res.summaries[0], "Größe über öl. Größe über öl.");
        assert!(res.summaries[0].chars().count() <= 32);

        let unbroken = "ü".repeat(100);
        let res = s.summarize(&unbroken, &params(8)).expect("summarize");
        assert_eq!(res.summaries[0].chars().count(), 32);
    }

    #[test]
    fn collapses_whitespace() {
        let s = ExtractiveSummarizer;
        let res = s
            .summarize("  Line one.\n\n   Line\ttwo.  ", &params(200))
            .expect("summarize");
        assert_eq!(res.summaries[0], "Line one. Line two.");
    }

    #[test]
    fn blank_input_yields_empty_output_error() {
        let s = ExtractiveSummarizer;
        assert!(matches!(
            s.summarize("   ", &params(200)),
            Err(SummarizeError::EmptyOutput)
        ));
    }
}
