//! Token budget and usage accounting for instruction-source calls

use serde::{Deserialize, Serialize};

use crate::errors::EditorError;
use crate::reconciler::Session;

pub const DEFAULT_MAX_TOKENS: u64 = 1_000_000;

/// Flat cost charged per attached image
pub const TOKENS_PER_IMAGE: u64 = 1120;

const CHARS_PER_TOKEN: u64 = 4;

/// USD per million tokens
const INPUT_PRICE_PER_MILLION: f64 = 0.50;
const OUTPUT_PRICE_PER_MILLION: f64 = 3.00;

/// Token counts reported by the instruction source
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl Usage {
    pub fn estimated_cost(&self) -> f64 {
        let input = self.prompt_token_count as f64 / 1_000_000.0 * INPUT_PRICE_PER_MILLION;
        let output = self.candidates_token_count as f64 / 1_000_000.0 * OUTPUT_PRICE_PER_MILLION;
        input + output
    }
}

/// Everything that would be sent with the next request
#[derive(Debug, Clone, Default)]
pub struct TokenEstimate<'a> {
    pub input: &'a str,
    pub messages: Vec<&'a str>,
    pub attached_images: usize,
    pub baseline_html: Option<&'a str>,
}

impl<'a> TokenEstimate<'a> {
    /// Pending `input` on top of a session's conversation so far
    pub fn for_session(session: &'a Session, input: &'a str) -> Self {
        let mut messages = Vec::with_capacity(session.turns.len() * 2);
        for turn in &session.turns {
            messages.push(turn.instruction.as_str());
            if let Some(summary) = &turn.summary {
                messages.push(summary.as_str());
            }
        }

        let baseline = session.baseline.as_ref();
        Self {
            input,
            messages,
            attached_images: baseline.map_or(0, |b| usize::from(b.aux_snapshot.is_some())),
            baseline_html: baseline.map(|b| b.tree_snapshot.as_str()),
        }
    }
}

fn text_tokens(chars: usize) -> u64 {
    (chars as u64).div_ceil(CHARS_PER_TOKEN)
}

pub fn estimate_tokens(estimate: &TokenEstimate<'_>) -> u64 {
    let chars = estimate.input.chars().count()
        + estimate
            .messages
            .iter()
            .map(|m| m.chars().count())
            .sum::<usize>();

    let mut tokens = text_tokens(chars) + estimate.attached_images as u64 * TOKENS_PER_IMAGE;
    if let Some(html) = estimate.baseline_html {
        tokens += text_tokens(html.chars().count());
    }
    tokens
}

/// Estimated token count, or an error when it exceeds `max_tokens`
pub fn check_budget(estimate: &TokenEstimate<'_>, max_tokens: u64) -> Result<u64, EditorError> {
    let estimated = estimate_tokens(estimate);
    if estimated > max_tokens {
        return Err(EditorError::TokenLimitExceeded {
            estimated,
            limit: max_tokens,
        });
    }
    Ok(estimated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rounds_up() {
        let estimate = TokenEstimate {
            input: "hello",
            ..Default::default()
        };
        assert_eq!(estimate_tokens(&estimate), 2);
    }

    #[test]
    fn test_images_and_baseline() {
        let estimate = TokenEstimate {
            input: "abcd",
            messages: vec!["efgh"],
            attached_images: 2,
            baseline_html: Some("<p>x</p>"),
        };
        assert_eq!(estimate_tokens(&estimate), 2 + 2 * 1120 + 2);
    }

    #[test]
    fn test_check_budget() {
        let html = "x".repeat(41);
        let estimate = TokenEstimate {
            baseline_html: Some(&html),
            ..Default::default()
        };
        assert_eq!(check_budget(&estimate, 11).unwrap(), 11);
        assert!(matches!(
            check_budget(&estimate, 10),
            Err(EditorError::TokenLimitExceeded { estimated: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_cost() {
        let usage = Usage {
            prompt_token_count: 2_000_000,
            candidates_token_count: 1_000_000,
            total_token_count: 3_000_000,
        };
        assert!((usage.estimated_cost() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_wire_format() {
        let usage: Usage = serde_json::from_str(r#"{"promptTokenCount": 10}"#).unwrap();
        assert_eq!(usage.prompt_token_count, 10);
        assert_eq!(usage.total_token_count, 0);
    }
}
