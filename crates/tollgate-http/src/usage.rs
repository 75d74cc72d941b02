// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token usage extraction from provider response bodies.

use serde::Deserialize;
use tollgate_core::TokenUsage;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    usage: Option<RawUsage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUsage {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

fn clamp(count: Option<u64>) -> u32 {
    u32::try_from(count.unwrap_or(0)).unwrap_or(u32::MAX)
}

/// Extract token counts from a response body.
///
/// Looks for a nested `usage` object with `input_tokens`/`output_tokens`,
/// then `prompt_tokens`/`completion_tokens`. Any positive count is `exact`;
/// empty, malformed or usage-less bodies yield zero `heuristic` usage.
pub fn parse_usage(body: &[u8]) -> TokenUsage {
    if body.is_empty() {
        return TokenUsage::heuristic();
    }
    let Ok(envelope) = serde_json::from_slice::<Envelope>(body) else {
        return TokenUsage::heuristic();
    };
    let raw = envelope.usage.unwrap_or_default();

    let (input, output) = (clamp(raw.input_tokens), clamp(raw.output_tokens));
    if input > 0 || output > 0 {
        return TokenUsage::exact(input, output);
    }

    let (prompt, completion) = (clamp(raw.prompt_tokens), clamp(raw.completion_tokens));
    if prompt > 0 || completion > 0 {
        return TokenUsage::exact(prompt, completion);
    }

    TokenUsage::heuristic()
}
