// ============================================================
// Layer 2 — Explanation Generator
// ============================================================
// Turns an extracted answer into a short natural-language
// explanation using the text-generation pipeline:
//
//   Step 1: Build the fixed four-field prompt
//   Step 2: Call the generator with sampling settings
//   Step 3: Keep the text after the last "Explanation:"
//   Step 4: Trim, cap at 300 characters, fill in if empty
//
// This component never fails outward. A missing generator or
// any generation error degrades to a canned sentence.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::domain::pipeline::{GenHandle, PipelineHandle};
use crate::domain::query::ExplanationResult;
use crate::domain::traits::{GenerationParams, TextGenerator};

pub const DEFAULT_MAX_NEW_TOKENS: usize = 100;

const CONTEXT_PREVIEW_CHARS: usize = 200;
const MAX_EXPLANATION_CHARS: usize = 300;
const EXPLANATION_MARKER:    &str  = "Explanation:";
const ELLIPSIS:              &str  = "...";

const TEMPERATURE: f32   = 0.7;
const TOP_P:       f32   = 0.9;
const TOP_K:       usize = 50;

pub struct Explainer {
    generator: GenHandle,
}

impl Explainer {
    pub fn new(generator: GenHandle) -> Self {
        Self { generator }
    }

    /// Explain `answer` in the light of `question` and `context`.
    pub fn generate(
        &self,
        question:       &str,
        context:        &str,
        answer:         &str,
        max_new_tokens: usize,
    ) -> ExplanationResult {
        let generator = match &self.generator {
            PipelineHandle::Present(g) => g,
            PipelineHandle::Absent     => return ExplanationResult::new(not_loaded_fallback(answer)),
        };

        match self.try_generate(generator, question, context, answer, max_new_tokens) {
            Ok(text) => ExplanationResult::new(text),
            Err(e) => {
                tracing::debug!("Explanation generation failed: {e:#}");
                ExplanationResult::new(failure_fallback(answer))
            }
        }
    }

    fn try_generate(
        &self,
        generator:      &Arc<dyn TextGenerator>,
        question:       &str,
        context:        &str,
        answer:         &str,
        max_new_tokens: usize,
    ) -> Result<String> {
        let prompt = build_prompt(question, context, answer);
        let params = generation_params(&prompt, max_new_tokens, generator.eos_token_id());

        let outputs = generator.generate(&prompt, &params)?;
        let generated = outputs
            .first()
            .ok_or_else(|| anyhow!("generator returned no sequences"))?;

        Ok(clean_explanation(generated, answer))
    }
}

/// Question, first 200 characters of context, answer, then the marker
/// after a blank line.
pub fn build_prompt(question: &str, context: &str, answer: &str) -> String {
    let preview: String = context.chars().take(CONTEXT_PREVIEW_CHARS).collect();
    format!("Question: {question}\nContext: {preview}\nAnswer: {answer}\n\n{EXPLANATION_MARKER}")
}

/// Length bound = whitespace word count of the prompt + new tokens.
pub fn generation_params(
    prompt:         &str,
    max_new_tokens: usize,
    eos_token_id:   Option<u32>,
) -> GenerationParams {
    GenerationParams {
        max_length:           prompt.split_whitespace().count() + max_new_tokens,
        num_return_sequences: 1,
        do_sample:            true,
        temperature:          TEMPERATURE,
        top_k:                Some(TOP_K),
        top_p:                TOP_P,
        pad_token_id:         eos_token_id,
    }
}

/// Keep what follows the last marker, trim, and cap the length.
pub fn clean_explanation(generated: &str, answer: &str) -> String {
    let tail = generated
        .rsplit(EXPLANATION_MARKER)
        .next()
        .unwrap_or(generated)
        .trim();

    if tail.is_empty() {
        return empty_fallback(answer);
    }

    if tail.chars().count() > MAX_EXPLANATION_CHARS {
        let head: String = tail.chars().take(MAX_EXPLANATION_CHARS).collect();
        return format!("{head}{ELLIPSIS}");
    }

    tail.to_string()
}

fn not_loaded_fallback(answer: &str) -> String {
    format!("The answer '{answer}' was found in the provided context.")
}

fn empty_fallback(answer: &str) -> String {
    format!("The answer '{answer}' is found in the context.")
}

fn failure_fallback(answer: &str) -> String {
    format!("The answer '{answer}' was extracted from the provided context.")
}
