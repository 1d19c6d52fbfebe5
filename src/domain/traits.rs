// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to the two pretrained models
// only through these traits. The ML layer provides the real
// implementations; unit tests provide mocks.
//
// Both traits are Send + Sync because the web server shares
// one instance of each across request handlers.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use anyhow::Result;

use crate::domain::query::ExtractionResult;

// ─── AnswerExtractor ──────────────────────────────────────────────────────────
/// Any component that can pick an answer span out of a context passage.
///
/// Implementations:
///   - QaInferencer → DistilBERT fine-tuned on SQuAD
pub trait AnswerExtractor: Send + Sync {
    /// Return the best answer span and its confidence.
    /// Any failure is returned to the caller unchanged.
    fn extract(&self, question: &str, context: &str) -> Result<ExtractionResult>;
}

// ─── TextGenerator ────────────────────────────────────────────────────────────
/// Decoding settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Total length bound in tokens, prompt included
    pub max_length:           usize,
    pub num_return_sequences: usize,
    /// false → greedy argmax decoding
    pub do_sample:            bool,
    pub temperature:          f32,
    pub top_k:                Option<usize>,
    pub top_p:                f32,
    /// Emitting this id finishes a sequence, like eos
    pub pad_token_id:         Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length:           50,
            num_return_sequences: 1,
            do_sample:            false,
            temperature:          1.0,
            top_k:                Some(50),
            top_p:                1.0,
            pad_token_id:         None,
        }
    }
}

/// Any component that can continue a text prompt.
///
/// Implementations:
///   - TextGenerationInferencer → DistilGPT-2
pub trait TextGenerator: Send + Sync {
    /// Return `num_return_sequences` full texts (prompt + continuation).
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Vec<String>>;

    /// The model's end-of-text token id, if it has one.
    fn eos_token_id(&self) -> Option<u32>;
}
