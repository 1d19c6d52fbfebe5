// ============================================================
// Layer 3 — Query Domain Types
// ============================================================
// The three transient records a single request moves through:
//
//   QueryInput        → what the user typed
//   ExtractionResult  → the span the QA model picked
//   ExplanationResult → the text the generator produced
//
// None of these outlive a request and none are mutated after
// they are built.

use serde::{Deserialize, Serialize};

/// A question together with the passage it should be answered from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInput {
    pub question: String,
    pub context:  String,
}

impl QueryInput {
    pub fn new(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context:  context.into(),
        }
    }

    /// Both fields must be non-empty before any model is called.
    /// Whitespace counts as content here; the extractor rejects it later.
    pub fn is_complete(&self) -> bool {
        !self.question.is_empty() && !self.context.is_empty()
    }
}

/// The answer span picked by the extractive QA model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Text selected from the context by the model's span offsets
    pub answer: String,

    /// p(start) * p(end) of the winning span, in [0, 1]
    pub confidence: f32,
}

impl ExtractionResult {
    pub fn new(answer: impl Into<String>, confidence: f32) -> Self {
        Self {
            answer: answer.into(),
            confidence,
        }
    }

    /// Confidence as a percentage with two decimals, e.g. "97.31%"
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

/// A cleaned explanation: at most 300 characters plus an optional "...".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationResult {
    pub text: String,
}

impl ExplanationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
