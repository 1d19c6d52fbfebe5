// ============================================================
// Layer 2 — QA System (Orchestrator)
// ============================================================
// The single entry point behind the form. Strictly linear:
//
//   1. Validate  → both inputs non-empty
//   2. Check     → QA pipeline loaded
//   3. Extract   → answer span + confidence
//   4. Explain   → never fails outward
//   5. Format    → two Markdown panels
//
// Every path ends in a pair of display strings; no error ever
// reaches the presentation layer as an error value.

use crate::application::explainer::{Explainer, DEFAULT_MAX_NEW_TOKENS};
use crate::domain::pipeline::{PipelineHandle, Pipelines, QaHandle};
use crate::domain::query::{ExplanationResult, ExtractionResult, QueryInput};

pub const MISSING_INPUT_WARNING: &str = "⚠️ Please provide both question and context.";
pub const MODEL_NOT_LOADED:      &str = "❌ QA model not loaded. Please try again.";

pub struct QaSystem {
    extractor: QaHandle,
    explainer: Explainer,
}

impl QaSystem {
    pub fn new(pipelines: Pipelines) -> Self {
        Self {
            extractor: pipelines.qa,
            explainer: Explainer::new(pipelines.generator),
        }
    }

    /// Returns (answer panel, explanation panel).
    pub fn answer(&self, question: &str, context: &str) -> (String, String) {
        let query = QueryInput::new(question, context);
        if !query.is_complete() {
            return (MISSING_INPUT_WARNING.to_string(), String::new());
        }

        let extractor = match &self.extractor {
            PipelineHandle::Present(e) => e,
            PipelineHandle::Absent     => return (MODEL_NOT_LOADED.to_string(), String::new()),
        };

        let extraction = match extractor.extract(&query.question, &query.context) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Answer extraction failed: {e:#}");
                return (format!("❌ Error: {e}"), String::new());
            }
        };
        tracing::debug!(
            "Extracted '{}' (confidence {:.4})",
            extraction.answer,
            extraction.confidence
        );

        let explanation = self.explainer.generate(
            &query.question,
            &query.context,
            &extraction.answer,
            DEFAULT_MAX_NEW_TOKENS,
        );

        (format_answer(&extraction), format_explanation(&explanation))
    }
}

fn format_answer(result: &ExtractionResult) -> String {
    format!(
        "### 🎯 Extracted Answer\n**{}**\n\n**Confidence Score:** {}\n",
        result.answer,
        result.confidence_percent()
    )
}

fn format_explanation(explanation: &ExplanationResult) -> String {
    format!("### 💡 Explanation\n{}\n", explanation.text)
}
