// Mock pipelines for unit tests. Each mock counts its calls so
// tests can assert that a short-circuit never reached a model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use crate::domain::pipeline::{GenHandle, PipelineHandle, Pipelines, QaHandle};
use crate::domain::query::ExtractionResult;
use crate::domain::traits::{AnswerExtractor, GenerationParams, TextGenerator};

/// Returns the same answer for every call.
pub struct FixedExtractor {
    pub result: ExtractionResult,
    pub calls:  AtomicUsize,
}

impl FixedExtractor {
    pub fn new(answer: &str, confidence: f32) -> Arc<Self> {
        Arc::new(Self {
            result: ExtractionResult::new(answer, confidence),
            calls:  AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnswerExtractor for FixedExtractor {
    fn extract(&self, _question: &str, _context: &str) -> Result<ExtractionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Fails every call with the given message.
pub struct FailingExtractor {
    pub message: &'static str,
}

impl AnswerExtractor for FailingExtractor {
    fn extract(&self, _question: &str, _context: &str) -> Result<ExtractionResult> {
        bail!("{}", self.message)
    }
}

/// Replays a fixed output (or error) and records the last prompt and params.
pub struct ScriptedGenerator {
    pub output:      Result<Vec<String>, String>,
    pub eos:         Option<u32>,
    pub calls:       AtomicUsize,
    pub last_prompt: Mutex<Option<String>>,
    pub last_params: Mutex<Option<GenerationParams>>,
}

impl ScriptedGenerator {
    pub fn returning(text: impl Into<String>) -> Arc<Self> {
        Self::build(Ok(vec![text.into()]))
    }

    pub fn returning_nothing() -> Arc<Self> {
        Self::build(Ok(Vec::new()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::build(Err(message.to_string()))
    }

    fn build(output: Result<Vec<String>, String>) -> Arc<Self> {
        Arc::new(Self {
            output,
            eos:         Some(50256),
            calls:       AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_params: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(prompt.to_string());
        *self.last_params.lock() = Some(params.clone());
        match &self.output {
            Ok(texts) => Ok(texts.clone()),
            Err(msg)  => bail!("{msg}"),
        }
    }

    fn eos_token_id(&self) -> Option<u32> {
        self.eos
    }
}

pub fn qa_handle(extractor: Arc<dyn AnswerExtractor>) -> QaHandle {
    PipelineHandle::Present(extractor)
}

pub fn gen_handle(generator: Arc<dyn TextGenerator>) -> GenHandle {
    PipelineHandle::Present(generator)
}

pub fn pipelines(qa: QaHandle, generator: GenHandle) -> Pipelines {
    Pipelines::new(qa, generator)
}
