// ============================================================
// Layer 3 — Pipeline Handles
// ============================================================
// Each pretrained pipeline is loaded once at startup. Loading
// can fail (no network, no weights, no device), and a failed
// load must not take the other pipeline or the process down.
//
// PipelineHandle is a two-variant enum so every call site has
// to match on Absent explicitly.

use std::sync::Arc;

use crate::domain::traits::{AnswerExtractor, TextGenerator};

#[derive(Debug, Clone)]
pub enum PipelineHandle<P> {
    /// Bound to a loaded, callable pipeline
    Present(P),
    /// Construction failed at startup
    Absent,
}

impl<P> PipelineHandle<P> {
    /// Present on Ok, Absent on Err. The error is dropped; the loader logs it.
    pub fn from_load<E>(result: Result<P, E>) -> Self {
        match result {
            Ok(pipeline) => Self::Present(pipeline),
            Err(_)       => Self::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

pub type QaHandle  = PipelineHandle<Arc<dyn AnswerExtractor>>;
pub type GenHandle = PipelineHandle<Arc<dyn TextGenerator>>;

/// The pair of handles the loader hands to the orchestrator.
#[derive(Clone)]
pub struct Pipelines {
    pub qa:        QaHandle,
    pub generator: GenHandle,
}

impl Pipelines {
    pub fn new(qa: QaHandle, generator: GenHandle) -> Self {
        Self { qa, generator }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_load_maps_ok_to_present() {
        let h: PipelineHandle<u32> = PipelineHandle::from_load(Ok::<_, ()>(7));
        assert!(matches!(h, PipelineHandle::Present(7)));
    }

    #[test]
    fn test_from_load_maps_err_to_absent() {
        let h: PipelineHandle<u32> = PipelineHandle::from_load(Err("no weights"));
        assert!(!h.is_present());
    }
}
