// ============================================================
// Layer 6 — Model Loader
// ============================================================
// Builds both pipelines once at startup:
//
//   ModelHub::fetch ──► files on disk ──► build on a blocking
//   thread ──► Present(pipeline) | Absent
//
// The two loads are independent; either can fail without
// affecting the other, and neither failure stops the process.
// A GPU device builds both models on wgpu, the CPU on ndarray.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;

use crate::domain::pipeline::{PipelineHandle, Pipelines};
use crate::domain::traits::{AnswerExtractor, TextGenerator};
use crate::infra::device::ComputeDevice;
use crate::infra::hub::ModelHub;
use crate::ml::generator::TextGenerationInferencer;
use crate::ml::inferencer::QaInferencer;
use crate::ml::{CpuBackend, GpuBackend};

pub const QA_MODEL_ID:  &str = "distilbert-base-uncased-distilled-squad";
pub const GEN_MODEL_ID: &str = "distilgpt2";

pub async fn load_pipelines(cache_dir: &Path) -> Pipelines {
    tracing::info!("Loading models...");
    let device = match tokio::task::spawn_blocking(ComputeDevice::detect).await {
        Ok(device) => device,
        Err(e) => {
            tracing::warn!("Device detection failed ({e}), using cpu");
            ComputeDevice::Cpu
        }
    };
    let pipelines = load_pipelines_on(&ModelHub::new(cache_dir), device).await;
    if !pipelines.qa.is_present() {
        tracing::warn!("QA model unavailable; every question will be answered with a not-loaded notice");
    }
    pipelines
}

async fn load_pipelines_on(hub: &ModelHub, device: ComputeDevice) -> Pipelines {
    let qa = PipelineHandle::from_load(log_outcome("QA", load_qa(hub, device).await));
    let generator = PipelineHandle::from_load(log_outcome("generation", load_generator(hub, device).await));
    Pipelines::new(qa, generator)
}

async fn load_qa(hub: &ModelHub, device: ComputeDevice) -> Result<Arc<dyn AnswerExtractor>> {
    let files = hub.fetch(QA_MODEL_ID).await?;
    tokio::task::spawn_blocking(move || {
        let extractor: Arc<dyn AnswerExtractor> = match device.wgpu() {
            Some(gpu) => Arc::new(QaInferencer::<GpuBackend>::load(&files, gpu)?),
            None      => Arc::new(QaInferencer::<CpuBackend>::load(&files, NdArrayDevice::Cpu)?),
        };
        Ok::<_, anyhow::Error>(extractor)
    })
    .await?
}

async fn load_generator(hub: &ModelHub, device: ComputeDevice) -> Result<Arc<dyn TextGenerator>> {
    let files = hub.fetch(GEN_MODEL_ID).await?;
    tokio::task::spawn_blocking(move || {
        let generator: Arc<dyn TextGenerator> = match device.wgpu() {
            Some(gpu) => Arc::new(TextGenerationInferencer::<GpuBackend>::load(&files, gpu)?),
            None      => Arc::new(TextGenerationInferencer::<CpuBackend>::load(&files, NdArrayDevice::Cpu)?),
        };
        Ok::<_, anyhow::Error>(generator)
    })
    .await?
}

fn log_outcome<P>(kind: &str, result: Result<P>) -> Result<P> {
    match &result {
        Ok(_) if kind == "QA" => tracing::info!("✓ QA model loaded"),
        Ok(_)                 => tracing::info!("✓ Generation model loaded"),
        Err(e)                => tracing::warn!("Error loading {kind} model: {e:#}"),
    }
    result
}
