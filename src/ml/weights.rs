// ============================================================
// Layer 5 — Pretrained Weight Store
// ============================================================
// Reads a HuggingFace `model.safetensors` file into named f32
// tensors and hands them to the model builders as Burn tensors.
//
// Checkpoint naming is not uniform across uploads:
//   - some prefix every key with the architecture name
//     ("distilbert.", "transformer."), some don't
//   - older BERT-family files name LayerNorm params
//     "gamma"/"beta" instead of "weight"/"bias"
// Lookups therefore take a list of candidate names.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use burn::tensor::TensorData;
use safetensors::{Dtype, SafeTensors};

/// A host-side tensor: row-major f32 values plus shape.
#[derive(Debug, Clone)]
pub struct RawTensor {
    pub shape: Vec<usize>,
    pub data:  Vec<f32>,
}

impl RawTensor {
    pub fn to_tensor<B: Backend, const D: usize>(&self, device: &B::Device) -> Result<Tensor<B, D>> {
        if self.shape.len() != D {
            bail!("expected a rank-{D} tensor, found shape {:?}", self.shape);
        }
        let data = TensorData::new(self.data.clone(), self.shape.clone());
        Ok(Tensor::<B, D>::from_data(data, device))
    }
}

pub struct WeightStore {
    tensors: HashMap<String, RawTensor>,
    /// Optional key prefixes, tried after the bare name
    prefixes: Vec<String>,
}

impl WeightStore {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read weights from '{}'", path.display()))?;
        let store = Self::from_bytes(&bytes)
            .with_context(|| format!("Cannot parse weights in '{}'", path.display()))?;
        tracing::debug!("Read {} tensors from '{}'", store.len(), path.display());
        Ok(store)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file = SafeTensors::deserialize(bytes)?;
        let mut tensors = HashMap::new();

        for (name, view) in file.tensors() {
            if view.dtype() != Dtype::F32 {
                // Non-float buffers (e.g. GPT-2's "attn.bias" causal mask) are not parameters
                tracing::debug!("Skipping tensor '{name}' with dtype {:?}", view.dtype());
                continue;
            }
            let data = view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            tensors.insert(name, RawTensor { shape: view.shape().to_vec(), data });
        }

        Ok(Self { tensors, prefixes: Vec::new() })
    }

    /// Also try `prefix + name` for every lookup.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// First tensor found among `candidates`, bare names before prefixed ones.
    pub fn get(&self, candidates: &[&str]) -> Result<&RawTensor> {
        for name in candidates {
            if let Some(t) = self.tensors.get(*name) {
                return Ok(t);
            }
        }
        for prefix in &self.prefixes {
            for name in candidates {
                if let Some(t) = self.tensors.get(&format!("{prefix}{name}")) {
                    return Ok(t);
                }
            }
        }
        bail!("missing tensor '{}'", candidates.first().copied().unwrap_or_default())
    }

    pub fn tensor<B: Backend, const D: usize>(
        &self,
        candidates: &[&str],
        device:     &B::Device,
    ) -> Result<Tensor<B, D>> {
        self.get(candidates)?
            .to_tensor::<B, D>(device)
            .with_context(|| format!("tensor '{}'", candidates.first().copied().unwrap_or_default()))
    }
}
