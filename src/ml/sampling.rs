// ============================================================
// Layer 5 — Next-Token Selection
// ============================================================
// Turns a row of vocabulary logits into one token id.
//
//   greedy        — argmax
//   sample_token  — temperature → top-k → top-p (nucleus) →
//                   weighted draw from what is left
//
// Reference: Holtzman et al. (2020) The Curious Case of Neural
//            Text Degeneration

use anyhow::{bail, ensure, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    /// Keep only the k most likely tokens; None keeps all
    pub top_k:       Option<usize>,
    /// Keep the smallest set whose probability mass reaches top_p
    pub top_p:       f32,
}

pub fn greedy(logits: &[f32]) -> Result<u32> {
    let (index, _) = logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .ok_or_else(|| anyhow::anyhow!("cannot pick a token from empty logits"))?;
    Ok(index as u32)
}

pub fn sample_token<R: Rng + ?Sized>(logits: &[f32], cfg: &SamplingConfig, rng: &mut R) -> Result<u32> {
    ensure!(!logits.is_empty(), "cannot sample from empty logits");
    ensure!(cfg.temperature > 0.0, "temperature must be positive, got {}", cfg.temperature);

    // Softmax of logits / temperature, sorted most likely first
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut candidates: Vec<(usize, f32)> = logits
        .iter()
        .enumerate()
        .map(|(i, &l)| (i, ((l - max) / cfg.temperature).exp()))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    if let Some(k) = cfg.top_k {
        candidates.truncate(k.max(1));
    }

    let total: f32 = candidates.iter().map(|(_, p)| p).sum();
    if cfg.top_p < 1.0 {
        let mut cumulative = 0.0;
        let mut keep = 0;
        for (_, p) in &candidates {
            keep += 1;
            cumulative += p / total;
            if cumulative >= cfg.top_p {
                break;
            }
        }
        candidates.truncate(keep.max(1));
    }

    let weights: Vec<f32> = candidates.iter().map(|(_, p)| *p).collect();
    let dist = match WeightedIndex::new(&weights) {
        Ok(d) => d,
        Err(e) => bail!("invalid token distribution: {e}"),
    };
    Ok(candidates[dist.sample(rng)].0 as u32)
}
