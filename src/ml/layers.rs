// ============================================================
// Layer 5 — Pretrained Building Blocks
// ============================================================
// Both architectures are assembled from Burn's own modules:
//
//   Linear              — y = x·W + b, W stored as [d_in, d_out]
//   LayerNorm           — normalisation over the last dim
//   Embedding           — id → row lookup
//   MultiHeadAttention  — scaled dot-product attention, with an
//                         autoregressive mask for GPT-2
//
// Nothing is initialised randomly: every parameter is set from
// a WeightStore. The only custom piece is gelu_tanh, the GELU
// approximation GPT-2 was trained with.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks)

use anyhow::{ensure, Result};
use burn::module::Param;
use burn::nn::attention::MultiHeadAttention;
use burn::nn::{DropoutConfig, Embedding, Gelu, LayerNorm, LayerNormConfig, Linear};
use burn::prelude::*;

use crate::ml::weights::WeightStore;

/// Score added to attention positions hidden by a mask.
const MASKED_SCORE: f64 = -1.0e4;

// ─── Linear ───────────────────────────────────────────────────────────────────
/// `weight` must already be [d_in, d_out].
pub fn linear_from<B: Backend>(weight: Tensor<B, 2>, bias: Tensor<B, 1>) -> Linear<B> {
    Linear {
        weight: Param::from_tensor(weight),
        bias:   Some(Param::from_tensor(bias)),
    }
}

/// PyTorch `nn.Linear` stores [d_out, d_in]; transpose on load.
pub fn load_linear<B: Backend>(store: &WeightStore, name: &str, device: &B::Device) -> Result<Linear<B>> {
    let weight = store.tensor::<B, 2>(&[&format!("{name}.weight")], device)?;
    let bias   = store.tensor::<B, 1>(&[&format!("{name}.bias")], device)?;
    Ok(linear_from(weight.transpose(), bias))
}

/// GPT-2 `Conv1D` already stores [d_in, d_out].
pub fn load_conv1d<B: Backend>(store: &WeightStore, name: &str, device: &B::Device) -> Result<Linear<B>> {
    let weight = store.tensor::<B, 2>(&[&format!("{name}.weight")], device)?;
    let bias   = store.tensor::<B, 1>(&[&format!("{name}.bias")], device)?;
    Ok(linear_from(weight, bias))
}

// ─── LayerNorm / Embedding ────────────────────────────────────────────────────
/// Accepts both "weight"/"bias" and the legacy "gamma"/"beta" names.
pub fn load_layer_norm<B: Backend>(
    store:   &WeightStore,
    name:    &str,
    epsilon: f64,
    device:  &B::Device,
) -> Result<LayerNorm<B>> {
    let gamma = store.tensor::<B, 1>(&[&format!("{name}.weight"), &format!("{name}.gamma")], device)?;
    let beta  = store.tensor::<B, 1>(&[&format!("{name}.bias"), &format!("{name}.beta")], device)?;
    ensure!(
        gamma.dims() == beta.dims(),
        "'{name}' scale is {:?} but shift is {:?}",
        gamma.dims(), beta.dims()
    );

    let [d_model] = gamma.dims();
    let mut norm = LayerNormConfig::new(d_model).with_epsilon(epsilon).init(device);
    norm.gamma = Param::from_tensor(gamma);
    norm.beta  = Some(Param::from_tensor(beta));
    Ok(norm)
}

pub fn load_embedding<B: Backend>(store: &WeightStore, name: &str, device: &B::Device) -> Result<Embedding<B>> {
    Ok(Embedding {
        weight: Param::from_tensor(store.tensor::<B, 2>(&[name], device)?),
    })
}

// ─── Attention ────────────────────────────────────────────────────────────────
/// Multi-head attention over already-loaded projections.
pub fn attention_from<B: Backend>(
    query:   Linear<B>,
    key:     Linear<B>,
    value:   Linear<B>,
    output:  Linear<B>,
    n_heads: usize,
) -> Result<MultiHeadAttention<B>> {
    let d_model = query.weight.val().dims()[1];
    ensure!(
        n_heads > 0 && d_model % n_heads == 0,
        "d_model ({d_model}) must be divisible by n_heads ({n_heads})"
    );
    Ok(MultiHeadAttention {
        query,
        key,
        value,
        output,
        dropout:       DropoutConfig::new(0.0).init(),
        activation:    Gelu::new(),
        d_model,
        n_heads,
        d_k:           d_model / n_heads,
        min_float:     MASKED_SCORE,
        quiet_softmax: false,
    })
}

/// 0.5·x·(1 + tanh(√(2/π)·(x + 0.044715·x³)))
pub fn gelu_tanh<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let coeff = (2.0f64 / std::f64::consts::PI).sqrt();
    let inner = x
        .clone()
        .add(x.clone().powf_scalar(3.0).mul_scalar(0.044715))
        .mul_scalar(coeff)
        .tanh();
    x.mul(inner.add_scalar(1.0)).mul_scalar(0.5)
}
