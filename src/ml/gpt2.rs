// ============================================================
// Layer 5 — GPT-2 Language Model
// ============================================================
// The decoder-only transformer behind `distilgpt2`:
//   • Token embeddings (wte) + learned positions (wpe)
//   • Pre-norm decoder blocks: causal attention and a
//     tanh-GELU MLP, each wrapped in a residual connection
//   • Final LayerNorm
//   • LM head tied to the token embedding matrix
//
// Attention is stored fused in the checkpoint (c_attn maps
// d_model → 3·d_model); it is split into query/key/value
// projections on load.
//
// Reference: Radford et al. (2019) Language Models are
//            Unsupervised Multitask Learners

use anyhow::{ensure, Result};
use burn::nn::attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention};
use burn::nn::{Embedding, LayerNorm, Linear};
use burn::prelude::*;
use serde::Deserialize;

use crate::ml::layers::{attention_from, gelu_tanh, linear_from, load_conv1d, load_embedding, load_layer_norm};
use crate::ml::weights::WeightStore;

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

fn default_eos_token_id() -> u32 {
    50256
}

/// The fields of the HuggingFace `config.json` this model needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Gpt2Config {
    pub vocab_size:  usize,
    pub n_positions: usize,
    pub n_embd:      usize,
    pub n_layer:     usize,
    pub n_head:      usize,
    #[serde(default = "default_layer_norm_epsilon")]
    pub layer_norm_epsilon: f64,
    #[serde(default = "default_eos_token_id")]
    pub eos_token_id: u32,
}

impl Gpt2Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<B: Backend>(&self, store: &WeightStore, device: &B::Device) -> Result<Gpt2Lm<B>> {
        let wte = load_embedding(store, "wte.weight", device)?;
        let wpe = load_embedding(store, "wpe.weight", device)?;
        ensure!(
            wte.weight.val().dims() == [self.vocab_size, self.n_embd],
            "token embeddings are {:?}, config says [{}, {}]",
            wte.weight.val().dims(), self.vocab_size, self.n_embd
        );

        let blocks = (0..self.n_layer)
            .map(|i| self.load_block(store, i, device))
            .collect::<Result<Vec<_>>>()?;

        Ok(Gpt2Lm {
            wte,
            wpe,
            blocks,
            ln_f:   load_layer_norm(store, "ln_f", self.layer_norm_epsilon, device)?,
            n_positions: self.n_positions,
        })
    }

    fn load_block<B: Backend>(&self, store: &WeightStore, index: usize, device: &B::Device) -> Result<DecoderBlock<B>> {
        let p = format!("h.{index}");
        let d = self.n_embd;

        let fused_w = store.tensor::<B, 2>(&[&format!("{p}.attn.c_attn.weight")], device)?;
        let fused_b = store.tensor::<B, 1>(&[&format!("{p}.attn.c_attn.bias")], device)?;
        ensure!(
            fused_w.dims() == [d, 3 * d],
            "block {index} c_attn is {:?}, expected [{d}, {}]",
            fused_w.dims(), 3 * d
        );
        let part = |i: usize| {
            linear_from(
                fused_w.clone().slice([0..d, i * d..(i + 1) * d]),
                fused_b.clone().slice([i * d..(i + 1) * d]),
            )
        };

        let attn = attention_from(
            part(0),
            part(1),
            part(2),
            load_conv1d(store, &format!("{p}.attn.c_proj"), device)?,
            self.n_head,
        )?;

        Ok(DecoderBlock {
            ln_1:   load_layer_norm(store, &format!("{p}.ln_1"), self.layer_norm_epsilon, device)?,
            attn,
            ln_2:   load_layer_norm(store, &format!("{p}.ln_2"), self.layer_norm_epsilon, device)?,
            c_fc:   load_conv1d(store, &format!("{p}.mlp.c_fc"), device)?,
            c_proj: load_conv1d(store, &format!("{p}.mlp.c_proj"), device)?,
        })
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub ln_1:   LayerNorm<B>,
    pub attn:   MultiHeadAttention<B>,
    pub ln_2:   LayerNorm<B>,
    pub c_fc:   Linear<B>,
    pub c_proj: Linear<B>,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = x.dims();
        let mask = generate_autoregressive_mask::<B>(batch, seq_len, &x.device());
        let input = MhaInput::self_attn(self.ln_1.forward(x.clone())).mask_attn(mask);

        let x = x + self.attn.forward(input).context;
        let mlp = self.c_proj.forward(gelu_tanh(self.c_fc.forward(self.ln_2.forward(x.clone()))));
        x + mlp
    }
}

#[derive(Module, Debug)]
pub struct Gpt2Lm<B: Backend> {
    pub wte:         Embedding<B>,
    pub wpe:         Embedding<B>,
    pub blocks:      Vec<DecoderBlock<B>>,
    pub ln_f:        LayerNorm<B>,
    pub n_positions: usize,
}

impl<B: Backend> Gpt2Lm<B> {
    /// input_ids: [seq_len] → logits for the token after the last one: [vocab]
    pub fn next_token_logits(&self, input_ids: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        let [seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device);
        let tok_emb   = self.wte.forward(input_ids.unsqueeze::<2>());
        let pos_emb   = self.wpe.forward(positions.unsqueeze::<2>());

        let mut h = tok_emb + pos_emb;
        for block in &self.blocks {
            h = block.forward(h);
        }
        let h = self.ln_f.forward(h);

        let [_, _, d_model] = h.dims();
        let last = h
            .slice([0..1, seq_len - 1..seq_len, 0..d_model])
            .reshape([1, d_model]);

        // Tied head: logits = h_last · wteᵀ
        let logits = last.matmul(self.wte.weight.val().transpose());
        let [_, vocab] = logits.dims();
        logits.reshape([vocab])
    }
}
