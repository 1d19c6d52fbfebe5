// ============================================================
// Layer 5 — DistilBERT Question-Answering Model
// ============================================================
// A 6-layer transformer encoder with a span-prediction head,
// loaded from the `distilbert-base-uncased-distilled-squad`
// checkpoint:
//   • Token embeddings + learned positional embeddings
//   • Embedding LayerNorm
//   • Post-norm encoder blocks (attention → add & norm,
//     GELU feed-forward → add & norm)
//   • Q&A head: 2 logits per token (start, end)
//
// Reference: Sanh et al. (2019) DistilBERT
//            Devlin et al. (2019) BERT

use anyhow::{ensure, Result};
use burn::nn::attention::{MhaInput, MultiHeadAttention};
use burn::nn::{Embedding, LayerNorm, Linear};
use burn::prelude::*;
use burn::tensor::activation;
use serde::Deserialize;

use crate::ml::layers::{attention_from, load_embedding, load_layer_norm, load_linear};
use crate::ml::weights::WeightStore;

const LAYER_NORM_EPS: f64 = 1e-12;

/// The fields of the HuggingFace `config.json` this model needs.
#[derive(Debug, Clone, Deserialize)]
pub struct DistilBertConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub dim:                     usize,
    pub n_layers:                usize,
    pub n_heads:                 usize,
    pub hidden_dim:              usize,
}

impl DistilBertConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<B: Backend>(&self, store: &WeightStore, device: &B::Device) -> Result<DistilBertQa<B>> {
        let token_embedding    = load_embedding(store, "embeddings.word_embeddings.weight", device)?;
        let position_embedding = load_embedding(store, "embeddings.position_embeddings.weight", device)?;
        let embedding_norm     = load_layer_norm(store, "embeddings.LayerNorm", LAYER_NORM_EPS, device)?;
        ensure!(
            token_embedding.weight.val().dims() == [self.vocab_size, self.dim],
            "word embeddings are {:?}, config says [{}, {}]",
            token_embedding.weight.val().dims(), self.vocab_size, self.dim
        );

        let layers = (0..self.n_layers)
            .map(|i| self.load_encoder_block(store, i, device))
            .collect::<Result<Vec<_>>>()?;

        let qa_head = load_linear(store, "qa_outputs", device)?;

        Ok(DistilBertQa {
            token_embedding,
            position_embedding,
            embedding_norm,
            layers,
            qa_head,
            max_seq_len: self.max_position_embeddings,
        })
    }

    fn load_encoder_block<B: Backend>(
        &self,
        store:  &WeightStore,
        index:  usize,
        device: &B::Device,
    ) -> Result<EncoderBlock<B>> {
        let p = format!("transformer.layer.{index}");
        let self_attn = attention_from(
            load_linear(store, &format!("{p}.attention.q_lin"), device)?,
            load_linear(store, &format!("{p}.attention.k_lin"), device)?,
            load_linear(store, &format!("{p}.attention.v_lin"), device)?,
            load_linear(store, &format!("{p}.attention.out_lin"), device)?,
            self.n_heads,
        )?;
        let ffn_linear1 = load_linear(store, &format!("{p}.ffn.lin1"), device)?;
        ensure!(
            ffn_linear1.weight.val().dims() == [self.dim, self.hidden_dim],
            "layer {index} feed-forward is {:?}, config says [{}, {}]",
            ffn_linear1.weight.val().dims(), self.dim, self.hidden_dim
        );
        Ok(EncoderBlock {
            self_attn,
            ffn_linear1,
            ffn_linear2: load_linear(store, &format!("{p}.ffn.lin2"), device)?,
            norm1:       load_layer_norm(store, &format!("{p}.sa_layer_norm"), LAYER_NORM_EPS, device)?,
            norm2:       load_layer_norm(store, &format!("{p}.output_layer_norm"), LAYER_NORM_EPS, device)?,
        })
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + attn_output);
        let ffn_out = self.ffn_linear2.forward(
            activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + ffn_out)
    }
}

#[derive(Module, Debug)]
pub struct DistilBertQa<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub embedding_norm:     LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub qa_head:            Linear<B>,
    pub max_seq_len:        usize,
}

pub struct QaModelOutput<B: Backend> {
    pub start_logits: Tensor<B, 2>,
    pub end_logits:   Tensor<B, 2>,
}

impl<B: Backend> DistilBertQa<B> {
    /// input_ids: [seq_len] → start_logits, end_logits: [1, seq_len]
    pub fn forward(&self, input_ids: Tensor<B, 1, Int>) -> QaModelOutput<B> {
        let [seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device);
        let tok_emb = self.token_embedding.forward(input_ids.unsqueeze::<2>());
        let pos_emb = self.position_embedding.forward(positions.unsqueeze::<2>());

        let mut x = self.embedding_norm.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x);
        }

        // Project to 2 logits per token then split into start / end.
        let logits = self.qa_head.forward(x); // [1, seq_len, 2]
        let start_logits = logits.clone()
            .slice([0..1, 0..seq_len, 0..1])
            .reshape([1, seq_len]);
        let end_logits = logits
            .slice([0..1, 0..seq_len, 1..2])
            .reshape([1, seq_len]);

        QaModelOutput { start_logits, end_logits }
    }
}
