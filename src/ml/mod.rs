// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer builds tensors; the application layer only
// sees the AnswerExtractor / TextGenerator traits implemented
// here.
//
// What's in this layer:
//
//   weights.rs    — safetensors checkpoint reader
//
//   layers.rs     — loads burn::nn Linear, LayerNorm, Embedding
//                   and MultiHeadAttention from a checkpoint;
//                   tanh-GELU
//
//   distilbert.rs — DistilBERT encoder + span head
//                   (distilbert-base-uncased-distilled-squad)
//
//   gpt2.rs       — GPT-2 decoder + tied LM head (distilgpt2)
//
//   sampling.rs   — greedy / temperature, top-k, top-p sampling
//
//   inferencer.rs — extractive QA over sliding context windows
//
//   generator.rs  — autoregressive text continuation
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

/// Backend for a detected GPU adapter
pub type GpuBackend = burn::backend::Wgpu;

/// Backend when no GPU adapter is usable
pub type CpuBackend = burn::backend::NdArray;

/// Named f32 tensors read from `model.safetensors`
pub mod weights;

/// Transformer building blocks shared by both models
pub mod layers;

/// DistilBERT question-answering model
pub mod distilbert;

/// GPT-2 language model
pub mod gpt2;

/// Next-token selection strategies
pub mod sampling;

/// Extractive QA inference engine
pub mod inferencer;

/// Text generation inference engine
pub mod generator;
