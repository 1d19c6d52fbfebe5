// ============================================================
// Layer 5 — Text Generation Inferencer
// ============================================================
// Wraps the GPT-2 language model and its tokenizer behind the
// TextGenerator trait.
//
// Decoding is plain autoregression without a key/value cache:
// every step runs the whole sequence and reads the logits of
// the last position. That is cheap enough for the ~100 tokens
// an explanation needs.
//
//   prompt ids ──► model ──► next id ──► append ──┐
//        ▲                                        │
//        └────────────────────────────────────────┘
//   until eos (or the pad id, when one is set), max_length
//   or the model's n_positions

use anyhow::{anyhow, Context, Result};
use burn::prelude::*;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokenizers::Tokenizer;

use crate::domain::traits::{GenerationParams, TextGenerator};
use crate::infra::hub::ModelFiles;
use crate::ml::gpt2::{Gpt2Config, Gpt2Lm};
use crate::ml::sampling::{greedy, sample_token, SamplingConfig};
use crate::ml::weights::WeightStore;

pub struct TextGenerationInferencer<B: Backend> {
    model:        Mutex<Gpt2Lm<B>>,
    tokenizer:    Tokenizer,
    device:       B::Device,
    eos_token_id: u32,
}

impl<B: Backend> TextGenerationInferencer<B> {
    pub fn load(files: &ModelFiles, device: B::Device) -> Result<Self> {
        let config_json = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Cannot read '{}'", files.config.display()))?;
        let config = Gpt2Config::from_json(&config_json)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Cannot load tokenizer '{}': {e}", files.tokenizer.display()))?;

        let store = WeightStore::open(&files.weights)?.with_prefix("transformer.");
        let model = config.load::<B>(&store, &device)?;

        Ok(Self::new(model, tokenizer, device, config.eos_token_id))
    }

    pub fn new(model: Gpt2Lm<B>, tokenizer: Tokenizer, device: B::Device, eos_token_id: u32) -> Self {
        Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            eos_token_id,
        }
    }

    fn continue_ids(&self, prompt_ids: &[u32], params: &GenerationParams, rng: &mut StdRng) -> Result<Vec<u32>> {
        let model = self.model.lock();
        let limit = params.max_length.min(model.n_positions);
        let sampling = SamplingConfig {
            temperature: params.temperature,
            top_k:       params.top_k,
            top_p:       params.top_p,
        };

        let mut ids = prompt_ids.to_vec();
        while ids.len() < limit {
            let input: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
            let logits = model
                .next_token_logits(Tensor::<B, 1, Int>::from_ints(input.as_slice(), &self.device))
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("next-token logits: {e:?}"))?;

            let next = if params.do_sample {
                sample_token(&logits, &sampling, rng)?
            } else {
                greedy(&logits)?
            };
            if next == self.eos_token_id || params.pad_token_id == Some(next) {
                break;
            }
            ids.push(next);
        }
        Ok(ids)
    }
}

impl<B: Backend> TextGenerator for TextGenerationInferencer<B> {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Vec<String>> {
        let encoding = self.tokenizer.encode(prompt, false)
            .map_err(|e| anyhow!("Prompt tokenise: {e}"))?;
        let prompt_ids = encoding.get_ids();

        if prompt_ids.len() >= params.max_length {
            tracing::debug!("Prompt already has {} tokens, nothing to generate", prompt_ids.len());
            return Ok(vec![prompt.to_string(); params.num_return_sequences]);
        }

        let mut rng = StdRng::from_entropy();
        (0..params.num_return_sequences)
            .map(|_| {
                let ids = self.continue_ids(prompt_ids, params, &mut rng)?;
                tracing::debug!("Generated {} new tokens", ids.len() - prompt_ids.len());
                self.tokenizer
                    .decode(&ids, true)
                    .map_err(|e| anyhow!("Decode: {e}"))
            })
            .collect()
    }

    fn eos_token_id(&self) -> Option<u32> {
        Some(self.eos_token_id)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::ml::weights::tests::safetensors_bytes;

    type B = burn::backend::NdArray;

    const TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "<unk>": 0, "the": 1, "sky": 2, "is": 3, "blue": 4, "<eos>": 5 },
            "unk_token": "<unk>"
        }
    }"#;

    /// One-block model whose weights make the output depend on the input.
    fn toy_generator(eos: u32) -> TextGenerationInferencer<B> {
        let config = Gpt2Config::from_json(
            r#"{"vocab_size": 6, "n_positions": 12, "n_embd": 4, "n_layer": 1, "n_head": 2}"#,
        ).unwrap();

        let mut entries: Vec<(String, Vec<usize>, Vec<f32>)> = vec![
            ("wte.weight".into(), vec![6, 4], (0..24).map(|i| ((i * 5) % 7) as f32 * 0.2 - 0.6).collect()),
            ("wpe.weight".into(), vec![12, 4], vec![0.0; 48]),
            ("ln_f.weight".into(), vec![4], vec![1.0; 4]),
            ("ln_f.bias".into(), vec![4], vec![0.0; 4]),
            ("h.0.attn.c_attn.weight".into(), vec![4, 12], vec![0.01; 48]),
            ("h.0.attn.c_attn.bias".into(), vec![12], vec![0.0; 12]),
            ("h.0.attn.c_proj.weight".into(), vec![4, 4], vec![0.01; 16]),
            ("h.0.attn.c_proj.bias".into(), vec![4], vec![0.0; 4]),
            ("h.0.mlp.c_fc.weight".into(), vec![4, 16], vec![0.01; 64]),
            ("h.0.mlp.c_fc.bias".into(), vec![16], vec![0.0; 16]),
            ("h.0.mlp.c_proj.weight".into(), vec![16, 4], vec![0.01; 64]),
            ("h.0.mlp.c_proj.bias".into(), vec![4], vec![0.0; 4]),
        ];
        for ln in ["ln_1", "ln_2"] {
            entries.push((format!("h.0.{ln}.weight"), vec![4], vec![1.0; 4]));
            entries.push((format!("h.0.{ln}.bias"), vec![4], vec![0.0; 4]));
        }
        let borrowed: Vec<(&str, Vec<usize>, Vec<f32>)> = entries
            .iter()
            .map(|(n, s, d)| (n.as_str(), s.clone(), d.clone()))
            .collect();

        let store  = WeightStore::from_bytes(&safetensors_bytes(&borrowed)).unwrap();
        let device = Default::default();
        let model  = config.load::<B>(&store, &device).unwrap();
        TextGenerationInferencer::new(model, Tokenizer::from_str(TOKENIZER).unwrap(), device, eos)
    }

    fn params(max_length: usize, do_sample: bool) -> GenerationParams {
        GenerationParams {
            max_length,
            do_sample,
            temperature: 0.7,
            top_p: 0.9,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn test_output_starts_with_the_prompt() {
        let gen = toy_generator(99);
        let out = gen.generate("the sky is", &params(8, false)).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("the sky is"));
    }

    #[test]
    fn test_length_bound_counts_the_prompt() {
        let gen = toy_generator(99);
        let out = gen.generate("the sky is", &params(5, true)).unwrap();
        // WordLevel decoding joins tokens with single spaces
        assert!(out[0].split_whitespace().count() <= 5);
    }

    #[test]
    fn test_length_bound_is_capped_by_model_positions() {
        let gen = toy_generator(99);
        let out = gen.generate("the sky", &params(1000, false)).unwrap();
        assert!(out[0].split_whitespace().count() <= 12);
    }

    #[test]
    fn test_prompt_at_max_length_is_returned_unchanged() {
        let gen = toy_generator(99);
        let out = gen.generate("the sky is blue", &params(4, true)).unwrap();
        assert_eq!(out, vec!["the sky is blue".to_string()]);
    }

    #[test]
    fn test_greedy_decoding_is_deterministic() {
        let gen = toy_generator(99);
        let a = gen.generate("the sky", &params(7, false)).unwrap();
        let b = gen.generate("the sky", &params(7, false)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_one_text_per_requested_sequence() {
        let gen = toy_generator(99);
        let p = GenerationParams { num_return_sequences: 3, ..params(6, true) };
        assert_eq!(gen.generate("the sky", &p).unwrap().len(), 3);
    }

    #[test]
    fn test_eos_id_is_reported() {
        assert_eq!(toy_generator(5).eos_token_id(), Some(5));
    }

    #[test]
    fn test_pad_token_ends_the_sequence() {
        let gen = toy_generator(99);
        let free = gen.generate("the sky", &params(3, false)).unwrap();
        let first = free[0].split_whitespace().nth(2).unwrap();
        let pad = gen.tokenizer.token_to_id(first).unwrap();

        let p = GenerationParams { pad_token_id: Some(pad), ..params(3, false) };
        assert_eq!(gen.generate("the sky", &p).unwrap(), vec!["the sky".to_string()]);
    }
}
