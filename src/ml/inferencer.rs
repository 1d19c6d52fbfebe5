// ============================================================
// Layer 5 — Extractive QA Inferencer
// ============================================================
// Wraps the DistilBERT span model and its tokenizer behind the
// AnswerExtractor trait.
//
// A context longer than the model's window is read in several
// overlapping passes:
//
//   [CLS] question [SEP] context window 1 [SEP]
//   [CLS] question [SEP] context window 2 [SEP]
//   ...
//
// In each pass the start/end logits of everything that is not
// context (except [CLS]) are masked out, both rows are turned
// into probabilities, and the best span with start ≤ end and at
// most MAX_ANSWER_LEN tokens is scored p(start)·p(end). The best
// span over all passes wins; its answer text is cut from the
// original context using the tokenizer's byte offsets.

use std::ops::Range;

use anyhow::{anyhow, ensure, Context, Result};
use burn::prelude::*;
use parking_lot::Mutex;
use tokenizers::Tokenizer;

use crate::data::chunker::Chunker;
use crate::domain::query::ExtractionResult;
use crate::domain::traits::AnswerExtractor;
use crate::infra::hub::ModelFiles;
use crate::ml::distilbert::{DistilBertConfig, DistilBertQa};
use crate::ml::weights::WeightStore;

const MAX_SEQ_LEN:    usize = 384;
const DOC_STRIDE:     usize = 128;
const MAX_ANSWER_LEN: usize = 15;
/// Logit given to positions that can never start or end an answer
const MASKED_LOGIT:   f32 = -10_000.0;

/// A scored span, token indices relative to one context window (inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCandidate {
    pub start: usize,
    pub end:   usize,
    pub score: f32,
}

pub struct QaInferencer<B: Backend> {
    model:       Mutex<DistilBertQa<B>>,
    tokenizer:   Tokenizer,
    device:      B::Device,
    cls_id:      u32,
    sep_id:      u32,
    max_seq_len: usize,
}

impl<B: Backend> QaInferencer<B> {
    pub fn load(files: &ModelFiles, device: B::Device) -> Result<Self> {
        let config_json = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Cannot read '{}'", files.config.display()))?;
        let config = DistilBertConfig::from_json(&config_json)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Cannot load tokenizer '{}': {e}", files.tokenizer.display()))?;

        let store = WeightStore::open(&files.weights)?.with_prefix("distilbert.");
        let model = config.load::<B>(&store, &device)?;

        Ok(Self::new(model, tokenizer, device))
    }

    pub fn new(model: DistilBertQa<B>, tokenizer: Tokenizer, device: B::Device) -> Self {
        let cls_id = tokenizer.token_to_id("[CLS]").unwrap_or(101);
        let sep_id = tokenizer.token_to_id("[SEP]").unwrap_or(102);
        let max_seq_len = MAX_SEQ_LEN.min(model.max_seq_len);
        Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            cls_id,
            sep_id,
            max_seq_len,
        }
    }

    /// Start and end logits for one `[CLS] q [SEP] ctx [SEP]` sequence.
    fn logits(&self, input_ids: &[u32]) -> Result<(Vec<f32>, Vec<f32>)> {
        let ids: Vec<i32> = input_ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device);

        let output = self.model.lock().forward(input);
        let start = output.start_logits.into_data().to_vec::<f32>()
            .map_err(|e| anyhow!("start logits: {e:?}"))?;
        let end = output.end_logits.into_data().to_vec::<f32>()
            .map_err(|e| anyhow!("end logits: {e:?}"))?;
        Ok((start, end))
    }
}

impl<B: Backend> AnswerExtractor for QaInferencer<B> {
    fn extract(&self, question: &str, context: &str) -> Result<ExtractionResult> {
        let q_enc = self.tokenizer.encode(question, false)
            .map_err(|e| anyhow!("Question tokenise: {e}"))?;
        let c_enc = self.tokenizer.encode(context, false)
            .map_err(|e| anyhow!("Context tokenise: {e}"))?;

        let q_ids   = q_enc.get_ids();
        let c_ids   = c_enc.get_ids();
        let offsets = c_enc.get_offsets();
        // An empty question still yields [CLS] [SEP] ctx [SEP]
        ensure!(!c_ids.is_empty(), "the context contains no tokens");

        // [CLS] + question + [SEP] + window + [SEP]
        let window = self.max_seq_len.saturating_sub(q_ids.len() + 3);
        ensure!(window > 0, "the question is too long ({} tokens)", q_ids.len());
        let chunker = Chunker::new(window, DOC_STRIDE.min(window / 2));

        let context_start = q_ids.len() + 2;
        let mut best: Option<(Range<usize>, SpanCandidate)> = None;

        for range in chunker.windows(c_ids.len()) {
            let mut input_ids = Vec::with_capacity(context_start + range.len() + 1);
            input_ids.push(self.cls_id);
            input_ids.extend_from_slice(q_ids);
            input_ids.push(self.sep_id);
            input_ids.extend_from_slice(&c_ids[range.clone()]);
            input_ids.push(self.sep_id);

            let (start_logits, end_logits) = self.logits(&input_ids)?;
            let allowed = context_start..context_start + range.len();
            let Some(span) = score_window(&start_logits, &end_logits, allowed, MAX_ANSWER_LEN) else {
                continue;
            };
            tracing::debug!("Window {:?} best span [{},{}] score={:.4}", range, span.start, span.end, span.score);

            if best.as_ref().map_or(true, |(_, b)| span.score > b.score) {
                best = Some((range, span));
            }
        }

        let (range, span) = best.ok_or_else(|| anyhow!("no answer span found"))?;
        let first = range.start + span.start;
        let last  = range.start + span.end;
        let (byte_start, byte_end) = (offsets[first].0, offsets[last].1);
        let answer = context
            .get(byte_start..byte_end)
            .ok_or_else(|| anyhow!("answer offsets {byte_start}..{byte_end} do not fall on character boundaries"))?;

        Ok(ExtractionResult::new(answer, span.score))
    }
}

/// Softmax over `logits` after every position outside `allowed` (other than
/// the leading [CLS]) has been pushed to MASKED_LOGIT.
pub fn masked_softmax(logits: &[f32], allowed: &Range<usize>) -> Vec<f32> {
    let masked: Vec<f32> = logits
        .iter()
        .enumerate()
        .map(|(i, &l)| if i == 0 || allowed.contains(&i) { l } else { MASKED_LOGIT })
        .collect();
    let max = masked.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = masked.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Best span inside `allowed` by p(start)·p(end), with start ≤ end < start + max_len.
/// Indices in the result are relative to `allowed.start`.
pub fn score_window(
    start_logits: &[f32],
    end_logits:   &[f32],
    allowed:      Range<usize>,
    max_len:      usize,
) -> Option<SpanCandidate> {
    let p_start = masked_softmax(start_logits, &allowed);
    let p_end   = masked_softmax(end_logits, &allowed);
    let upper   = allowed.end.min(p_start.len()).min(p_end.len());

    let mut best: Option<SpanCandidate> = None;
    for s in allowed.start..upper {
        for e in s..(s + max_len).min(upper) {
            let score = p_start[s] * p_end[e];
            if best.map_or(true, |b| score > b.score) {
                best = Some(SpanCandidate {
                    start: s - allowed.start,
                    end:   e - allowed.start,
                    score,
                });
            }
        }
    }
    best
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::ml::weights::tests::safetensors_bytes;

    type B = burn::backend::NdArray;

    #[test]
    fn test_masked_softmax_sums_to_one() {
        let p = masked_softmax(&[0.5, 1.0, 2.0, 3.0, 9.0], &(2..4));
        let total: f32 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_masked_positions_get_no_mass() {
        // Position 4 has the largest logit but is outside the context
        let p = masked_softmax(&[0.0, 0.0, 1.0, 1.0, 50.0], &(2..4));
        assert!(p[4] < 1e-6);
        assert!(p[1] < 1e-6);
        assert!(p[0] > 0.0);
    }

    #[test]
    fn test_best_span_prefers_high_start_and_end() {
        //            CLS  q   SEP  c0   c1   c2   SEP
        let start = [0.0, 0.0, 0.0, 0.0, 6.0, 0.0, 0.0];
        let end   = [0.0, 0.0, 0.0, 0.0, 0.0, 6.0, 0.0];
        let span  = score_window(&start, &end, 3..6, 15).unwrap();
        assert_eq!((span.start, span.end), (1, 2));
        assert!(span.score > 0.0 && span.score <= 1.0);
    }

    #[test]
    fn test_end_never_precedes_start() {
        let start = [0.0, 0.0, 0.0, 0.0, 9.0];
        let end   = [0.0, 0.0, 9.0, 0.0, 0.0];
        let span  = score_window(&start, &end, 2..5, 15).unwrap();
        assert!(span.start <= span.end);
    }

    #[test]
    fn test_span_length_is_bounded() {
        let start = [0.0, 9.0, 0.0, 0.0, 0.0, 0.0];
        let end   = [0.0, 0.0, 0.0, 0.0, 0.0, 9.0];
        let span  = score_window(&start, &end, 1..6, 2).unwrap();
        assert!(span.end - span.start < 2);
    }

    #[test]
    fn test_cls_is_never_an_answer() {
        let start = [20.0, 0.0, 0.0];
        let end   = [20.0, 0.0, 0.0];
        let span  = score_window(&start, &end, 1..3, 15).unwrap();
        assert!(span.start < 2 && span.end < 2);
    }

    #[test]
    fn test_empty_window_has_no_span() {
        assert!(score_window(&[0.0, 0.0], &[0.0, 0.0], 2..2, 15).is_none());
    }

    // ─── End to end on a toy model ───────────────────────────────────────────

    pub(crate) const TOKENIZER: &str = r#"{
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
            "vocab": {
                "[UNK]": 0, "[CLS]": 1, "[SEP]": 2, "what": 3,
                "is": 4, "fast": 5, "light": 6, "very": 7
            },
            "unk_token": "[UNK]"
        }
    }"#;

    pub(crate) const CONFIG: &str = r#"{"vocab_size": 8, "max_position_embeddings": 64, "dim": 4,
        "n_layers": 1, "n_heads": 2, "hidden_dim": 8}"#;

    /// safetensors bytes for the toy model, encoder keys under `prefix`.
    pub(crate) fn toy_checkpoint(prefix: &str) -> Vec<u8> {
        let mut entries: Vec<(String, Vec<usize>, Vec<f32>)> = vec![
            (format!("{prefix}embeddings.word_embeddings.weight"), vec![8, 4], (0..32).map(|i| ((i * 7) % 11) as f32 * 0.1).collect()),
            (format!("{prefix}embeddings.position_embeddings.weight"), vec![64, 4], (0..256).map(|i| ((i * 3) % 5) as f32 * 0.01).collect()),
            (format!("{prefix}embeddings.LayerNorm.weight"), vec![4], vec![1.0; 4]),
            (format!("{prefix}embeddings.LayerNorm.bias"), vec![4], vec![0.0; 4]),
            ("qa_outputs.weight".into(), vec![2, 4], vec![0.3, -0.2, 0.1, 0.4, -0.1, 0.2, 0.5, -0.3]),
            ("qa_outputs.bias".into(), vec![2], vec![0.0, 0.0]),
        ];
        let p = format!("{prefix}transformer.layer.0");
        for lin in ["q_lin", "k_lin", "v_lin", "out_lin"] {
            entries.push((format!("{p}.attention.{lin}.weight"), vec![4, 4], vec![0.05; 16]));
            entries.push((format!("{p}.attention.{lin}.bias"), vec![4], vec![0.0; 4]));
        }
        entries.push((format!("{p}.ffn.lin1.weight"), vec![8, 4], vec![0.02; 32]));
        entries.push((format!("{p}.ffn.lin1.bias"), vec![8], vec![0.0; 8]));
        entries.push((format!("{p}.ffn.lin2.weight"), vec![4, 8], vec![0.02; 32]));
        entries.push((format!("{p}.ffn.lin2.bias"), vec![4], vec![0.0; 4]));
        for ln in ["sa_layer_norm", "output_layer_norm"] {
            entries.push((format!("{p}.{ln}.weight"), vec![4], vec![1.0; 4]));
            entries.push((format!("{p}.{ln}.bias"), vec![4], vec![0.0; 4]));
        }
        let borrowed: Vec<(&str, Vec<usize>, Vec<f32>)> = entries
            .iter()
            .map(|(n, s, d)| (n.as_str(), s.clone(), d.clone()))
            .collect();
        safetensors_bytes(&borrowed)
    }

    /// Writes config.json, tokenizer.json and model.safetensors into `dir`.
    pub(crate) fn write_toy_model(dir: &std::path::Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("config.json"), CONFIG).unwrap();
        std::fs::write(dir.join("tokenizer.json"), TOKENIZER).unwrap();
        std::fs::write(dir.join("model.safetensors"), toy_checkpoint("distilbert.")).unwrap();
    }

    fn toy_inferencer() -> QaInferencer<B> {
        let config = DistilBertConfig::from_json(CONFIG).unwrap();
        let store  = WeightStore::from_bytes(&toy_checkpoint("")).unwrap();
        let device = Default::default();
        let model  = config.load::<B>(&store, &device).unwrap();
        let tokenizer = Tokenizer::from_str(TOKENIZER).unwrap();
        QaInferencer::new(model, tokenizer, device)
    }

    #[test]
    fn test_answer_is_cut_from_the_context() {
        let qa = toy_inferencer();
        let context = "light is very fast";
        let result  = qa.extract("what is fast", context).unwrap();

        assert!(!result.answer.is_empty());
        assert!(context.contains(&result.answer));
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn test_same_input_same_answer() {
        let qa = toy_inferencer();
        let first  = qa.extract("what is fast", "light is very fast").unwrap();
        let second = qa.extract("what is fast", "light is very fast").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_context_is_read_in_windows() {
        let mut qa = toy_inferencer();
        qa.max_seq_len = 10;
        let context = "light is very fast ".repeat(6);
        let result  = qa.extract("what is fast", context.trim_end()).unwrap();
        assert!(context.contains(&result.answer));
    }

    #[test]
    fn test_whitespace_context_is_an_error() {
        let qa = toy_inferencer();
        assert!(qa.extract("what is fast", "   ").is_err());
    }

    #[test]
    fn test_whitespace_question_still_answers() {
        let qa = toy_inferencer();
        let context = "light is very fast";
        let result  = qa.extract("   ", context).unwrap();
        assert!(context.contains(&result.answer));
    }

    #[test]
    fn test_loads_from_model_files() {
        let dir = std::env::temp_dir().join(format!("qa_explainer_toy_qa_{}", std::process::id()));
        write_toy_model(&dir);
        let files = ModelFiles {
            config:    dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights:   dir.join("model.safetensors"),
        };

        let qa = QaInferencer::<B>::load(&files, Default::default()).unwrap();
        assert!(qa.extract("what is fast", "light is very fast").is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
