// ============================================================
// Layer 5 — Discourse Tagger
// ============================================================
// Inference service: one trained network plus everything needed
// to feed it and read it back.
//
//   Chunk ──SequenceEncoder──▶ EncodedChunk
//         ──ChunkBatcher──▶ ChunkBatch
//         ──DiscourseTaggerModel──▶ scores [N, S, L]
//         ──LabelDecoder (true positions only)──▶ ids + confidences
//         ──LabelIndex + BIO collapse──▶ DiscourseLabel per sentence
//
// A chunk longer than the trained max_seq_len loses its leading
// sentences in the encoder. Those sentences are labelled "none"
// with probability 0 and a warning is logged, so the output always
// has one label per input sentence.
//
// Loaded once and only read afterwards; predict takes &self.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::batcher::ChunkBatcher;
use crate::data::encoder::{EncodedChunk, EncoderSettings, SequenceEncoder};
use crate::domain::error::HighlightError;
use crate::domain::label::{DiscourseLabel, LabelIndex};
use crate::domain::sentence::Chunk;
use crate::domain::traits::RepresentationSource;
use crate::domain::variant::ModelVariant;
use crate::infra::artifacts::ArtifactStore;
use crate::ml::decoder::{ArgmaxDecoder, CrfDecoder, LabelDecoder, ScoreMatrix};
use crate::ml::model::{attention_context, DiscourseTaggerModel, TaggerConfig};

/// Chunks per forward pass unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Labels and confidences for one chunk, aligned with its sentences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    pub labels:        Vec<DiscourseLabel>,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

pub struct DiscourseTagger<B: Backend> {
    model:      DiscourseTaggerModel<B>,
    config:     TaggerConfig,
    labels:     LabelIndex,
    encoder:    SequenceEncoder,
    batcher:    ChunkBatcher<B>,
    decoder:    Box<dyn LabelDecoder + Send + Sync>,
    batch_size: usize,
}

impl<B: Backend> DiscourseTagger<B> {
    /// Load the artifacts of `variant` from `store`.
    pub fn from_store(
        store:           &ArtifactStore,
        variant:         ModelVariant,
        representations: Arc<dyn RepresentationSource + Send + Sync>,
        tokenizer:       Option<Tokenizer>,
        lowercase:       bool,
        device:          B::Device,
    ) -> Result<Self> {
        let loaded = store.load::<B>(variant, &device)?;
        Self::from_parts(loaded.model, loaded.config, loaded.labels, representations, tokenizer, lowercase, device)
    }

    pub fn from_parts(
        model:           DiscourseTaggerModel<B>,
        config:          TaggerConfig,
        labels:          LabelIndex,
        representations: Arc<dyn RepresentationSource + Send + Sync>,
        tokenizer:       Option<Tokenizer>,
        lowercase:       bool,
        device:          B::Device,
    ) -> Result<Self> {
        if labels.len() != config.num_labels {
            return Err(HighlightError::InvalidLabelIndex(format!(
                "{} labels for a tagger with {} outputs",
                labels.len(),
                config.num_labels
            ))
            .into());
        }
        if representations.dim() != config.input_size {
            return Err(HighlightError::ShapeMismatch {
                expected: format!("representations of width {}", config.input_size),
                actual:   format!("width {}", representations.dim()),
            }
            .into());
        }
        if config.variant.use_attention && config.max_clause_len.is_none() {
            return Err(anyhow!("tagger uses attention but its topology has no max_clause_len"));
        }

        let decoder: Box<dyn LabelDecoder + Send + Sync> = match &model.crf {
            Some(layer) => Box::new(CrfDecoder::from_layer(layer)?),
            None        => Box::new(ArgmaxDecoder),
        };

        let settings = EncoderSettings {
            max_seq_len:    config.max_seq_len,
            max_clause_len: config.clause_len(),
            lowercase,
        };
        let encoder = SequenceEncoder::new(representations, settings).with_tokenizer(tokenizer);

        tracing::info!(
            "Tagger ready: {} labels, max_seq_len={}, attention={:?}, crf={}",
            labels.len(),
            config.max_seq_len,
            attention_context(&config),
            config.variant.crf
        );

        Ok(Self {
            model,
            config,
            labels,
            encoder,
            batcher: ChunkBatcher::new(device),
            decoder,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn max_seq_len(&self) -> usize {
        self.config.max_seq_len
    }

    pub fn variant(&self) -> ModelVariant {
        self.config.variant
    }

    /// Tag one chunk. An empty chunk gives an empty prediction.
    #[allow(dead_code)] // the pipeline tags through predict_batch
    pub fn predict(&self, chunk: &Chunk) -> Result<Prediction> {
        let mut out = self.predict_batch(std::slice::from_ref(chunk))?;
        Ok(out.pop().unwrap_or_default())
    }

    /// Tag many chunks, `batch_size` per forward pass. The result has
    /// one Prediction per input chunk, in order.
    pub fn predict_batch(&self, chunks: &[Chunk]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(chunks.len());

        for group in chunks.chunks(self.batch_size) {
            let encoded: Vec<EncodedChunk> = group
                .iter()
                .filter(|c| !c.is_empty())
                .map(|c| self.encoder.encode(c))
                .collect();

            let mut decoded = if encoded.is_empty() {
                Vec::new()
            } else {
                self.run(&encoded)?
            }
            .into_iter();

            for chunk in group {
                if chunk.is_empty() {
                    predictions.push(Prediction::default());
                    continue;
                }
                let prediction = decoded
                    .next()
                    .ok_or_else(|| anyhow!("tagger returned fewer sequences than chunks"))?;
                tracing::info!("Tagged {} sentences", prediction.len());
                predictions.push(prediction);
            }
        }

        Ok(predictions)
    }

    fn run(&self, encoded: &[EncodedChunk]) -> Result<Vec<Prediction>> {
        let batch  = self.batcher.batch(encoded)?;
        let scores = self.model.forward(batch);

        let [n, s, l] = scores.dims();
        let values    = scores
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read tagger output: {e:?}"))?;

        encoded
            .iter()
            .enumerate()
            .take(n)
            .map(|(i, enc)| {
                // Real sentences sit in the last `kept` rows.
                let start = (i * s + (s - enc.kept)) * l;
                let end   = (i + 1) * s * l;
                let rows  = ScoreMatrix::new(enc.kept, l, values[start..end].to_vec());
                Ok(self.to_prediction(enc, &rows))
            })
            .collect()
    }

    fn to_prediction(&self, enc: &EncodedChunk, scores: &ScoreMatrix) -> Prediction {
        let path = self.decoder.decode(scores);

        if enc.vocabulary_misses > 0 {
            tracing::debug!("{} tokens missing from the vocabulary in this chunk", enc.vocabulary_misses);
        }

        let dropped = enc.dropped();
        let mut labels        = Vec::with_capacity(enc.sentence_count);
        let mut probabilities = Vec::with_capacity(enc.sentence_count);

        if dropped > 0 {
            tracing::warn!(
                "Sequence of {} sentences is longer than the trained maximum of {}; labelling the first {} as none",
                enc.sentence_count,
                enc.max_seq_len,
                dropped
            );
            labels.extend(std::iter::repeat(DiscourseLabel::None).take(dropped));
            probabilities.extend(std::iter::repeat(0.0).take(dropped));
        }

        labels.extend(path.label_ids.iter().map(|&id| self.labels.discourse_label(id)));
        probabilities.extend(path.confidences);

        Prediction { labels, probabilities }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::variant::AttentionContext;
    use crate::infra::embeddings::EmbeddingTable;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    const LABELS: [&str; 5] = ["none", "B_method", "I_method", "B_result", "B_implication"];

    fn table() -> Arc<EmbeddingTable> {
        let entries = ["we", "propose", "results", "show", "this", "implies"]
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), vec![i as f32 / 6.0, 1.0 - i as f32 / 6.0, 0.5]));
        Arc::new(EmbeddingTable::from_entries(3, entries, vec![0.0; 3]).unwrap())
    }

    fn tagger(variant: ModelVariant, max_seq_len: usize) -> DiscourseTagger<TestBackend> {
        let device  = Default::default();
        let mut cfg = TaggerConfig::new(3, LABELS.len(), max_seq_len, variant)
            .with_word_proj_dim(8)
            .with_lstm_dim(4)
            .with_att_proj_dim(4)
            .with_rec_hid_dim(3);
        cfg.max_clause_len = Some(6);
        let model = cfg.init::<TestBackend>(&device);
        DiscourseTagger::from_parts(model, cfg, LabelIndex::from_names(LABELS), table(), None, true, device).unwrap()
    }

    fn predict_one(t: &DiscourseTagger<TestBackend>, chunk: &Chunk) -> Prediction {
        t.predict(chunk).unwrap()
    }

    fn chunk(n: usize) -> Chunk {
        (0..n).map(|i| format!("We propose result number {i}.")).collect()
    }

    fn allowed(label: &DiscourseLabel) -> bool {
        matches!(
            label,
            DiscourseLabel::None | DiscourseLabel::Method | DiscourseLabel::Result | DiscourseLabel::Implication
        )
    }

    #[test]
    fn test_one_label_per_sentence() {
        let t = tagger(ModelVariant::default(), 10);
        for n in [1, 4, 10] {
            let p = predict_one(&t, &chunk(n));
            assert_eq!(p.labels.len(), n);
            assert_eq!(p.probabilities.len(), n);
            assert!(p.probabilities.iter().all(|x| (0.0..=1.0).contains(x)));
            assert!(p.labels.iter().all(allowed));
        }
    }

    #[test]
    fn test_empty_chunk_is_skipped() {
        let t = tagger(ModelVariant::default(), 10);
        assert_eq!(predict_one(&t, &Chunk::default()).len(), 0);
    }

    #[test]
    fn test_overlong_chunk_labels_leading_sentences_none() {
        let t = tagger(ModelVariant::default(), 40);
        let p = predict_one(&t, &chunk(45));

        assert_eq!(p.labels.len(), 45);
        assert!(p.labels[..5].iter().all(|l| *l == DiscourseLabel::None));
        assert!(p.probabilities[..5].iter().all(|x| *x == 0.0));
        // The remaining 40 come from the network, whose softmax never gives 0.
        assert!(p.probabilities[5..].iter().all(|x| *x > 0.0 && *x <= 1.0));
    }

    #[test]
    fn test_batch_matches_single_predictions() {
        let t      = tagger(ModelVariant::default(), 8).with_batch_size(2);
        let chunks = vec![chunk(3), Chunk::default(), chunk(8), chunk(1)];
        let batch  = t.predict_batch(&chunks).unwrap();

        assert_eq!(batch.len(), 4);
        assert_eq!(batch[1].len(), 0);
        for (c, p) in chunks.iter().zip(&batch) {
            let single = predict_one(&t, c);
            assert_eq!(p.labels, single.labels);
            for (a, b) in p.probabilities.iter().zip(&single.probabilities) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_crf_and_attention_variants_predict() {
        let variants = [
            ModelVariant { crf: true, ..ModelVariant::default() },
            ModelVariant { use_attention: true, att_context: AttentionContext::Word, ..ModelVariant::default() },
            ModelVariant { use_attention: true, lstm: true, bidirectional: false, crf: true, ..ModelVariant::default() },
        ];
        for variant in variants {
            let p = predict_one(&tagger(variant, 6), &chunk(7));
            assert_eq!(p.len(), 7, "{variant}");
            assert_eq!(p.labels[0], DiscourseLabel::None);
            assert!(p.probabilities.iter().all(|x| (0.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_label_count_mismatch_is_rejected() {
        let device = Default::default();
        let cfg    = TaggerConfig::new(3, 2, 4, ModelVariant::default());
        let model  = cfg.init::<TestBackend>(&device);
        let err    = DiscourseTagger::from_parts(model, cfg, LabelIndex::from_names(LABELS), table(), None, true, device);
        assert!(err.is_err());
    }

    #[test]
    fn test_representation_width_mismatch_is_rejected() {
        let device = Default::default();
        let cfg    = TaggerConfig::new(7, LABELS.len(), 4, ModelVariant::default());
        let model  = cfg.init::<TestBackend>(&device);
        let err    = DiscourseTagger::from_parts(model, cfg, LabelIndex::from_names(LABELS), table(), None, true, device);
        assert!(err.is_err());
    }
}
